pub mod domain;

pub use domain::{
    AnomalyResult, MeterReading, RegionBaseline, RegionReading, RegionStatus, Severity,
    TheftAnalysis, TimeBucket, TimePatternResult,
};
