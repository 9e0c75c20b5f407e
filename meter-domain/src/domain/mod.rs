pub mod analysis;
pub mod meter_reading;
pub mod region;

pub use analysis::{AnomalyResult, Severity, TheftAnalysis, TimeBucket, TimePatternResult};
pub use meter_reading::{MeterReading, RegionReading};
pub use region::{RegionBaseline, RegionStatus};
