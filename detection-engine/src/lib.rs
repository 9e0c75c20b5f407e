pub mod anomaly;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod loss;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod time_pattern;
pub mod transform;

pub use anomaly::detect_anomaly;
pub use classify::{classify, classify_loss, DEFAULT_TECHNICAL_LOSS_PCT};
pub use engine::{Assessment, DetectionEngine};
pub use error::{Degeneracy, EngineError};
pub use loss::loss_percentage;
pub use pipeline::{Envelope, Pipeline};
pub use time_pattern::analyze_time_pattern;
