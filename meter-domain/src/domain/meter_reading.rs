use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single input/output energy sample for a distribution region.
///
/// `output_kwh <= input_kwh` is the normal case but is not enforced here;
/// a reading that delivered more than it received yields a negative loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub input_kwh: f64,
    pub output_kwh: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl MeterReading {
    pub fn new(input_kwh: f64, output_kwh: f64, timestamp: OffsetDateTime) -> Self {
        Self {
            input_kwh,
            output_kwh,
            timestamp,
        }
    }
}

/// A reading tagged with the region it was taken for, as handed over by the
/// ingestion side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReading {
    pub region_id: String,
    #[serde(flatten)]
    pub reading: MeterReading,
}
