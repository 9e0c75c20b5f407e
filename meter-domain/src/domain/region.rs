use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{MeterReading, TheftAnalysis};

/// Region state the ingestion side records after each classified reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionStatus {
    Normal,
    Suspicious,
    Theft,
}

impl From<&TheftAnalysis> for RegionStatus {
    fn from(analysis: &TheftAnalysis) -> Self {
        if analysis.is_theft {
            Self::Theft
        } else if analysis.is_suspicious {
            Self::Suspicious
        } else {
            Self::Normal
        }
    }
}

/// Planned versus delivered load kept on a region record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBaseline {
    pub expected_load_kwh: f64,
    pub current_load_kwh: f64,
}

impl RegionBaseline {
    /// Seed a historical reading: expected load is treated as energy fed in,
    /// current load as energy delivered.
    pub fn to_reading(&self, timestamp: OffsetDateTime) -> MeterReading {
        MeterReading::new(self.expected_load_kwh, self.current_load_kwh, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use time::macros::datetime;

    fn analysis(is_theft: bool, is_suspicious: bool) -> TheftAnalysis {
        TheftAnalysis {
            is_theft,
            is_suspicious,
            loss_percentage: 0.0,
            non_technical_loss_percentage: 0.0,
            severity: Severity::Low,
            confidence: 95,
            reason: "",
        }
    }

    #[test]
    fn status_prefers_theft_over_suspicious() {
        assert_eq!(RegionStatus::from(&analysis(true, true)), RegionStatus::Theft);
        assert_eq!(RegionStatus::from(&analysis(false, true)), RegionStatus::Suspicious);
        assert_eq!(RegionStatus::from(&analysis(false, false)), RegionStatus::Normal);
    }

    #[test]
    fn baseline_seeds_reading_from_loads() {
        let ts = datetime!(2024-03-01 12:00:00 UTC);
        let baseline = RegionBaseline {
            expected_load_kwh: 1100.0,
            current_load_kwh: 890.0,
        };

        let reading = baseline.to_reading(ts);
        assert_eq!(reading.input_kwh, 1100.0);
        assert_eq!(reading.output_kwh, 890.0);
        assert_eq!(reading.timestamp, ts);
    }
}
