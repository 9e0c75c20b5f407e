use meter_domain::{
    AnomalyResult, MeterReading, RegionStatus, TheftAnalysis, TimeBucket, TimePatternResult,
};
use serde::Serialize;
use time::UtcOffset;

use crate::{
    anomaly,
    classify::{self, DEFAULT_TECHNICAL_LOSS_PCT},
    config::EngineConfig,
    error::EngineError,
    time_pattern,
};

/// Classification plus the two window checks for one reading.
///
/// `anomaly` and `time_pattern` are `None` when the window had no usable
/// baseline (zero average loss, or no readings in one of the hour buckets).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub analysis: TheftAnalysis,
    pub anomaly: Option<AnomalyResult>,
    pub time_pattern: Option<TimePatternResult>,
}

impl Assessment {
    pub fn status(&self) -> RegionStatus {
        RegionStatus::from(&self.analysis)
    }

    /// Whether the alerting side should open an alert for this reading.
    pub fn requires_alert(&self) -> bool {
        self.analysis.is_theft || self.analysis.is_suspicious
    }
}

/// Stateless detection engine configured with a technical loss baseline and
/// the offset used to read hour-of-day.
#[derive(Debug, Clone, Copy)]
pub struct DetectionEngine {
    expected_technical_loss_pct: f64,
    offset: UtcOffset,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TECHNICAL_LOSS_PCT, UtcOffset::UTC)
    }
}

impl DetectionEngine {
    pub fn new(expected_technical_loss_pct: f64, offset: UtcOffset) -> Self {
        Self {
            expected_technical_loss_pct,
            offset,
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> anyhow::Result<Self> {
        Ok(Self::new(cfg.expected_technical_loss_pct, cfg.utc_offset()?))
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn classify(&self, reading: &MeterReading) -> Result<TheftAnalysis, EngineError> {
        let analysis = classify::classify(reading, self.expected_technical_loss_pct)?;

        metrics::counter!("theft_classifications_total", "severity" => analysis.severity.as_str())
            .increment(1);
        tracing::debug!(
            severity = %analysis.severity,
            loss_pct = analysis.loss_percentage,
            non_technical_loss_pct = analysis.non_technical_loss_percentage,
            confidence = analysis.confidence,
            "reading classified"
        );

        Ok(analysis)
    }

    pub fn detect_anomaly(
        &self,
        current: &MeterReading,
        history: &[MeterReading],
    ) -> Result<AnomalyResult, EngineError> {
        let result = anomaly::detect_anomaly(current, history).inspect_err(count_degenerate)?;

        if result.is_anomaly {
            metrics::counter!("historical_anomalies_total").increment(1);
        }
        tracing::debug!(
            history_len = history.len(),
            is_anomaly = result.is_anomaly,
            deviation_pct = result.deviation_percent,
            "historical anomaly check"
        );

        Ok(result)
    }

    pub fn analyze_time_pattern(
        &self,
        readings: &[MeterReading],
    ) -> Result<TimePatternResult, EngineError> {
        let result = time_pattern::analyze_time_pattern(readings, self.offset)
            .inspect_err(count_degenerate)?;

        if result.has_night_anomaly {
            metrics::counter!("time_pattern_anomalies_total", "bucket" => TimeBucket::Night.as_str())
                .increment(1);
        }
        if result.has_peak_anomaly {
            metrics::counter!("time_pattern_anomalies_total", "bucket" => TimeBucket::Peak.as_str())
                .increment(1);
        }
        tracing::debug!(
            window_len = readings.len(),
            night = result.has_night_anomaly,
            peak = result.has_peak_anomaly,
            "time pattern check"
        );

        Ok(result)
    }

    /// Run all checks for `current`, using `history` (oldest first, not
    /// including `current`) as the window.
    ///
    /// An invalid reading fails the whole assessment. A degenerate baseline
    /// only drops the affected check.
    pub fn assess(
        &self,
        current: &MeterReading,
        history: &[MeterReading],
    ) -> Result<Assessment, EngineError> {
        let analysis = self.classify(current)?;

        let anomaly = tolerate_degenerate(self.detect_anomaly(current, history))?;

        let mut window = Vec::with_capacity(history.len() + 1);
        window.extend_from_slice(history);
        window.push(*current);
        let time_pattern = tolerate_degenerate(self.analyze_time_pattern(&window))?;

        Ok(Assessment {
            analysis,
            anomaly,
            time_pattern,
        })
    }
}

fn count_degenerate(err: &EngineError) {
    if let EngineError::DegenerateBaseline(kind) = err {
        metrics::counter!("degenerate_baselines_total", "kind" => kind.as_str()).increment(1);
    }
}

fn tolerate_degenerate<T>(res: Result<T, EngineError>) -> Result<Option<T>, EngineError> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(EngineError::DegenerateBaseline(kind)) => {
            tracing::warn!(reason = %kind, "skipping check with degenerate baseline");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
