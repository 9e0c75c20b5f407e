use meter_domain::{MeterReading, Severity, TheftAnalysis};

use crate::{
    error::EngineError,
    loss::{loss_percentage, round2},
};

/// Loss expected from line resistance and transformers alone.
pub const DEFAULT_TECHNICAL_LOSS_PCT: f64 = 8.0;

struct Band {
    /// Exclusive upper bound; `None` for the last band.
    below: Option<f64>,
    severity: Severity,
    is_suspicious: bool,
    is_theft: bool,
    confidence: u8,
    reason: &'static str,
}

/// Ascending, non-overlapping loss bands. The first band whose bound is above
/// the loss wins, so each lower bound is inclusive.
static BANDS: [Band; 5] = [
    Band {
        below: Some(5.0),
        severity: Severity::Low,
        is_suspicious: false,
        is_theft: false,
        confidence: 95,
        reason: "Normal consumption pattern. Loss within acceptable range.",
    },
    Band {
        below: Some(12.0),
        severity: Severity::Low,
        is_suspicious: false,
        is_theft: false,
        confidence: 85,
        reason: "Slightly elevated loss, likely technical. Monitoring recommended.",
    },
    Band {
        below: Some(20.0),
        severity: Severity::Medium,
        is_suspicious: true,
        is_theft: false,
        confidence: 75,
        reason: "Suspicious loss pattern detected. Investigation recommended.",
    },
    Band {
        below: Some(30.0),
        severity: Severity::High,
        is_suspicious: true,
        is_theft: true,
        confidence: 85,
        reason: "High probability of electricity theft. Immediate inspection required.",
    },
    Band {
        below: None,
        severity: Severity::Critical,
        is_suspicious: true,
        is_theft: true,
        confidence: 95,
        reason: "Critical theft detected. Urgent action required.",
    },
];

fn band_for(total_loss: f64) -> &'static Band {
    BANDS
        .iter()
        .find(|band| band.below.map_or(true, |below| total_loss < below))
        .unwrap_or(&BANDS[BANDS.len() - 1])
}

/// Classify an already computed total loss percentage.
pub fn classify_loss(total_loss: f64, expected_technical_loss_pct: f64) -> TheftAnalysis {
    let band = band_for(total_loss);
    let non_technical_loss = total_loss - expected_technical_loss_pct;

    TheftAnalysis {
        is_theft: band.is_theft,
        is_suspicious: band.is_suspicious,
        loss_percentage: round2(total_loss),
        non_technical_loss_percentage: round2(non_technical_loss),
        severity: band.severity,
        confidence: band.confidence,
        reason: band.reason,
    }
}

/// IMO (input minus output) classification of a single reading.
pub fn classify(
    reading: &MeterReading,
    expected_technical_loss_pct: f64,
) -> Result<TheftAnalysis, EngineError> {
    let total_loss = loss_percentage(reading.input_kwh, reading.output_kwh)?;
    Ok(classify_loss(total_loss, expected_technical_loss_pct))
}
