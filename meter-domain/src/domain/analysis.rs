use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loss classification for one reading.
///
/// `loss_percentage` and `non_technical_loss_percentage` are rounded to two
/// decimals; the band was chosen from the unrounded loss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TheftAnalysis {
    pub is_theft: bool,
    pub is_suspicious: bool,
    pub loss_percentage: f64,
    /// Loss above the expected technical baseline. Diagnostic only; it does
    /// not take part in choosing the band.
    pub non_technical_loss_percentage: f64,
    pub severity: Severity,
    pub confidence: u8,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AnomalyResult {
    pub is_anomaly: bool,
    pub deviation_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimePatternResult {
    pub has_night_anomaly: bool,
    pub has_peak_anomaly: bool,
}

impl TimePatternResult {
    pub fn any(&self) -> bool {
        self.has_night_anomaly || self.has_peak_anomaly
    }
}

/// Hour-of-day ranges compared against the overall average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// 00:00 up to 06:00.
    Night,
    /// 18:00 up to 22:00.
    Peak,
}

impl TimeBucket {
    pub fn hours(&self) -> std::ops::Range<u8> {
        match self {
            Self::Night => 0..6,
            Self::Peak => 18..22,
        }
    }

    pub fn contains(&self, hour: u8) -> bool {
        self.hours().contains(&hour)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::Peak => "peak",
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
