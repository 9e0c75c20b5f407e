use meter_domain::TimeBucket;

/// Why a baseline could not be used for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// Historical losses average to zero, so a relative deviation is undefined.
    ZeroAverageLoss,
    /// No reading in the window falls into the bucket's hours.
    EmptyBucket(TimeBucket),
    /// Window statistics overflowed to a non-finite value.
    NonFiniteStatistics,
}

impl Degeneracy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroAverageLoss => "zero_average_loss",
            Self::EmptyBucket(TimeBucket::Night) => "empty_night_bucket",
            Self::EmptyBucket(TimeBucket::Peak) => "empty_peak_bucket",
            Self::NonFiniteStatistics => "non_finite_statistics",
        }
    }
}

impl std::fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroAverageLoss => f.write_str("historical average loss is zero"),
            Self::EmptyBucket(bucket) => write!(f, "no readings in the {bucket} bucket"),
            Self::NonFiniteStatistics => f.write_str("window statistics are not finite"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid reading: input {input_kwh} kWh, output {output_kwh} kWh")]
    InvalidInput { input_kwh: f64, output_kwh: f64 },
    #[error("degenerate baseline: {0}")]
    DegenerateBaseline(Degeneracy),
}
