use meter_domain::{MeterReading, TimeBucket, TimePatternResult};
use time::UtcOffset;

use crate::error::{Degeneracy, EngineError};

/// Windows shorter than this are reported as having no pattern anomaly.
pub const MIN_PATTERN_READINGS: usize = 24;

const NIGHT_RATIO: f64 = 1.2;
const PEAK_RATIO: f64 = 0.8;

fn check_reading(r: &MeterReading) -> Result<(), EngineError> {
    let input_ok = r.input_kwh.is_finite() && r.input_kwh > 0.0;
    let output_ok = r.output_kwh.is_finite() && r.output_kwh >= 0.0;
    if input_ok && output_ok {
        Ok(())
    } else {
        Err(EngineError::InvalidInput {
            input_kwh: r.input_kwh,
            output_kwh: r.output_kwh,
        })
    }
}

fn finite(value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::DegenerateBaseline(Degeneracy::NonFiniteStatistics))
    }
}

fn bucket_average(
    readings: &[MeterReading],
    offset: UtcOffset,
    bucket: TimeBucket,
) -> Result<f64, EngineError> {
    let (sum, count) = readings
        .iter()
        .filter(|r| bucket.contains(r.timestamp.to_offset(offset).hour()))
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.output_kwh, count + 1));

    if count == 0 {
        return Err(EngineError::DegenerateBaseline(Degeneracy::EmptyBucket(bucket)));
    }
    finite(sum / count as f64)
}

/// Compare delivered energy in the night and evening peak hours against the
/// window average. Hours are read in the fixed `offset`.
///
/// Unexpectedly high night draw is treated as a theft signature, unexpectedly
/// low peak draw as a sign of meter tampering.
pub fn analyze_time_pattern(
    readings: &[MeterReading],
    offset: UtcOffset,
) -> Result<TimePatternResult, EngineError> {
    if readings.len() < MIN_PATTERN_READINGS {
        return Ok(TimePatternResult::default());
    }

    readings.iter().try_for_each(check_reading)?;

    let avg_night = bucket_average(readings, offset, TimeBucket::Night)?;
    let avg_peak = bucket_average(readings, offset, TimeBucket::Peak)?;
    let avg_overall =
        finite(readings.iter().map(|r| r.output_kwh).sum::<f64>() / readings.len() as f64)?;

    Ok(TimePatternResult {
        has_night_anomaly: avg_night > avg_overall * NIGHT_RATIO,
        has_peak_anomaly: avg_peak < avg_overall * PEAK_RATIO,
    })
}
