use meter_domain::{AnomalyResult, MeterReading};

use crate::{
    error::{Degeneracy, EngineError},
    loss::{loss_percentage, round2},
};

/// Fewer historical readings than this never produce an anomaly.
pub const MIN_HISTORY: usize = 3;

/// Deviations above this many standard deviations are anomalous.
pub const SIGMA_THRESHOLD: f64 = 2.0;

const ZERO_AVERAGE_EPSILON: f64 = 1e-9;

/// Two-sigma test of the current loss against the losses in `history`.
///
/// Uses the population variance (divisor N). With a thin history the result
/// is a plain "no anomaly".
pub fn detect_anomaly(
    current: &MeterReading,
    history: &[MeterReading],
) -> Result<AnomalyResult, EngineError> {
    if history.len() < MIN_HISTORY {
        return Ok(AnomalyResult::default());
    }

    let losses = history
        .iter()
        .map(|r| loss_percentage(r.input_kwh, r.output_kwh))
        .collect::<Result<Vec<_>, _>>()?;

    let n = losses.len() as f64;
    let avg_loss = losses.iter().sum::<f64>() / n;
    let variance = losses.iter().map(|l| (l - avg_loss).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let current_loss = loss_percentage(current.input_kwh, current.output_kwh)?;
    let deviation = (current_loss - avg_loss).abs();

    if !avg_loss.is_finite() || !std_dev.is_finite() || !deviation.is_finite() {
        return Err(EngineError::DegenerateBaseline(Degeneracy::NonFiniteStatistics));
    }
    if avg_loss.abs() < ZERO_AVERAGE_EPSILON {
        return Err(EngineError::DegenerateBaseline(Degeneracy::ZeroAverageLoss));
    }

    let deviation_percent = deviation / avg_loss.abs() * 100.0;
    if !deviation_percent.is_finite() {
        return Err(EngineError::DegenerateBaseline(Degeneracy::NonFiniteStatistics));
    }

    Ok(AnomalyResult {
        is_anomaly: deviation > SIGMA_THRESHOLD * std_dev,
        deviation_percent: round2(deviation_percent),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn reading(input_kwh: f64, output_kwh: f64) -> MeterReading {
        MeterReading::new(input_kwh, output_kwh, datetime!(2024-06-01 00:00:00 UTC))
    }

    fn steady_history() -> Vec<MeterReading> {
        // Losses of 7.5, 8, 8.5, 7.5 and 8.5 percent.
        [925.0, 920.0, 915.0, 925.0, 915.0]
            .into_iter()
            .map(|out| reading(1000.0, out))
            .collect()
    }

    #[test]
    fn thin_history_is_never_anomalous() {
        let current = reading(1000.0, 100.0);
        for len in 0..MIN_HISTORY {
            let history = vec![reading(1000.0, 920.0); len];
            let res = detect_anomaly(&current, &history).unwrap();
            assert_eq!(res, AnomalyResult { is_anomaly: false, deviation_percent: 0.0 });
        }
    }

    #[test]
    fn thin_history_ignores_invalid_current() {
        let res = detect_anomaly(&reading(0.0, 0.0), &[]).unwrap();
        assert!(!res.is_anomaly);
    }

    #[test]
    fn large_jump_over_steady_history_is_anomalous() {
        let res = detect_anomaly(&reading(1000.0, 700.0), &steady_history()).unwrap();
        assert!(res.is_anomaly);
        // |30 - 8| / 8
        assert!((res.deviation_percent - 275.0).abs() < 0.011);
    }

    #[test]
    fn reading_close_to_average_is_not_anomalous() {
        let res = detect_anomaly(&reading(1000.0, 918.0), &steady_history()).unwrap();
        assert!(!res.is_anomaly);
        assert!(res.deviation_percent < 5.0);
    }

    #[test]
    fn result_does_not_depend_on_history_order() {
        let current = reading(1000.0, 880.0);
        let history = steady_history();
        let mut reversed = history.clone();
        reversed.reverse();
        let mut rotated = history.clone();
        rotated.rotate_left(2);

        let base = detect_anomaly(&current, &history).unwrap();
        for permuted in [reversed, rotated] {
            let res = detect_anomaly(&current, &permuted).unwrap();
            assert_eq!(res.is_anomaly, base.is_anomaly);
            assert!((res.deviation_percent - base.deviation_percent).abs() < 1e-6);
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let current = reading(1000.0, 700.0);
        let history = steady_history();
        let first = detect_anomaly(&current, &history).unwrap();
        let second = detect_anomaly(&current, &history).unwrap();
        assert_eq!(first, second);
        assert_eq!(history, steady_history());
    }

    #[test]
    fn zero_average_loss_is_degenerate() {
        let history = vec![reading(500.0, 500.0); 4];
        let err = detect_anomaly(&reading(500.0, 400.0), &history).unwrap_err();
        assert_eq!(err, EngineError::DegenerateBaseline(Degeneracy::ZeroAverageLoss));
    }

    #[test]
    fn overflowing_historical_loss_is_rejected() {
        let history = vec![reading(1e-300, 1e10), reading(100.0, 90.0), reading(100.0, 92.0)];
        let err = detect_anomaly(&reading(100.0, 90.0), &history).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn overflowing_statistics_are_degenerate() {
        // Each loss is about -1e308; their sum is not representable.
        let history = vec![reading(1.0, 1e306); 3];
        let err = detect_anomaly(&reading(100.0, 90.0), &history).unwrap_err();
        assert_eq!(err, EngineError::DegenerateBaseline(Degeneracy::NonFiniteStatistics));
    }

    #[test]
    fn invalid_historical_reading_is_rejected() {
        let mut history = steady_history();
        history.push(reading(0.0, 10.0));
        let err = detect_anomaly(&reading(1000.0, 920.0), &history).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }
}
