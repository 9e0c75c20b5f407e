use crate::error::EngineError;

/// Percentage of `input_kwh` that did not arrive as `output_kwh`.
///
/// Negative when more energy was delivered than fed in. Fails for a
/// non-positive input and for non-finite values instead of returning
/// `inf`/`NaN`.
pub fn loss_percentage(input_kwh: f64, output_kwh: f64) -> Result<f64, EngineError> {
    if !input_kwh.is_finite() || !output_kwh.is_finite() || input_kwh <= 0.0 {
        return Err(EngineError::InvalidInput {
            input_kwh,
            output_kwh,
        });
    }

    let loss = (input_kwh - output_kwh) / input_kwh * 100.0;
    if !loss.is_finite() {
        return Err(EngineError::InvalidInput {
            input_kwh,
            output_kwh,
        });
    }
    Ok(loss)
}

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
