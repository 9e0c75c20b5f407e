use crate::pipeline::{Envelope, PipelineError, Transform};
use meter_domain::RegionReading;
use time::macros::datetime;

/// Pure validation of a `RegionReading` before it reaches the engine.
///
/// Rules:
/// - region_id must not be empty.
/// - input kWh must be finite and positive.
/// - output kWh must be finite and non-negative.
/// - ts must be within a broad sanity window [2000-01-01, 2100-01-01].
pub fn validate_reading(
    env: Envelope<RegionReading>,
) -> Result<Envelope<RegionReading>, PipelineError> {
    let seq = env.seq;
    let reject = move |reason: &str| PipelineError::Rejected {
        seq,
        reason: reason.to_string(),
    };
    let r = &env.payload.reading;

    if env.payload.region_id.is_empty() {
        return Err(reject("region_id must not be empty"));
    }
    if !r.input_kwh.is_finite() || r.input_kwh <= 0.0 {
        return Err(reject("input_kwh must be positive"));
    }
    if !r.output_kwh.is_finite() || r.output_kwh < 0.0 {
        return Err(reject("output_kwh must be non-negative"));
    }

    let min_ts = datetime!(2000-01-01 00:00:00 UTC);
    let max_ts = datetime!(2100-01-01 00:00:00 UTC);

    if r.timestamp < min_ts || r.timestamp > max_ts {
        return Err(reject("timestamp out of allowed range"));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

#[async_trait::async_trait]
impl Transform<RegionReading> for ReadingValidation {
    async fn apply(
        &self,
        input: Envelope<RegionReading>,
    ) -> Result<Envelope<RegionReading>, PipelineError> {
        match validate_reading(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_reading_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
