use std::collections::{HashMap, VecDeque};

use futures::{Stream, StreamExt};
use meter_domain::{MeterReading, RegionReading, RegionStatus};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use crate::{
    engine::{Assessment, DetectionEngine},
    pipeline::{Envelope, PipelineError, RegionStats, RunSummary, Sink},
};

#[derive(Serialize)]
struct ReadingReport<'a> {
    seq: u64,
    #[serde(with = "time::serde::rfc3339")]
    ts: OffsetDateTime,
    region_id: &'a str,
    status: RegionStatus,
    alert: bool,
    #[serde(flatten)]
    assessment: &'a Assessment,
}

/// Assesses each reading against the preceding readings of its region and
/// writes one NDJSON report line per reading.
///
/// Regions are windowed independently, in arrival order; at most
/// `history_window` earlier readings are kept per region.
pub struct AssessmentSink<W> {
    engine: DetectionEngine,
    history_window: usize,
    writer: Mutex<W>,
}

impl<W> AssessmentSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(engine: DetectionEngine, history_window: usize, writer: W) -> Self {
        Self {
            engine,
            history_window,
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn write_report(&self, report: &ReadingReport<'_>) -> Result<(), PipelineError> {
        let mut line = serde_json::to_vec(report)
            .map_err(|e| PipelineError::Sink(format!("failed to encode report: {e}")))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| PipelineError::Sink(format!("failed to write report: {e}")))
    }
}

#[async_trait::async_trait]
impl<W> Sink<RegionReading> for AssessmentSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn run<S>(&self, mut input: S) -> Result<RunSummary, PipelineError>
    where
        S: Stream<Item = Result<Envelope<RegionReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut windows: HashMap<String, VecDeque<MeterReading>> = HashMap::new();
        let mut latest: HashMap<String, (RegionStatus, f64)> = HashMap::new();
        let mut summary = RunSummary::default();

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(error = %e, "skipping record");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "error in upstream pipeline for AssessmentSink");
                    return Err(e);
                }
            };

            let RegionReading { region_id, reading } = env.payload;
            let window = windows.entry(region_id.clone()).or_default();

            let assessment = match self.engine.assess(&reading, window.make_contiguous()) {
                Ok(a) => a,
                Err(source) => {
                    let e = PipelineError::Engine { seq: env.seq, source };
                    tracing::warn!(error = %e, "skipping record");
                    summary.skipped += 1;
                    continue;
                }
            };

            window.push_back(reading);
            while window.len() > self.history_window {
                window.pop_front();
            }

            let status = assessment.status();
            let alert = assessment.requires_alert();
            if alert {
                summary.alerts += 1;
                metrics::counter!("theft_alerts_total").increment(1);
            }
            summary.assessed += 1;
            latest.insert(
                region_id.clone(),
                (status, assessment.analysis.loss_percentage),
            );

            self.write_report(&ReadingReport {
                seq: env.seq,
                ts: reading.timestamp,
                region_id: &region_id,
                status,
                alert,
                assessment: &assessment,
            })
            .await?;
        }

        let mut writer = self.writer.lock().await;
        writer
            .flush()
            .await
            .map_err(|e| PipelineError::Sink(format!("failed to flush reports: {e}")))?;

        summary.regions = latest.into_values().collect::<RegionStats>();
        Ok(summary)
    }
}
