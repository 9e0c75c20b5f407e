use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};
use meter_domain::RegionStatus;

use crate::{error::EngineError, loss::round2};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    /// 1-based position of the record in its source.
    pub seq: u64,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, seq: u64) -> Self {
        Self {
            payload,
            seq,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("record {seq} rejected: {reason}")]
    Rejected { seq: u64, reason: String },
    #[error("engine error on record {seq}: {source}")]
    Engine {
        seq: u64,
        #[source]
        source: EngineError,
    },
    #[error("sink error: {0}")]
    Sink(String),
}

impl PipelineError {
    /// Per-record failures that should not stop the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Engine { .. })
    }
}

pub type RecordStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> RecordStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<T>: Send + Sync {
    async fn apply(&self, input: Envelope<T>) -> Result<Envelope<T>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<RunSummary, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub assessed: u64,
    pub alerts: u64,
    pub skipped: u64,
    pub regions: RegionStats,
}

/// Fleet view built from the latest assessed reading of each region.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionStats {
    pub total_regions: u64,
    pub normal: u64,
    pub suspicious: u64,
    pub theft: u64,
    /// Mean of the latest loss percentages; `None` when no region was assessed.
    pub mean_latest_loss_pct: Option<f64>,
}

impl FromIterator<(RegionStatus, f64)> for RegionStats {
    fn from_iter<I: IntoIterator<Item = (RegionStatus, f64)>>(iter: I) -> Self {
        let mut stats = Self::default();
        let mut loss_sum = 0.0;

        for (status, loss_pct) in iter {
            stats.total_regions += 1;
            loss_sum += loss_pct;
            match status {
                RegionStatus::Normal => stats.normal += 1,
                RegionStatus::Suspicious => stats.suspicious += 1,
                RegionStatus::Theft => stats.theft += 1,
            }
        }

        if stats.total_regions > 0 {
            stats.mean_latest_loss_pct = Some(round2(loss_sum / stats.total_regions as f64));
        }
        stats
    }
}

pub struct Pipeline<S, T, K> {
    pub name: String,
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T> + Send + Sync>>,
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<RunSummary, PipelineError> {
        let mut stream = self.source.stream().await;

        for t in self.transforms {
            stream = Box::pin(stream.then(move |item| {
                let t = t.clone();
                async move {
                    match item {
                        Ok(env) => t.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        let summary = self.sink.run(stream).await?;
        tracing::info!(
            pipeline = %self.name,
            assessed = summary.assessed,
            alerts = summary.alerts,
            skipped = summary.skipped,
            "pipeline finished"
        );

        let regions = &summary.regions;
        match regions.mean_latest_loss_pct {
            Some(mean_loss_pct) => tracing::info!(
                pipeline = %self.name,
                total_regions = regions.total_regions,
                normal = regions.normal,
                suspicious = regions.suspicious,
                theft = regions.theft,
                mean_loss_pct,
                "region status"
            ),
            None => tracing::info!(pipeline = %self.name, "no regions assessed"),
        }

        Ok(summary)
    }
}
