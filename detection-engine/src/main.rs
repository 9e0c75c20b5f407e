use anyhow::{bail, Result};
use detection_engine::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::AssessmentSink,
    sources::ReadingCsvFileSource,
    transform,
    DetectionEngine,
};
use meter_domain::RegionReading;
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: detection-engine <readings_csv_path>");
    }
    let file_path = &args[1];

    // Point DETECTION_CONFIG at a TOML file to override the defaults.
    let cfg = AppConfig::load()?;
    let engine = DetectionEngine::from_config(&cfg.engine)?;

    tracing::info!(
        pipeline = %cfg.pipeline.name,
        path = %file_path,
        technical_loss_pct = cfg.engine.expected_technical_loss_pct,
        utc_offset = %engine.offset(),
        history_window = cfg.pipeline.history_window,
        "replaying readings"
    );

    let pipeline: Pipeline<_, RegionReading, _> = Pipeline {
        name: cfg.pipeline.name.clone(),
        source: ReadingCsvFileSource::new(file_path),
        transforms: vec![Arc::new(transform::ReadingValidation)],
        sink: AssessmentSink::new(engine, cfg.pipeline.history_window, tokio::io::stdout()),
    };

    pipeline.run().await?;

    Ok(())
}
