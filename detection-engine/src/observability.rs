use tracing_subscriber::{filter::Directive, EnvFilter};

/// Install the fmt subscriber. Logs go to stderr; stdout carries reports.
pub fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "detection_engine=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
