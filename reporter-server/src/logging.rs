use reporter::sinks::log::RECORD_TARGET;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Diagnostics follow RUST_LOG, falling back to `level`. Canonical records
/// are always let through.
pub fn log_filter(level: Level) -> Result<EnvFilter, ParseError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    with_record_target(filter)
}

/// Pins the record target at INFO so quieting diagnostics never drops records.
pub fn with_record_target(filter: EnvFilter) -> Result<EnvFilter, ParseError> {
    Ok(filter.add_directive(format!("{RECORD_TARGET}=info").parse()?))
}
