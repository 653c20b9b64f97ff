use tracing::info;

use crate::api::ReporterError;
use crate::sinks::RecordSink;

/// Target the records are logged under, so a subscriber can route them apart
/// from diagnostics.
pub const RECORD_TARGET: &str = "analytics_log";

pub struct LogSink {}

impl RecordSink for LogSink {
    fn emit(&self, line: String) -> Result<(), ReporterError> {
        info!(target: RECORD_TARGET, "{}", line);
        Ok(())
    }
}
