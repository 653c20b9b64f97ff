use crate::api::ReporterError;

pub mod channel;
pub mod log;

/// Where encoded records go. Implementations must hand the line off without
/// waiting on I/O: emission runs on the caller's request path.
pub trait RecordSink {
    fn emit(&self, line: String) -> Result<(), ReporterError>;
}
