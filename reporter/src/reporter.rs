use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, instrument};

use crate::api::{Completion, ReporterError};
use crate::events::AnalyticsEvent;
use crate::prometheus::{report_dropped_event, report_processed_event};
use crate::record::{CanonicalEvent, EventKind};
use crate::sinks::RecordSink;
use crate::{context, dispatch};

pub const DEFAULT_ADAPTER_NAME: &str = "psdoaAnalytics";
pub const VENDOR_ID: i32 = 0;

/// The surface a host's adapter registry talks to.
pub trait AnalyticsReporter {
    /// Records the event as a side effect. Always reports success.
    fn process_event(&self, event: Option<&AnalyticsEvent>) -> Completion;
    fn vendor_id(&self) -> i32;
    fn name(&self) -> &str;
}

pub trait RecordEncoder {
    fn encode(&self, record: &CanonicalEvent) -> Result<String, ReporterError>;
}

pub struct JsonEncoder {}

impl RecordEncoder for JsonEncoder {
    fn encode(&self, record: &CanonicalEvent) -> Result<String, ReporterError> {
        Ok(serde_json::to_string(record)?)
    }
}

/// Normalizes events into canonical records and hands them to a sink.
/// Cheap to clone; every call works on its own state.
#[derive(Clone)]
pub struct LogReporter {
    name: String,
    encoder: Arc<dyn RecordEncoder + Send + Sync>,
    sink: Arc<dyn RecordSink + Send + Sync>,
}

impl LogReporter {
    pub fn new<E, S>(encoder: E, sink: S) -> LogReporter
    where
        E: RecordEncoder + Send + Sync + 'static,
        S: RecordSink + Send + Sync + 'static,
    {
        LogReporter {
            name: DEFAULT_ADAPTER_NAME.to_string(),
            encoder: Arc::new(encoder),
            sink: Arc::new(sink),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> LogReporter {
        self.name = name.into();
        self
    }

    /// The whole pipeline with its faults surfaced: classify, extract the
    /// request context, assemble, encode, emit.
    #[instrument(skip_all)]
    pub fn try_process(
        &self,
        event: Option<&AnalyticsEvent>,
    ) -> Result<CanonicalEvent, ReporterError> {
        debug!(
            kind = %event.map_or(EventKind::Unknown, AnalyticsEvent::kind),
            event = ?event,
            "processing analytics event"
        );

        let details = dispatch::classify(event)?;
        let context = context::extract(event.and_then(dispatch::http_context));
        let record = CanonicalEvent::assemble(details, context);

        let line = self.encoder.encode(&record)?;
        self.sink.emit(line)?;

        Ok(record)
    }
}

impl AnalyticsReporter for LogReporter {
    // The only place a pipeline fault is turned into success.
    fn process_event(&self, event: Option<&AnalyticsEvent>) -> Completion {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_process(event))) {
            Ok(Ok(record)) => report_processed_event(record.kind()),
            Ok(Err(err)) => {
                report_dropped_event(err.cause());
                error!(
                    cause = err.cause(),
                    event = ?event,
                    "error processing analytics event: {}",
                    err
                );
            }
            Err(_) => {
                report_dropped_event("panic");
                error!(event = ?event, "analytics pipeline panicked");
            }
        }

        Completion::succeeded()
    }

    fn vendor_id(&self) -> i32 {
        VENDOR_ID
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::events::{AuctionEvent, SetuidEvent};

    struct DiscardSink {}

    impl RecordSink for DiscardSink {
        fn emit(&self, line: String) -> Result<(), ReporterError> {
            drop(line);
            Ok(())
        }
    }

    #[test]
    fn reports_identity() {
        let reporter = LogReporter::new(JsonEncoder {}, DiscardSink {});
        assert_eq!(reporter.vendor_id(), 0);
        assert_eq!(reporter.name(), "psdoaAnalytics");

        let renamed = reporter.with_name("auditLog");
        assert_eq!(renamed.name(), "auditLog");
    }

    #[test]
    fn try_process_returns_the_record() {
        let reporter = LogReporter::new(JsonEncoder {}, DiscardSink {});
        let event = AnalyticsEvent::Setuid(SetuidEvent {
            bidder: Some("adnxs".to_string()),
            uid: Some("u".to_string()),
            success: Some(true),
        });

        let record = reporter.try_process(Some(&event)).unwrap();
        assert_eq!(record.kind(), EventKind::Setuid);
        assert!(record.context().is_none());
    }

    #[test]
    fn try_process_surfaces_conversion_faults() {
        let reporter = LogReporter::new(JsonEncoder {}, DiscardSink {});
        let event = AnalyticsEvent::Auction(AuctionEvent {
            bid_response: Some(json!({"id": ["resp-1"]})),
            ..Default::default()
        });

        assert!(matches!(
            reporter.try_process(Some(&event)),
            Err(ReporterError::Conversion { .. })
        ));
        assert!(reporter.process_event(Some(&event)).is_success());
    }

    #[test]
    fn json_encoder_writes_one_line() {
        let record = reporter_record();
        let line = JsonEncoder {}.encode(&record).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.starts_with(r#"{"type":"unknown""#));
    }

    fn reporter_record() -> CanonicalEvent {
        LogReporter::new(JsonEncoder {}, DiscardSink {})
            .try_process(Some(&AnalyticsEvent::Unrecognized(json!({"a": "b\nc"}))))
            .unwrap()
    }
}
