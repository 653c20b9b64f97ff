// Counters reported by the pipeline. Exporter setup belongs to the host.

use metrics::counter;

use crate::record::EventKind;

pub const ANALYTICS_EVENTS_PROCESSED_TOTAL: &str = "analytics_events_processed_total";
pub const ANALYTICS_EVENTS_DROPPED_TOTAL: &str = "analytics_events_dropped_total";

pub fn report_processed_event(kind: EventKind) {
    counter!(ANALYTICS_EVENTS_PROCESSED_TOTAL, "type" => kind.path()).increment(1);
}

pub fn report_dropped_event(cause: &'static str) {
    counter!(ANALYTICS_EVENTS_DROPPED_TOTAL, "cause" => cause).increment(1);
}
