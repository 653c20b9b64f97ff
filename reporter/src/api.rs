use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum CompletionCode {
    Ok = 1,
}

/// What the host gets back from every `process_event` call. There is no
/// failure variant: faults end at the emission barrier.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Completion {
    pub status: CompletionCode,
}

impl Completion {
    pub fn succeeded() -> Self {
        Completion {
            status: CompletionCode::Ok,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CompletionCode::Ok
    }
}

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("failed to convert payload into {target}: {source}")]
    Conversion {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode canonical event: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("record sink unavailable: {0}")]
    SinkUnavailable(String),
}

impl ReporterError {
    /// Label used for the dropped-events counter and error logs.
    pub fn cause(&self) -> &'static str {
        match self {
            ReporterError::Conversion { .. } => "conversion",
            ReporterError::Serialization(_) => "serialization",
            ReporterError::SinkUnavailable(_) => "sink_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_serializes_like_a_status_body() {
        let body = serde_json::to_string(&Completion::succeeded()).unwrap();
        assert_eq!(body, r#"{"status":"Ok"}"#);
        assert!(Completion::succeeded().is_success());
    }

    #[test]
    fn error_causes() {
        let err = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let conversion = ReporterError::Conversion {
            target: "BidRequestSummary",
            source: err,
        };
        assert_eq!(conversion.cause(), "conversion");
        assert!(conversion.to_string().contains("BidRequestSummary"));

        let closed = ReporterError::SinkUnavailable("channel closed".to_string());
        assert_eq!(closed.cause(), "sink_unavailable");
    }
}
