use metrics::counter;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error};

use crate::api::ReporterError;
use crate::sinks::RecordSink;

/// Fire-and-forget hand-off onto a bounded queue drained by [`write_lines`].
/// A full or closed queue is reported as a sink fault rather than waited on.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (ChannelSink, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelSink { tx }, rx)
    }
}

impl RecordSink for ChannelSink {
    fn emit(&self, line: String) -> Result<(), ReporterError> {
        match self.tx.try_send(line) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                counter!("analytics_channel_full_total").increment(1);
                Err(ReporterError::SinkUnavailable("queue full".to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                Err(ReporterError::SinkUnavailable("queue closed".to_string()))
            }
        }
    }
}

/// Writes queued records one per line until every sender is gone.
pub async fn write_lines<W>(mut rx: mpsc::Receiver<String>, mut writer: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        if let Err(e) = write_line(&mut writer, &line).await {
            error!("failed to write analytics record: {}", e);
            return Err(e);
        }
    }
    debug!("analytics record queue closed");
    writer.flush().await
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}
