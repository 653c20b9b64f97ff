use std::future::Future;
use std::sync::Arc;

use reporter::reporter::{JsonEncoder, LogReporter};
use reporter::sinks::channel::{write_lines, ChannelSink};
use reporter::sinks::log::LogSink;
use tokio::io::AsyncWrite;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::router::{self, SharedReporter};

/// Builds the reporter for this config. With the print sink on, records are
/// queued and written to `output` by a background task whose handle is returned.
fn create_reporter<W>(
    config: &Config,
    output: W,
) -> (Option<SharedReporter>, Option<JoinHandle<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    if !config.enabled {
        tracing::warn!("analytics reporting disabled, events will be acknowledged only");
        return (None, None);
    }

    if config.print_sink {
        let (sink, rx) = ChannelSink::new(config.channel_capacity);
        let writer = tokio::spawn(async move {
            if let Err(e) = write_lines(rx, output).await {
                tracing::error!("print sink stopped: {}", e);
            }
        });
        let reporter = LogReporter::new(JsonEncoder {}, sink).with_name(&config.adapter_name);

        (Some(Arc::new(reporter)), Some(writer))
    } else {
        let reporter = LogReporter::new(JsonEncoder {}, LogSink {}).with_name(&config.adapter_name);

        (Some(Arc::new(reporter)), None)
    }
}

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    serve_with_output(config, listener, shutdown, tokio::io::stdout()).await
}

/// Like [`serve`], with the print sink writing to `output` instead of stdout.
pub async fn serve_with_output<F, W>(
    config: Config,
    listener: TcpListener,
    shutdown: F,
    output: W,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (reporter, writer) = create_reporter(&config, output);
    let app = router::router(reporter, config.export_prometheus);

    tracing::info!("listening on {:?}", listener.local_addr()?);
    tracing::info!(
        "config: adapter_name == {:?} ; print_sink == {:?} ; log_level == {:?}",
        config.adapter_name,
        config.print_sink,
        config.log_level
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // The router owned the last sender, so the queue drains and closes.
    if let Some(writer) = writer {
        writer.await?;
    }

    tracing::info!("HTTP server graceful shutdown completed");
    Ok(())
}
