use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Result;
use envconfig::Envconfig;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use reporter_server::config::Config;
use reporter_server::server::serve_with_output;

fn print_sink_config() -> Config {
    let env = HashMap::from([
        ("PRINT_SINK".to_string(), "true".to_string()),
        ("CHANNEL_CAPACITY".to_string(), "16".to_string()),
        ("EXPORT_PROMETHEUS".to_string(), "false".to_string()),
    ]);
    Config::init_from_hashmap(&env).unwrap()
}

async fn post_event(addr: SocketAddr, body: &Value) -> Result<String> {
    let body = body.to_string();
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "POST /event HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

#[tokio::test]
async fn print_sink_drains_queued_records_on_shutdown() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();
    let (output, mut printed) = tokio::io::duplex(64 * 1024);

    let server = tokio::spawn(serve_with_output(
        print_sink_config(),
        listener,
        async move {
            stopped.await.ok();
        },
        output,
    ));

    let setuid = json!({"event": "/setuid", "bidder": "appnexus", "uid": "u-1", "success": true});
    let response = post_event(addr, &setuid).await?;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with(r#"{"status":"Ok"}"#), "{response}");

    let response = post_event(addr, &Value::Null).await?;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    stop.send(()).unwrap();
    server.await??;

    // Every sender is gone once serve returns, so the writer has hit EOF.
    let mut lines = String::new();
    printed.read_to_string(&mut lines).await?;
    let records: Vec<Value> = lines
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;

    assert_eq!(
        records,
        vec![
            json!({"type": "/setuid", "bidder": "appnexus", "uid": "u-1", "success": true}),
            json!({"type": "unknown"}),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn disabled_reporting_prints_nothing() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();
    let (output, mut printed) = tokio::io::duplex(1024);

    let mut config = print_sink_config();
    config.enabled = false;

    let server = tokio::spawn(serve_with_output(
        config,
        listener,
        async move {
            stopped.await.ok();
        },
        output,
    ));

    let response = post_event(addr, &json!({"event": "/setuid"})).await?;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    stop.send(()).unwrap();
    server.await??;

    let mut lines = String::new();
    printed.read_to_string(&mut lines).await?;
    assert!(lines.is_empty());
    Ok(())
}
