//! Client - sends one JSON-RPC-shaped request and waits for the echo.
//!
//! The transport is plain tokio TCP; the [`Connection`] only turns values
//! into bytes and bytes back into values.
//!
//! Run the `echo_server` demo first.

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tnetstring::{Connection, Event, Value};

const ADDR: &str = "127.0.0.1:8888";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut stream = TcpStream::connect(ADDR).await?;
    let mut conn = Connection::new();

    conn.send(&Value::from(json!({
        "jsonrpc": "2.0",
        "method": "reverse",
        "params": ["hello"],
        "id": 1,
    })))?;
    stream.write_all(&conn.data_to_send()).await?;

    let mut buf = vec![0u8; 1024];
    let reply = loop {
        match conn.next_event()? {
            Event::Value(value) => break value,
            Event::StreamClosed => return Err("server closed before replying".into()),
            Event::NeedMoreData => {
                let n = stream.read(&mut buf).await?;
                // zero-length read is end of stream, which `receive` expects as empty input
                conn.receive(&buf[..n])?;
            }
        }
    };

    info!("Received: {}", serde_json::to_string(&reply)?);
    info!("Close the connection");
    stream.shutdown().await?;
    Ok(())
}
