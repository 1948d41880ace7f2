//! Echo Server - returns every byte it reads, a few bytes at a time.
//!
//! Pairs with the `client` demo to show a [`Connection`](tnetstring::Connection)
//! reassembling values from small, delayed chunks.
//!
//! ```text
//! cargo run --example echo_server
//! cargo run --example client
//! ```

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

const ADDR: &str = "127.0.0.1:8888";
const CHUNK_SIZE: usize = 5;
const CHUNK_DELAY: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let listener = TcpListener::bind(ADDR).await?;
    info!("Listening on {}", ADDR);

    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Accepted {}", peer);

        tokio::spawn(async move {
            if let Err(e) = echo_in_chunks(stream).await {
                tracing::error!("Echo error for {}: {}", peer, e);
            }
        });
    }
}

async fn echo_in_chunks(mut stream: TcpStream) -> std::io::Result<()> {
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        info!("Sending chunk {:?}...", String::from_utf8_lossy(&buf[..n]));
        stream.write_all(&buf[..n]).await?;
        stream.flush().await?;
        tokio::time::sleep(CHUNK_DELAY).await;
    }

    info!("Close the connection");
    stream.shutdown().await
}
