//! sockline - line-oriented TCP client.
//!
//! Connects to a server, then sends every line read from stdin (terminated by
//! the configured delimiter) and prints the single reply it gets back.
//!
//! # Usage
//!
//! ```bash
//! sockline --host 127.0.0.1 --port 7000 --idle-timeout-ms 30000
//! echo PING | sockline -p 7000
//! RUST_LOG=sockline_network=trace sockline -p 7000
//! ```
//!
//! Any connection error ends the session, including a reply that does not
//! arrive within the idle timeout: a late reply would otherwise be paired
//! with the next line.

mod args;

use anyhow::Context;
use args::Args;
use clap::Parser;
use sockline_core::ErrorKind;
use sockline_network::{Connection, Framing, Transport};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = args.resolve()?;
    let mut conn = Connection::open(&config)
        .await
        .with_context(|| format!("connecting to {}", config.address()))?;

    let stdin = BufReader::new(tokio::io::stdin());
    let result = run(&mut conn, &config.delimiter, stdin, tokio::io::stdout()).await;
    conn.close();
    result
}

/// Exchange one reply per input line until the input ends
async fn run<T, F, R, W>(
    conn: &mut Connection<T, F>,
    delimiter: &str,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    T: Transport,
    F: Framing,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut exchanged = 0usize;

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        conn.write(format!("{line}{delimiter}")).await?;

        let reply = conn.recv().await.map_err(|e| {
            if e.kind() == ErrorKind::Timeout {
                warn!(exchanged, "No reply in time, ending session");
            }
            e
        })?;

        output.write_all(reply.as_bytes()).await?;
        output.flush().await?;
        exchanged += 1;
    }

    info!(exchanged, "stdin closed, ending session");
    Ok(())
}
