//! Command line arguments and configuration resolution.

use anyhow::Context;
use clap::Parser;
use sockline_core::ConnectionConfig;
use sockline_core::constants::{DEFAULT_IDLE_TIMEOUT_HINT, NO_IDLE_TIMEOUT};
use std::path::PathBuf;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "sockline")]
#[command(about = "Send lines to a TCP server and print one reply per line", long_about = None)]
pub struct Args {
    /// JSON file with a connection configuration; flags override its fields
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remote host
    #[arg(long)]
    pub host: Option<String>,

    /// Remote port
    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(
        short,
        long,
        help = format!(
            "Idle timeout in milliseconds while waiting for a reply ({NO_IDLE_TIMEOUT} disables it, {DEFAULT_IDLE_TIMEOUT_HINT} is a sensible value)"
        )
    )]
    pub idle_timeout_ms: Option<u64>,

    /// End-of-message delimiter; `\n`, `\r` and `\t` escapes are understood
    #[arg(short, long)]
    pub delimiter: Option<String>,
}

impl Args {
    /// Build the connection configuration from the optional file and flags
    pub fn resolve(&self) -> anyhow::Result<ConnectionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => ConnectionConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(idle) = self.idle_timeout_ms {
            config.idle_timeout_ms = idle;
        }
        if let Some(delimiter) = &self.delimiter {
            config.delimiter = unescape(delimiter);
        }

        anyhow::ensure!(config.port != 0, "no port given (use --port or a config file)");
        Ok(config)
    }
}

/// Expand `\n`, `\r`, `\t` and `\\` escapes
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
