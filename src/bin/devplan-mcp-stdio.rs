//! DevPlan MCP Gateway - STDIO transport
//!
//! Reads line-delimited JSON-RPC from stdin and writes responses to stdout;
//! logging goes to stderr because stdout carries the protocol.

use anyhow::Result;
use clap::Parser;
use devplan::mcp::{GatewayConfig, GatewayServer};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(author, version, about = "DevPlan MCP Gateway (stdio)")]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short = 'c', long, env = "DEVPLAN_GATEWAY_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::load()?,
    };

    devplan::init_stderr_logging(&config.log_level)?;
    eprintln!(
        "devplan MCP gateway v{} forwarding to {}",
        env!("CARGO_PKG_VERSION"),
        config.api.base_url
    );

    let server = GatewayServer::new(config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!("discarding invalid JSON on stdin: {err}");
                continue;
            }
        };

        if let Some(response) = server.handle_message(raw).await {
            let out = serde_json::to_string(&response)?;
            stdout.write_all(out.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
