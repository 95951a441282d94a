//! DevPlan REST API Server
//!
//! Serves the project/document/feature/sprint CRUD surface plus health and
//! metrics endpoints, backed by either the in-memory store or Postgres.

use anyhow::Result;
use clap::Parser;
use devplan::{
    config::ServerConfig,
    http_server::{start_server, AppState},
    memory_store::create_memory_store,
    observability::init_logging,
    postgres_store::create_postgres_store,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "DevPlan REST API Server")]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short = 'c', long, env = "DEVPLAN_CONFIG")]
    config: Option<String>,

    /// Listen port override
    #[arg(short = 'p', long, env = "DEVPLAN_PORT")]
    port: Option<u16>,

    /// Store URL override: `memory:` or a postgres:// URL
    #[arg(long, env = "DEVPLAN_STORE_URL")]
    store_url: Option<String>,

    /// Suppress startup logging
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::load()?,
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.store_url {
        config.store_url = url;
    }

    if !args.quiet {
        init_logging(&config.log_level)?;
    }

    info!("starting devplan API server v{}", env!("CARGO_PKG_VERSION"));
    info!("listen address: {}:{}", config.host, config.port);
    info!("API prefix: {}", config.api_prefix);

    let store = if config.store_url.starts_with("postgres") {
        info!("using postgres store");
        create_postgres_store(&config.store_url).await?
    } else {
        info!("using in-memory store");
        create_memory_store()
    };

    let state = AppState::new(store, config);
    start_server(state).await
}
