//! policy-watch: run config suites against a coordination store and log
//! every policy they apply.
//!
//! # Architecture Overview
//!
//! ```text
//!   settings.toml ──▶ config ──▶ SuiteOptions ─────────────┐
//!                        │                                 ▼
//!                        └──▶ store::connect ──▶ ClientSuite / ServerSuite
//!                                                          │
//!                              ┌───────────────────────────┤ one watch loop
//!                              ▼                           ▼ per category
//!                      ┌──────────────┐  bytes   ┌──────────────────┐
//!                      │ coordination │─────────▶│ parser + cache   │──▶ listener (log line)
//!                      │    store     │◀─────────│ (atomic swap)    │
//!                      └──────────────┘ subscribe└──────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use rpc_config_zookeeper::cache::CacheKey;
use rpc_config_zookeeper::config::{load_settings, Settings};
use rpc_config_zookeeper::lifecycle::signals::wait_for_shutdown;
use rpc_config_zookeeper::observability::{logging, metrics};
use rpc_config_zookeeper::policy::{PolicyDocument, TomlParser};
use rpc_config_zookeeper::store;
use rpc_config_zookeeper::suite::{ClientSuite, ServerSuite, Suite, SuiteOptions};

#[derive(Parser)]
#[command(name = "policy-watch")]
#[command(about = "Watch RPC policy documents in a coordination store", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Destination (or local, for server suites) service name.
    #[arg(short, long)]
    service: String,

    /// Local client identity. Starts a client suite when set, a server suite otherwise.
    #[arg(long)]
    client: Option<String>,

    /// Override the first store endpoint, e.g. `file:///var/lib/zk-mirror`.
    #[arg(long)]
    endpoint: Option<String>,

    /// Parse documents as TOML instead of JSON.
    #[arg(long)]
    toml: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        settings.store.endpoints = vec![endpoint.clone()];
    }

    logging::init_logging(&settings.observability)?;
    tracing::info!("policy-watch v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        endpoint = ?settings.store.endpoints.first(),
        prefix = %settings.paths.prefix,
        session_timeout_ms = settings.store.session_timeout_ms,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = store::connect(&settings.store)?;

    let mut options = SuiteOptions::from_settings(&settings).with_listener(Arc::new(
        |key: &CacheKey, document: &PolicyDocument| {
            tracing::info!(path = %key.path, category = %key.category, policy = ?document, "Policy in effect");
        },
    ));
    if cli.toml {
        options = options.with_parser(Arc::new(TomlParser::new(settings.limiter.zero)));
    }

    let suite: Box<dyn Suite> = match &cli.client {
        Some(client) => Box::new(ClientSuite::new(&cli.service, client, store, options).await?),
        None => Box::new(ServerSuite::new(&cli.service, store, options).await?),
    };

    for handle in suite.policies() {
        let snapshot = handle.get();
        tracing::info!(
            path = %handle.key().path,
            revision = snapshot.revision,
            default = snapshot.is_default(),
            "Watching"
        );
    }

    wait_for_shutdown().await;
    suite.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
