//! statusdeck server
//!
//! Wires the store, fetcher registry and HTTP ingress together. Auth
//! credentials come from the environment (`AUTH_USERNAME`, `AUTH_PASSWORD`,
//! `AUTH_SECRET`); everything else is flags with env fallbacks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use statusdeck_core::{FetchConfig, Registry};
use statusdeck_http::{AppState, AuthConfig, AuthGate, Server};
use statusdeck_store::PlatformStore;
use tracing_subscriber::EnvFilter;

/// Status-page aggregator server
#[derive(Parser)]
#[command(name = "statusdeck")]
#[command(author, version, about = "Polls third-party status pages and serves the aggregate")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "STATUSDECK_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// SQLite database URL for platform records
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://statusdeck.db")]
    database_url: String,

    /// Per-fetch timeout in seconds
    #[arg(long, env = "STATUSDECK_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(
        bind = %cli.bind,
        database = %cli.database_url,
        timeout_secs = cli.timeout_secs,
        "starting statusdeck"
    );

    let auth = AuthGate::new(AuthConfig {
        username: std::env::var("AUTH_USERNAME").context("AUTH_USERNAME is not set")?,
        password: std::env::var("AUTH_PASSWORD").context("AUTH_PASSWORD is not set")?,
        secret: std::env::var("AUTH_SECRET").context("AUTH_SECRET is not set")?,
    });

    let store = PlatformStore::connect(&cli.database_url)
        .await
        .with_context(|| format!("failed to open {}", cli.database_url))?;

    let registry = Registry::new(FetchConfig {
        timeout: Duration::from_secs(cli.timeout_secs),
    })
    .context("failed to build fetcher registry")?;

    let state = AppState::new(store, Arc::new(registry), auth);
    let server = Server::bind(&cli.bind, state)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    server.serve().await.context("server terminated")?;
    Ok(())
}
