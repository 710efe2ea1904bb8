//! shellcache server entry point.
//!
//! Loads configuration, runs the install/activate lifecycle against the
//! persistent store, then serves the offline cache manager on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{HttpFetcher, HttpFetcherConfig, OfflineCacheManager};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        "Starting shellcache ({} at {}, budget {} bytes) on stdio transport",
        config.generation,
        config.db_path.display(),
        config.budget_bytes
    );

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = HttpFetcher::new(HttpFetcherConfig::from(&config))?;
    let manager = Arc::new(OfflineCacheManager::new(db, fetcher, config)?);

    match manager.start().await {
        Ok(report) => tracing::info!("removed {} stale generation(s)", report.deleted.len()),
        Err(e) => tracing::warn!("offline cache inactive, all requests pass through: {}", e),
    }

    let handler = handler::ShellcacheServer::new(manager);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
