//! Reporting HTTP Server Binary
//!
//! Loads configuration, builds the repository and metric registry, and serves
//! the reporting API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ops-server
//!
//! # Pin the cutover and shorten the cache TTL
//! REPORTING_CUTOVER=2025-11-10 REPORTING_CACHE_TTL_SECS=30 cargo run --bin ops-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `REPOSITORY_TYPE`: Repository backend (default: local)
//! - `REPORTING_CACHE_MAX_ENTRIES`, `REPORTING_CACHE_TTL_SECS`: cache sizing
//! - `REPORTING_CUTOVER`: fixed historical/live cutover date
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ops_reporting::config::ReportingConfig;
use ops_reporting::db::RepositoryFactory;
use ops_reporting::http::{create_router, AppState};
use ops_reporting::services::ReportingFacade;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting reporting server");

    let config = ReportingConfig::load()?;
    let repository = RepositoryFactory::create(&config.repository)?;
    let registry = RepositoryFactory::default_registry(&repository);
    info!(
        metrics = registry.len(),
        cache_entries = config.cache.max_entries,
        ttl_secs = config.cache.default_ttl_secs,
        "Repository initialized"
    );
    if let Some(cutover) = config.engine.cutover {
        info!(%cutover, "Using fixed cutover");
    }

    let facade = ReportingFacade::from_config(&config, registry);
    let state = AppState::new(facade, repository);
    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
