//! Paisán marketplace server
//!
//! Serves the catalog, search and account API for the marketplace frontend:
//! - Product and supplier browsing with facet filters, sorting and paging
//! - Search over the hosted product and supplier indices
//! - Saved items, supplier contact and profiles for signed-in users
//! - Tariff estimates for a basket of products
//! - Supabase integration for catalog and user data

mod app;
mod cache;
mod catalog;
mod config;
mod http;
mod search;
mod session;
mod store;
mod tariff;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;
use crate::session::SESSION_IDLE_TTL;
use crate::util::time::init_server_time;

/// How often expired cache entries and idle sessions are dropped
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Paisán server");
    info!("Server address: {}", config.server_addr);

    // Create application state
    let state = AppState::new(config.clone())?;
    info!(entries = state.cache.len(), path = %config.cache_path.display(), "Query cache loaded");

    // Spawn sweeper for expired cache entries and idle sessions
    let cache = state.cache.clone();
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            let idle = sessions.purge_idle(SESSION_IDLE_TTL);
            debug!(purged, idle, "Swept query cache and sessions");
        }
    });

    // Build router
    let router = build_router(state.clone());

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cache = state.cache.clone();
    tokio::task::spawn_blocking(move || cache.persist_blocking()).await?;
    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
