mod api_client;
mod catalog;
mod config;
mod errors;
mod explorer;
mod models;
mod persistence;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::HttpCareerApi;
use crate::config::Config;
use crate::explorer::session::{SessionRegistry, SessionSettings};
use crate::persistence::{FileStorage, RedisStorage, SavedSearchBook, SearchStorage};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career Explorer v{}", env!("CARGO_PKG_VERSION"));

    // Career backend client
    let api = HttpCareerApi::new(&config.career_api_url, config.request_timeout)?;
    info!(
        "Career API client initialized ({}, timeout {:?})",
        config.career_api_url, config.request_timeout
    );

    // Saved-search storage: Redis when configured, local file otherwise
    let storage: Box<dyn SearchStorage> = match &config.redis_url {
        Some(url) => Box::new(RedisStorage::new(redis::Client::open(url.as_str())?)),
        None => Box::new(FileStorage::new(&config.data_dir)),
    };

    let sessions = SessionRegistry::new(SessionSettings {
        history_cap: config.history_cap,
        search_quiet: config.search_debounce,
        idle_ttl: config.session_ttl,
        ..SessionSettings::default()
    });
    sessions.spawn_sweeper(sweep_period(config.session_ttl));
    info!("Session sweeper started (idle TTL {:?})", config.session_ttl);

    // Build app state
    let state = AppState {
        api: Arc::new(api),
        sessions,
        searches: Arc::new(SavedSearchBook::new(storage)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Sweep four times per TTL, but no more often than once a second.
fn sweep_period(ttl: Duration) -> Duration {
    (ttl / 4).max(Duration::from_secs(1))
}
