//! ML Rewards Service - HTTP API for the reward and progression engine.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ml_rewards_service::engine::jobs;
use ml_rewards_service::{create_router, AppState, ServiceConfig};
use ml_rewards_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ml_rewards=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ML Rewards Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        webhook_configured = %config.notify_webhook_url.is_some(),
        daily_missions = config.catalog.daily_mission_count,
        weekly_missions = config.catalog.weekly_mission_count,
        achievements = config.catalog.achievements.len(),
        "Service configuration loaded"
    );

    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(config, store);

    // Mission generation and expiry sweeps run for the process lifetime.
    jobs::spawn(Arc::new(state.clone()));

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
