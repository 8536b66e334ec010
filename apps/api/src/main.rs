use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notify_api::config::Config;
use notify_api::notifications::{CenterOptions, NotificationCenter, TokioScheduler};
use notify_api::routes::build_router;
use notify_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting notify-api v{}", env!("CARGO_PKG_VERSION"));

    // One notification session for the lifetime of the process
    let scheduler = Arc::new(TokioScheduler::new(tokio::runtime::Handle::current()));
    let notifications = NotificationCenter::new(
        scheduler,
        CenterOptions {
            max_active: config.notification_max_active,
        },
    );
    match config.notification_max_active {
        Some(max) => info!("Notification capacity: {max} active"),
        None => info!("Notification capacity: unlimited"),
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        notifications: notifications.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the dashboard host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    notifications.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
