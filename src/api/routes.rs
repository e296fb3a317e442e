//! Router, shared state, and server startup.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::launches::{LaunchFeed, SharedLaunchFeed, SpaceXClient};
use crate::scheduler;

use super::mission_store::{create_mission_store, SharedMissionStore};
use super::missions;
use super::pages;

/// Shared application state.
pub struct AppState {
    /// Mission persistence
    pub store: SharedMissionStore,
    /// Latest external launch payload
    pub feed: SharedLaunchFeed,
}

/// Build the HTTP router over an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::read_root))
        .route("/index", get(pages::read_home))
        .route("/news/", get(pages::news))
        .route("/update-missions/", post(missions::trigger_update))
        .route(
            "/missions/",
            get(missions::list_missions).post(missions::create_mission),
        )
        .route("/spacex-launches/", get(missions::spacex_launches))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = create_mission_store(config.store_type, config.database_path.clone()).await?;
    tracing::info!(
        "Mission store ready ({})",
        if store.is_persistent() {
            "persistent"
        } else {
            "in-memory"
        }
    );

    let client = SpaceXClient::new(config.spacex_api_url.clone(), config.http_timeout)?;
    tracing::info!("Launch feed source: {}", client.url());
    let feed: SharedLaunchFeed = Arc::new(LaunchFeed::new(Arc::new(client)));

    // Startup trigger runs before the listener is bound; the periodic trigger
    // takes over one interval later.
    scheduler::run_startup_sync(&store, &feed).await;
    let _periodic = scheduler::spawn_periodic_sync(
        Arc::clone(&store),
        Arc::clone(&feed),
        config.sync_interval,
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState { store, feed });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}
