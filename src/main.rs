//! rift-feed server entry point.
//!
//! Starts the Axum HTTP server serving the feed endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rift_feed::api;
use rift_feed::app_state::AppState;
use rift_feed::config::FeedConfig;
use rift_feed::persistence::postgres::PostgresStores;
use rift_feed::persistence::{MatchShareStore, NewsStore, ProfileStore, ThreadStore};
use rift_feed::service::FeedService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = FeedConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting rift-feed");

    // Connect the database pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;

    // Build the store bundle and service layer
    let stores = Arc::new(PostgresStores::new(pool));
    let feed_service = Arc::new(FeedService::new(
        Arc::clone(&stores) as Arc<dyn ThreadStore>,
        Arc::clone(&stores) as Arc<dyn NewsStore>,
        Arc::clone(&stores) as Arc<dyn MatchShareStore>,
        Arc::clone(&stores) as Arc<dyn ProfileStore>,
        stores,
    ));

    // Build application state
    let app_state = AppState { feed_service };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
