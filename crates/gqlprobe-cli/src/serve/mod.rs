//! Long-running HTTP control server.
//!
//! Exposes the crawler over HTTP so a target can be re-crawled on demand,
//! e.g. from a CI job after every deployment.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)

mod handlers;
mod models;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use gqlprobe_core::config::DEFAULT_SERVER_PORT;
use gqlprobe_core::{Crawler, Transport};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState<T: Transport> {
    /// The crawler all requests act on.
    pub crawler: Arc<Crawler<T>>,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the control server.
pub struct ServeConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Builds the control router around a shared crawler.
pub fn router<T: Transport + 'static>(crawler: Arc<Crawler<T>>) -> Router {
    let state = Arc::new(AppState { crawler });

    Router::new()
        .route("/crawl", post(handlers::crawl::<T>))
        .route(
            "/ignore",
            get(handlers::get_ignored::<T>).post(handlers::set_ignored::<T>),
        )
        .route(
            "/target",
            get(handlers::get_target::<T>).post(handlers::set_target::<T>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

// =============================================================================
// Server Entry Point
// =============================================================================

/// Start the control server. Runs until the process is stopped.
pub async fn start_server<T: Transport + 'static>(
    crawler: Arc<Crawler<T>>,
    config: ServeConfig,
) -> color_eyre::Result<()> {
    let polling = crawler.clone().spawn_polling();
    if polling.is_some() {
        info!("Schema polling enabled");
    }

    let app = router(crawler);
    let addr = SocketAddr::new(config.host, config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Control server listening");
    eprintln!("gqlprobe control server on http://{}", addr);
    eprintln!("Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;

    Ok(())
}
