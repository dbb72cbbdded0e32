//! HTTP route handlers for the control server.
//!
//! Handlers stay thin and delegate to the shared [`Crawler`](gqlprobe_core::Crawler).

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use gqlprobe_core::{CrawlReport, Transport};

use super::models::{ApiError, CrawlParams, TargetResponse, TargetUpdate};
use super::AppState;

// =============================================================================
// Crawl
// =============================================================================

/// POST `/crawl` - Run a crawl against the current target.
///
/// Only operations that were not denied are returned unless `?all=true`.
/// Returns 400 when no target is configured.
pub async fn crawl<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    Query(params): Query<CrawlParams>,
) -> Result<Json<CrawlReport>, ApiError> {
    let mut report = state.crawler.crawl().await?;

    if !params.all {
        report.retain_exposed();
    }

    Ok(Json(report))
}

// =============================================================================
// Ignore List
// =============================================================================

/// GET `/ignore` - The current ignore list.
pub async fn get_ignored<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
) -> Json<Vec<String>> {
    Json(state.crawler.ignored().await)
}

/// POST `/ignore` - Replace the ignore list with a JSON array of names.
pub async fn set_ignored<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    Json(ignore): Json<Vec<String>>,
) -> Json<Vec<String>> {
    info!(?ignore, "Updated ignore list");
    state.crawler.set_ignored(ignore.clone()).await;
    Json(ignore)
}

// =============================================================================
// Target
// =============================================================================

/// GET `/target` - The current target URL.
pub async fn get_target<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
) -> Json<TargetResponse> {
    Json(TargetResponse {
        target: state.crawler.target_url().await,
    })
}

/// POST `/target` - Set the target URL from a JSON string.
///
/// A new URL drops the cached schema.
pub async fn set_target<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    Json(target): Json<String>,
) -> Result<Json<TargetUpdate>, ApiError> {
    if target.trim().is_empty() {
        return Err(ApiError::bad_request("target URL must not be empty"));
    }

    let changed = state.crawler.set_target_url(&target).await?;
    Ok(Json(TargetUpdate { target, changed }))
}
