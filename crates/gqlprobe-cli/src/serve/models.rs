//! Request and response bodies of the control server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use gqlprobe_core::CrawlError;

// =============================================================================
// Crawl
// =============================================================================

/// Query parameters for `POST /crawl`.
#[derive(Debug, Default, Deserialize)]
pub struct CrawlParams {
    /// Return denied operations too.
    #[serde(default)]
    pub all: bool,
}

// =============================================================================
// Target
// =============================================================================

/// Response of `GET /target`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetResponse {
    pub target: Option<String>,
}

/// Response of `POST /target`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetUpdate {
    pub target: String,
    /// False when the URL was already set.
    pub changed: bool,
}

// =============================================================================
// Errors
// =============================================================================

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A handler failure mapped onto an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<CrawlError> for ApiError {
    fn from(err: CrawlError) -> Self {
        let status = match &err {
            e if e.is_no_target() => StatusCode::BAD_REQUEST,
            CrawlError::InvalidTarget { .. } | CrawlError::UnknownOperation { .. } => {
                StatusCode::BAD_REQUEST
            }
            CrawlError::Introspection(_) | CrawlError::Transport(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
