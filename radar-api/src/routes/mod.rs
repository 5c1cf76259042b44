//! API route definitions

mod admin;
mod events;
mod health;

use axum::{http::StatusCode, Json, Router};
use radar_core::{ErrorKind, RadarError};
use serde::Serialize;
use tracing::error;

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(events::routes())
        .merge(health::routes())
        .merge(admin::routes())
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// Status code for a service error.
///
/// A dual failure is reported by the status of the primary error.
fn status_for(err: &RadarError) -> StatusCode {
    match err {
        RadarError::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RadarError::NotFound(_) | RadarError::Http { status: 404, .. } => StatusCode::NOT_FOUND,
        RadarError::Validation(_) | RadarError::Http { .. } => StatusCode::BAD_GATEWAY,
        RadarError::Network(_) | RadarError::Timeout(_) => StatusCode::BAD_GATEWAY,
        RadarError::FallbackExhausted { primary, .. } => status_for(primary),
        RadarError::Config(_) | RadarError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(context: &str, err: RadarError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&err);
    error!("{}: {}", context, err);
    (
        status,
        Json(ErrorResponse {
            kind: err.kind(),
            error: err.to_string(),
        }),
    )
}

pub fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            kind: ErrorKind::Other,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::CircuitState;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&RadarError::circuit_open(CircuitState::Open, true)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(&RadarError::not_found("event")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&RadarError::http(404, "gone")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&RadarError::http(400, "bad")), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&RadarError::validation("shape")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&RadarError::internal("bug")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&RadarError::fallback_exhausted(
                RadarError::http(404, "gone"),
                RadarError::not_found("cached result")
            )),
            StatusCode::NOT_FOUND
        );
    }
}
