//! Operational endpoints for resetting resilience state

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Serialize;
use tracing::info;

use crate::AppState;

#[derive(Debug, Serialize)]
struct AdminResponse {
    status: &'static str,
    action: &'static str,
}

fn done(action: &'static str) -> Json<AdminResponse> {
    info!(action, "Admin action applied");
    Json(AdminResponse { status: "ok", action })
}

async fn reset_circuit(State(state): State<AppState>) -> Json<AdminResponse> {
    state.service.reset_circuit_breaker();
    done("circuit_reset")
}

async fn reset_rate_limit(State(state): State<AppState>) -> Json<AdminResponse> {
    state.service.reset_rate_limiter();
    done("rate_limit_reset")
}

async fn clear_cache(State(state): State<AppState>) -> Json<AdminResponse> {
    state.service.clear_cache();
    done("cache_cleared")
}

/// Create admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/circuit/reset", post(reset_circuit))
        .route("/admin/rate-limit/reset", post(reset_rate_limit))
        .route("/admin/cache/clear", post(clear_cache))
}
