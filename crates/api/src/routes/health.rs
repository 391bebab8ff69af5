//! Health and readiness for the allocation engine.
//!
//! Load balancers poll this before routing a sale's opening burst here, so
//! it distinguishes "database reachable" from "schema migrated": a pod
//! whose migrations have not run yet must not report itself ready to take
//! allocations.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the engine can serve allocations, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database answers a trivial query.
    pub db_healthy: bool,
    /// Whether the engine's tables exist (migrations applied).
    pub schema_ready: bool,
}

/// GET /health -- connectivity plus allocation readiness.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = flashmart_db::health_check(&state.pool).await.is_ok();

    // Only meaningful when the database answers at all.
    let schema_ready = if db_healthy {
        flashmart_db::schema_ready(&state.pool).await.unwrap_or(false)
    } else {
        false
    };

    let status = if db_healthy && schema_ready {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        schema_ready,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
