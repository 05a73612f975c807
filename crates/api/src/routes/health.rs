use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::ApiState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    storage: &'static str,
}

#[derive(Serialize)]
struct VersionResponse {
    name: &'static str,
    version: &'static str,
}

/// Liveness plus a single keyed read against the slot table.
async fn health_check(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.get_item(&state.tables.slots, "__health").await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                storage: "ok",
            }),
        ),
        Err(e) => {
            warn!("Health check storage read failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    storage: "unavailable",
                }),
            )
        }
    }
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
}
