//! HTTP route modules, one per resource group.

pub mod admin;
pub mod disputes;
pub mod dto;
pub mod milestones;
pub mod projects;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// All v1 routes merged into one router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(projects::router())
        .merge(milestones::router())
        .merge(disputes::router())
        .merge(admin::router())
}

/// GET /health — Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
