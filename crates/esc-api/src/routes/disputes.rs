//! # Dispute Routes
//!
//! Either participant can freeze a milestone by filing a dispute; resolution
//! is admin-only and lives under the admin routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use esc_core::ProjectId;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::routes::dto::{self, DisputeResponse};
use crate::state::AppState;

/// Request to file a dispute against a milestone.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FileDisputeRequest {
    pub reason: String,
    pub evidence_url: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/projects/{id}/milestones/{ordinal}/dispute",
            post(file_dispute),
        )
        .route("/v1/projects/{id}/disputes", get(list_disputes))
}

/// POST /v1/projects/{id}/milestones/{ordinal}/dispute — Freeze a milestone.
#[utoipa::path(
    post,
    path = "/v1/projects/{id}/milestones/{ordinal}/dispute",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("ordinal" = u8, Path, description = "Milestone ordinal (1-4)"),
    ),
    request_body = FileDisputeRequest,
    responses(
        (status = 201, description = "Dispute filed", body = DisputeResponse),
        (status = 409, description = "Milestone already has an open dispute"),
        (status = 502, description = "Ledger rejected the dispute"),
    ),
    tag = "disputes"
)]
pub async fn file_dispute(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path((id, ordinal)): Path<(Uuid, u8)>,
    Json(req): Json<FileDisputeRequest>,
) -> Result<(StatusCode, Json<DisputeResponse>), AppError> {
    let ordinal = dto::parse_ordinal(ordinal)?;
    let dispute = state
        .engine
        .file_dispute(&caller, ProjectId(id), ordinal, req.reason, req.evidence_url)
        .await?;
    Ok((StatusCode::CREATED, Json(dto::dispute_response(&dispute))))
}

/// GET /v1/projects/{id}/disputes — All disputes, open and closed.
#[utoipa::path(
    get,
    path = "/v1/projects/{id}/disputes",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Disputes", body = [DisputeResponse]),
    ),
    tag = "disputes"
)]
pub async fn list_disputes(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DisputeResponse>>, AppError> {
    let disputes = state.engine.disputes(&caller, ProjectId(id)).await?;
    Ok(Json(disputes.iter().map(dto::dispute_response).collect()))
}
