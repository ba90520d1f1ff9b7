//! # Admin Routes
//!
//! Override operations that require a bearer-token admin caller: dispute
//! resolution, forced settlement, whole-project refund, the abandoned-project
//! sweep, and the stats snapshot.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use esc_core::{ProjectId, Timestamp};
use esc_engine::Settlement;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::routes::dto::{self, DisputeResponse, ProjectResponse, StatsResponse, SubmissionResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request to resolve an open dispute with a settlement.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveRequest {
    /// Resolution text recorded on the dispute.
    pub resolution: String,
    /// `release` pays the freelancer; `refund` returns funds to the client.
    pub settlement: String,
}

/// Request to reset a dispute without settling funds.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetRequest {
    pub resolution: String,
}

/// Request for a forced settlement or whole-project refund.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OverrideRequest {
    /// Audit note recorded with the override.
    pub note: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/admin/projects/{id}/milestones/{ordinal}/resolve",
            post(resolve_dispute),
        )
        .route(
            "/v1/admin/projects/{id}/milestones/{ordinal}/reset",
            post(reset_dispute),
        )
        .route(
            "/v1/admin/projects/{id}/milestones/{ordinal}/force-release",
            post(force_release),
        )
        .route(
            "/v1/admin/projects/{id}/milestones/{ordinal}/force-refund",
            post(force_refund),
        )
        .route("/v1/admin/projects/{id}/refund", post(refund_project))
        .route("/v1/admin/abandoned", get(abandoned_projects))
        .route("/v1/admin/stats", get(stats))
}

fn parse_settlement(s: &str) -> Result<Settlement, AppError> {
    match s.to_ascii_lowercase().as_str() {
        "release" => Ok(Settlement::Release),
        "refund" => Ok(Settlement::Refund),
        other => Err(AppError::Validation(format!(
            "unknown settlement '{other}', expected release or refund"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/admin/projects/{id}/milestones/{ordinal}/resolve
#[utoipa::path(
    post,
    path = "/v1/admin/projects/{id}/milestones/{ordinal}/resolve",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("ordinal" = u8, Path, description = "Milestone ordinal (1-4)"),
    ),
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Dispute resolved", body = DisputeResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "No open dispute on this milestone"),
    ),
    tag = "admin"
)]
pub async fn resolve_dispute(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path((id, ordinal)): Path<(Uuid, u8)>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<DisputeResponse>, AppError> {
    let ordinal = dto::parse_ordinal(ordinal)?;
    let settlement = parse_settlement(&req.settlement)?;
    let dispute = state
        .engine
        .resolve_dispute(&caller, ProjectId(id), ordinal, req.resolution, settlement)
        .await?;
    Ok(Json(dto::dispute_response(&dispute)))
}

/// POST /v1/admin/projects/{id}/milestones/{ordinal}/reset
#[utoipa::path(
    post,
    path = "/v1/admin/projects/{id}/milestones/{ordinal}/reset",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("ordinal" = u8, Path, description = "Milestone ordinal (1-4)"),
    ),
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Dispute reset", body = DisputeResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "No open dispute on this milestone"),
    ),
    tag = "admin"
)]
pub async fn reset_dispute(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path((id, ordinal)): Path<(Uuid, u8)>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<DisputeResponse>, AppError> {
    let ordinal = dto::parse_ordinal(ordinal)?;
    let dispute = state
        .engine
        .reset_dispute(&caller, ProjectId(id), ordinal, req.resolution)
        .await?;
    Ok(Json(dto::dispute_response(&dispute)))
}

/// POST /v1/admin/projects/{id}/milestones/{ordinal}/force-release
#[utoipa::path(
    post,
    path = "/v1/admin/projects/{id}/milestones/{ordinal}/force-release",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("ordinal" = u8, Path, description = "Milestone ordinal (1-4)"),
    ),
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Funds released", body = SubmissionResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Milestone is already settled"),
    ),
    tag = "admin"
)]
pub async fn force_release(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path((id, ordinal)): Path<(Uuid, u8)>,
    Json(req): Json<OverrideRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let ordinal = dto::parse_ordinal(ordinal)?;
    let submission = state
        .engine
        .force_release(&caller, ProjectId(id), ordinal, req.note)
        .await?;
    Ok(Json(dto::submission_response(&submission)))
}

/// POST /v1/admin/projects/{id}/milestones/{ordinal}/force-refund
#[utoipa::path(
    post,
    path = "/v1/admin/projects/{id}/milestones/{ordinal}/force-refund",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("ordinal" = u8, Path, description = "Milestone ordinal (1-4)"),
    ),
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Milestone refunded", body = ProjectResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Milestone is already settled"),
    ),
    tag = "admin"
)]
pub async fn force_refund(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path((id, ordinal)): Path<(Uuid, u8)>,
    Json(req): Json<OverrideRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    let ordinal = dto::parse_ordinal(ordinal)?;
    let project = state
        .engine
        .force_refund(&caller, ProjectId(id), ordinal, req.note)
        .await?;
    let view = state.engine.project_view(&caller, project.id).await?;
    Ok(Json(dto::project_response(view)))
}

/// POST /v1/admin/projects/{id}/refund — Refund every unsettled milestone.
#[utoipa::path(
    post,
    path = "/v1/admin/projects/{id}/refund",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Project refunded", body = ProjectResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Project is already terminal"),
    ),
    tag = "admin"
)]
pub async fn refund_project(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state
        .engine
        .refund_project(&caller, ProjectId(id), req.note)
        .await?;
    let view = state.engine.project_view(&caller, project.id).await?;
    Ok(Json(dto::project_response(view)))
}

/// GET /v1/admin/abandoned — ACTIVE projects with no recent writes.
#[utoipa::path(
    get,
    path = "/v1/admin/abandoned",
    responses(
        (status = 200, description = "Stale active projects", body = [ProjectResponse]),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "admin"
)]
pub async fn abandoned_projects(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let projects = state
        .engine
        .abandoned_projects(&caller, Timestamp::now())
        .await?;
    Ok(Json(
        projects.iter().map(dto::bare_project_response).collect(),
    ))
}

/// GET /v1/admin/stats — Aggregate mirror counts.
#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    responses(
        (status = 200, description = "Mirror counts", body = StatsResponse),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "admin"
)]
pub async fn stats(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<StatsResponse>, AppError> {
    let counts = state.engine.counts(&caller).await?;
    Ok(Json(dto::stats_response(counts)))
}
