//! # Milestone Routes
//!
//! Freelancer submissions and client reviews. A successful submission is the
//! point where the milestone's on-chain step runs; review approval triggers
//! the release step.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use esc_core::ProjectId;
use esc_engine::ReviewDecision;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::routes::dto::{self, SubmissionResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request to submit a milestone deliverable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    pub deliverable_url: String,
    pub note: Option<String>,
}

/// Request to review a submitted milestone.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// `approve` or `reject`.
    pub decision: String,
}

/// Query parameters for the submission listing.
#[derive(Debug, Deserialize)]
pub struct SubmissionsQuery {
    /// Restrict to one milestone ordinal.
    pub milestone: Option<u8>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/projects/{id}/milestones/{ordinal}/submit",
            post(submit_milestone),
        )
        .route(
            "/v1/projects/{id}/milestones/{ordinal}/review",
            post(review_submission),
        )
        .route("/v1/projects/{id}/submissions", get(list_submissions))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/projects/{id}/milestones/{ordinal}/submit — Submit a deliverable.
#[utoipa::path(
    post,
    path = "/v1/projects/{id}/milestones/{ordinal}/submit",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("ordinal" = u8, Path, description = "Milestone ordinal (1-4)"),
    ),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Submission recorded", body = SubmissionResponse),
        (status = 409, description = "Milestone is not submittable"),
        (status = 502, description = "Ledger rejected the completion"),
    ),
    tag = "milestones"
)]
pub async fn submit_milestone(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path((id, ordinal)): Path<(Uuid, u8)>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    if req.deliverable_url.trim().is_empty() {
        return Err(AppError::Validation(
            "deliverable_url must not be empty".to_string(),
        ));
    }
    let ordinal = dto::parse_ordinal(ordinal)?;
    let submission = state
        .engine
        .submit_milestone(&caller, ProjectId(id), ordinal, req.deliverable_url, req.note)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(dto::submission_response(&submission)),
    ))
}

/// POST /v1/projects/{id}/milestones/{ordinal}/review — Approve or reject.
#[utoipa::path(
    post,
    path = "/v1/projects/{id}/milestones/{ordinal}/review",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("ordinal" = u8, Path, description = "Milestone ordinal (1-4)"),
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review applied", body = SubmissionResponse),
        (status = 409, description = "Milestone is not in SUBMITTED status"),
    ),
    tag = "milestones"
)]
pub async fn review_submission(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path((id, ordinal)): Path<(Uuid, u8)>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let decision = match req.decision.to_ascii_lowercase().as_str() {
        "approve" => ReviewDecision::Approve,
        "reject" => ReviewDecision::Reject,
        other => {
            return Err(AppError::Validation(format!(
                "unknown review decision '{other}', expected approve or reject"
            )))
        }
    };
    let ordinal = dto::parse_ordinal(ordinal)?;
    let submission = state
        .engine
        .review_submission(&caller, ProjectId(id), ordinal, decision)
        .await?;
    Ok(Json(dto::submission_response(&submission)))
}

/// GET /v1/projects/{id}/submissions — Submission history, newest last.
#[utoipa::path(
    get,
    path = "/v1/projects/{id}/submissions",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("milestone" = Option<u8>, Query, description = "Restrict to one ordinal"),
    ),
    responses(
        (status = 200, description = "Submissions", body = [SubmissionResponse]),
    ),
    tag = "milestones"
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Query(query): Query<SubmissionsQuery>,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    let ordinal = query.milestone.map(dto::parse_ordinal).transpose()?;
    let rows = state
        .engine
        .submissions(&caller, ProjectId(id), ordinal)
        .await?;
    Ok(Json(rows.iter().map(dto::submission_response).collect()))
}
