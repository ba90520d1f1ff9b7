//! # Project Routes
//!
//! Create, fund, and read escrow projects. Creation is mirror-only; the
//! escrow is funded (and the ledger first involved) by the explicit fund
//! endpoint.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use esc_core::{ProjectId, WalletAddress};
use esc_engine::{MilestoneDraft, NewProject};
use esc_state::MILESTONE_COUNT;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::routes::dto::{self, ProjectResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request to create a project.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// Freelancer wallet address; may be assigned later, but funding
    /// requires it.
    pub freelancer: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Token name: `NATIVE` or `ASSET`.
    pub token: String,
    /// Exactly 4 milestones in ordinal order.
    pub milestones: Vec<MilestoneRequest>,
}

/// One milestone in a creation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MilestoneRequest {
    pub title: String,
    /// Amount in display units (e.g. `"25"`, `"0.125"`).
    pub amount: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/projects", post(create_project).get(list_projects))
        .route("/v1/projects/{id}", get(get_project))
        .route("/v1/projects/{id}/fund", post(fund_project))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/projects — Create a project in OPEN status.
#[utoipa::path(
    post,
    path = "/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 422, description = "Validation error"),
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if req.milestones.len() != MILESTONE_COUNT {
        return Err(AppError::Validation(format!(
            "exactly {MILESTONE_COUNT} milestones are required, got {}",
            req.milestones.len()
        )));
    }
    let token = dto::parse_token(&req.token)?;
    let freelancer = req
        .freelancer
        .as_deref()
        .map(WalletAddress::new)
        .transpose()
        .map_err(|e| AppError::Validation(format!("invalid freelancer address: {e}")))?;

    let mut drafts = Vec::with_capacity(MILESTONE_COUNT);
    for m in &req.milestones {
        if m.title.trim().is_empty() {
            return Err(AppError::Validation(
                "milestone titles must not be empty".to_string(),
            ));
        }
        drafts.push(MilestoneDraft {
            title: m.title.clone(),
            amount: dto::parse_amount(token, &m.amount)?,
        });
    }
    let milestones: [MilestoneDraft; MILESTONE_COUNT] = drafts
        .try_into()
        .map_err(|_| AppError::Validation("exactly 4 milestones are required".to_string()))?;

    let draft = NewProject {
        freelancer,
        title: req.title,
        description: req.description,
        category: req.category,
        token,
        milestones,
    };
    let project = state.engine.create_project(&caller, draft).await?;
    let view = state.engine.project_view(&caller, project.id).await?;
    Ok((StatusCode::CREATED, Json(dto::project_response(view))))
}

/// GET /v1/projects — Projects visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/projects",
    responses(
        (status = 200, description = "Projects for this caller", body = [ProjectResponse]),
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let views = state.engine.list_projects(&caller).await?;
    Ok(Json(views.into_iter().map(dto::project_response).collect()))
}

/// GET /v1/projects/{id} — One project with derived milestone statuses.
#[utoipa::path(
    get,
    path = "/v1/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project view", body = ProjectResponse),
        (status = 404, description = "No such project"),
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, AppError> {
    let view = state.engine.project_view(&caller, ProjectId(id)).await?;
    Ok(Json(dto::project_response(view)))
}

/// POST /v1/projects/{id}/fund — Fund the escrow (OPEN → ACTIVE).
#[utoipa::path(
    post,
    path = "/v1/projects/{id}/fund",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Escrow funded", body = ProjectResponse),
        (status = 409, description = "Project is not OPEN"),
        (status = 502, description = "Ledger rejected the funding"),
    ),
    tag = "projects"
)]
pub async fn fund_project(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state.engine.fund_project(&caller, ProjectId(id)).await?;
    let view = state.engine.project_view(&caller, project.id).await?;
    Ok(Json(dto::project_response(view)))
}
