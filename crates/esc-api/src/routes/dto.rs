//! Response types shared across the route modules.
//!
//! Wire representations are string-based: identifiers, timestamps, and
//! statuses serialize as their canonical strings; amounts carry both the
//! integer micro-unit value and the display-unit rendering.

use serde::Serialize;
use utoipa::ToSchema;

use esc_core::{Amount, TokenKind};
use esc_engine::{MilestoneView, ProjectView};
use esc_mirror::MirrorCounts;
use esc_state::{Dispute, MilestoneSubmission, Ordinal, Project};

use crate::error::AppError;

/// A project with all derived milestone statuses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: String,
    pub client: String,
    pub freelancer: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub token: String,
    pub total_budget_micro: u64,
    pub total_budget: String,
    /// Display status; `DISPUTED` overlaid when an open dispute exists.
    pub status: String,
    pub on_chain_id: Option<u64>,
    pub funding_tx_id: Option<String>,
    pub open_disputes: usize,
    pub milestones: Vec<MilestoneResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// One milestone with its derived status.
#[derive(Debug, Serialize, ToSchema)]
pub struct MilestoneResponse {
    pub ordinal: u8,
    pub title: String,
    pub amount_micro: u64,
    pub amount: String,
    pub status: String,
    pub refund_tx_id: Option<String>,
    pub latest_submission: Option<SubmissionResponse>,
}

/// One submission row.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: String,
    pub ordinal: u8,
    pub deliverable_url: String,
    pub note: Option<String>,
    pub status: String,
    pub submitted_at: String,
    pub completion_tx_id: Option<String>,
    pub release_tx_id: Option<String>,
    pub reviewed_at: Option<String>,
}

/// One dispute row.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisputeResponse {
    pub id: String,
    pub ordinal: u8,
    pub reason: String,
    pub evidence_url: Option<String>,
    pub filed_by: String,
    pub dispute_tx_id: String,
    pub status: String,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
    pub resolution_tx_id: Option<String>,
    pub resolved_at: Option<String>,
    pub filed_at: String,
}

/// Aggregate mirror counts for the operator dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_projects: u64,
    pub open: u64,
    pub active: u64,
    pub completed: u64,
    pub refunded: u64,
    pub open_disputes: u64,
}

// ─── Conversions ─────────────────────────────────────────────────────

pub fn project_response(view: ProjectView) -> ProjectResponse {
    let token = view.project.token;
    ProjectResponse {
        id: view.project.id.as_uuid().to_string(),
        client: view.project.client.to_string(),
        freelancer: view.project.freelancer.as_ref().map(|w| w.to_string()),
        title: view.project.title.clone(),
        description: view.project.description.clone(),
        category: view.project.category.clone(),
        token: token.as_str().to_string(),
        total_budget_micro: view.project.total_budget.as_micro(),
        total_budget: view.project.total_budget.display(token),
        status: view.status.as_str().to_string(),
        on_chain_id: view.project.on_chain_id.map(|c| c.0),
        funding_tx_id: view.project.funding_tx_id.as_ref().map(|t| t.to_string()),
        open_disputes: view.open_disputes,
        milestones: view
            .milestones
            .iter()
            .map(|m| milestone_response(m, token))
            .collect(),
        created_at: view.project.created_at.to_iso8601(),
        updated_at: view.project.updated_at.to_iso8601(),
    }
}

fn milestone_response(view: &MilestoneView, token: TokenKind) -> MilestoneResponse {
    MilestoneResponse {
        ordinal: view.ordinal.as_u8(),
        title: view.title.clone(),
        amount_micro: view.amount.as_micro(),
        amount: view.amount.display(token),
        status: view.status.as_str().to_string(),
        refund_tx_id: view.refund_tx_id.as_ref().map(|t| t.to_string()),
        latest_submission: view.latest_submission.as_ref().map(submission_response),
    }
}

pub fn submission_response(s: &MilestoneSubmission) -> SubmissionResponse {
    SubmissionResponse {
        id: s.id.as_uuid().to_string(),
        ordinal: s.ordinal.as_u8(),
        deliverable_url: s.deliverable_url.clone(),
        note: s.note.clone(),
        status: s.status.as_str().to_string(),
        submitted_at: s.submitted_at.to_iso8601(),
        completion_tx_id: s.completion_tx_id.as_ref().map(|t| t.to_string()),
        release_tx_id: s.release_tx_id.as_ref().map(|t| t.to_string()),
        reviewed_at: s.reviewed_at.map(|t| t.to_iso8601()),
    }
}

pub fn dispute_response(d: &Dispute) -> DisputeResponse {
    DisputeResponse {
        id: d.id.as_uuid().to_string(),
        ordinal: d.ordinal.as_u8(),
        reason: d.reason.clone(),
        evidence_url: d.evidence_url.clone(),
        filed_by: d.filed_by.to_string(),
        dispute_tx_id: d.dispute_tx_id.to_string(),
        status: d.status.as_str().to_string(),
        resolution: d.resolution.clone(),
        resolved_by: d.resolved_by.map(|a| a.as_uuid().to_string()),
        resolution_tx_id: d.resolution_tx_id.as_ref().map(|t| t.to_string()),
        resolved_at: d.resolved_at.map(|t| t.to_iso8601()),
        filed_at: d.filed_at.to_iso8601(),
    }
}

pub fn stats_response(counts: MirrorCounts) -> StatsResponse {
    StatsResponse {
        total_projects: counts.total_projects,
        open: counts.open,
        active: counts.active,
        completed: counts.completed,
        refunded: counts.refunded,
        open_disputes: counts.open_disputes,
    }
}

/// A project row without derived state (abandoned-project listing).
pub fn bare_project_response(project: &Project) -> ProjectResponse {
    let token = project.token;
    ProjectResponse {
        id: project.id.as_uuid().to_string(),
        client: project.client.to_string(),
        freelancer: project.freelancer.as_ref().map(|w| w.to_string()),
        title: project.title.clone(),
        description: project.description.clone(),
        category: project.category.clone(),
        token: token.as_str().to_string(),
        total_budget_micro: project.total_budget.as_micro(),
        total_budget: project.total_budget.display(token),
        status: project.status.as_str().to_string(),
        on_chain_id: project.on_chain_id.map(|c| c.0),
        funding_tx_id: project.funding_tx_id.as_ref().map(|t| t.to_string()),
        open_disputes: 0,
        milestones: Vec::new(),
        created_at: project.created_at.to_iso8601(),
        updated_at: project.updated_at.to_iso8601(),
    }
}

// ─── Parsing Helpers ─────────────────────────────────────────────────

pub fn parse_ordinal(n: u8) -> Result<Ordinal, AppError> {
    Ordinal::new(n).map_err(|e| AppError::Validation(e.to_string()))
}

pub fn parse_token(s: &str) -> Result<TokenKind, AppError> {
    TokenKind::parse(s)
        .ok_or_else(|| AppError::Validation(format!("unknown token: {s:?} (NATIVE or ASSET)")))
}

pub fn parse_amount(token: TokenKind, s: &str) -> Result<Amount, AppError> {
    token
        .parse_amount(s)
        .map_err(|e| AppError::Validation(e.to_string()))
}
