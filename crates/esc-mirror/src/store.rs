//! The [`MirrorStore`] trait — the seam between the reconciliation
//! engine and whichever backend holds the mirror rows.
//!
//! Submission rows are append-only: `insert_submission` never replaces a
//! row, and review goes through [`MirrorStore::review_submission`], a
//! compare-and-set that only lands if the stored row is still
//! `SUBMITTED`. Two concurrent reviews of the same row therefore resolve
//! to exactly one winner; the loser gets [`ReviewOutcome::Stale`] with
//! the status the winner left behind.

use async_trait::async_trait;

use esc_core::{ProjectId, Timestamp, WalletAddress};
use esc_state::{Dispute, MilestoneSubmission, Ordinal, Project, SubmissionStatus};

use crate::error::StoreError;

/// Result of a compare-and-set submission review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The review landed; the stored row now matches the reviewed row.
    Applied,
    /// Another review got there first. Carries the status the stored row
    /// holds now.
    Stale(SubmissionStatus),
}

/// Aggregate row counts for the operator dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MirrorCounts {
    pub total_projects: u64,
    pub open: u64,
    pub active: u64,
    pub completed: u64,
    pub refunded: u64,
    pub open_disputes: u64,
}

/// Durable storage for mirror rows.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    // ── Projects ─────────────────────────────────────────────────────

    /// Insert a newly created project row.
    async fn insert_project(&self, project: &Project) -> Result<(), StoreError>;

    /// Fetch one project by mirror id.
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// Persist an updated project row (status, chain id, milestones).
    async fn update_project(&self, project: &Project) -> Result<(), StoreError>;

    /// All projects where the wallet is client or freelancer, newest first.
    async fn projects_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<Project>, StoreError>;

    /// Every project row, newest first.
    async fn all_projects(&self) -> Result<Vec<Project>, StoreError>;

    /// `ACTIVE` projects whose last mirror write predates `cutoff`.
    async fn abandoned_projects(&self, cutoff: Timestamp) -> Result<Vec<Project>, StoreError>;

    // ── Submissions ──────────────────────────────────────────────────

    /// Append a submission row. Never replaces an existing row.
    async fn insert_submission(
        &self,
        submission: &MilestoneSubmission,
    ) -> Result<(), StoreError>;

    /// Submission rows for a project, optionally narrowed to one ordinal,
    /// oldest first.
    async fn submissions(
        &self,
        project: ProjectId,
        ordinal: Option<Ordinal>,
    ) -> Result<Vec<MilestoneSubmission>, StoreError>;

    /// Compare-and-set review: persist `reviewed` (status, release tx,
    /// review time) only if the stored row with the same id is still
    /// `SUBMITTED`.
    async fn review_submission(
        &self,
        reviewed: &MilestoneSubmission,
    ) -> Result<ReviewOutcome, StoreError>;

    // ── Disputes ─────────────────────────────────────────────────────

    /// Insert a dispute row, enforcing at most one `OPEN` dispute per
    /// (project, ordinal).
    ///
    /// # Errors
    ///
    /// [`StoreError::OpenDisputeExists`] when the uniqueness rule is
    /// violated.
    async fn insert_dispute(&self, dispute: &Dispute) -> Result<(), StoreError>;

    /// Persist a closed dispute row (resolution fields, status).
    async fn update_dispute(&self, dispute: &Dispute) -> Result<(), StoreError>;

    /// All dispute rows for a project, newest first.
    async fn disputes(&self, project: ProjectId) -> Result<Vec<Dispute>, StoreError>;

    /// The open dispute for (project, ordinal), if any.
    async fn open_dispute(
        &self,
        project: ProjectId,
        ordinal: Ordinal,
    ) -> Result<Option<Dispute>, StoreError>;

    // ── Dashboard ────────────────────────────────────────────────────

    /// Aggregate counts across the whole mirror.
    async fn counts(&self) -> Result<MirrorCounts, StoreError>;
}
