//! # Milestone Submissions
//!
//! One row per freelancer attempt to close a milestone. Rows are
//! append-only: a rejected submission is retained for audit and a fresh
//! row is created for resubmission. The "current" submission for an
//! ordinal is a computed pointer — most recent by timestamp, ties broken
//! by submission id so the projection is a total order.

use serde::{Deserialize, Serialize};

use esc_core::{ProjectId, SubmissionId, Timestamp, TxId};

use crate::error::StateError;
use crate::milestone::Ordinal;

/// The review status of one submission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    /// Awaiting client review.
    Submitted,
    /// Client (or admin) released funds against this row. Immutable
    /// from here on.
    Approved,
    /// Client rejected; retained for audit, eligible for resubmission.
    Rejected,
}

impl SubmissionStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parse a canonical status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freelancer's attempt to close one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSubmission {
    /// Row identifier.
    pub id: SubmissionId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Target milestone ordinal.
    pub ordinal: Ordinal,
    /// Deliverable reference (URL), non-empty.
    pub deliverable_url: String,
    /// Optional freelancer note.
    pub note: Option<String>,
    /// Review status.
    pub status: SubmissionStatus,
    /// When the freelancer submitted.
    pub submitted_at: Timestamp,
    /// Set once the ledger accepted the freelancer's "complete" call.
    /// May be a recovery marker — see `TxId::is_recovery_marker`.
    pub completion_tx_id: Option<TxId>,
    /// Set once the ledger accepted the client's "release" call.
    pub release_tx_id: Option<TxId>,
    /// When the client (or admin) reviewed this row.
    pub reviewed_at: Option<Timestamp>,
}

impl MilestoneSubmission {
    /// Create a new `Submitted` row.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::EmptyDeliverable`] for an empty or
    /// whitespace-only deliverable reference.
    pub fn new(
        project_id: ProjectId,
        ordinal: Ordinal,
        deliverable_url: impl Into<String>,
        note: Option<String>,
        completion_tx_id: Option<TxId>,
        now: Timestamp,
    ) -> Result<Self, StateError> {
        let deliverable_url = deliverable_url.into();
        if deliverable_url.trim().is_empty() {
            return Err(StateError::EmptyDeliverable);
        }
        Ok(Self {
            id: SubmissionId::new(),
            project_id,
            ordinal,
            deliverable_url,
            note,
            status: SubmissionStatus::Submitted,
            submitted_at: now,
            completion_tx_id,
            release_tx_id: None,
            reviewed_at: None,
        })
    }

    /// Approve this row, stamping the release transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SubmissionStatus`] unless the row is
    /// currently `Submitted` — an approved row is immutable and a
    /// rejected row can only be superseded by a new submission.
    pub fn approve(&mut self, release_tx_id: TxId, now: Timestamp) -> Result<(), StateError> {
        self.require_submitted("APPROVED")?;
        self.status = SubmissionStatus::Approved;
        self.release_tx_id = Some(release_tx_id);
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Reject this row. The milestone becomes eligible for resubmission.
    pub fn reject(&mut self, now: Timestamp) -> Result<(), StateError> {
        self.require_submitted("REJECTED")?;
        self.status = SubmissionStatus::Rejected;
        self.reviewed_at = Some(now);
        Ok(())
    }

    fn require_submitted(&self, target: &str) -> Result<(), StateError> {
        if self.status != SubmissionStatus::Submitted {
            return Err(StateError::SubmissionStatus {
                current: self.status.as_str().to_string(),
                expected: format!("SUBMITTED (for transition to {target})"),
            });
        }
        Ok(())
    }

    /// Select the "current" submission from an iterator of rows:
    /// most recent `submitted_at`, ties broken by id ordering.
    ///
    /// Last-write-wins for concurrent submissions from two sessions; both
    /// rows are retained, this only decides which one the projection reads.
    pub fn latest<'a>(
        rows: impl IntoIterator<Item = &'a MilestoneSubmission>,
    ) -> Option<&'a MilestoneSubmission> {
        rows.into_iter().max_by_key(|s| (s.submitted_at, s.id))
    }
}
