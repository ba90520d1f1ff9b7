//! # State Machine Errors
//!
//! Structured errors for illegal transitions and broken entity
//! invariants. `Conflict` names the current derived state so a caller can
//! re-fetch and retry; `Forbidden` identifies the role/action mismatch.

use thiserror::Error;

use esc_core::Role;

use crate::milestone::{MilestoneAction, MilestoneStatus, Ordinal};
use crate::project::ProjectStatus;

/// Errors raised by entity constructors and transition validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Transition is illegal from the current derived state. Recoverable:
    /// the caller should re-fetch state and retry or inform the user.
    #[error("cannot {action} milestone {ordinal}: current state is {current}")]
    Conflict {
        /// The attempted action.
        action: MilestoneAction,
        /// The ordinal the action targeted.
        ordinal: Ordinal,
        /// The current derived milestone state.
        current: MilestoneStatus,
    },

    /// The caller's role may never perform this action.
    #[error("role {role} may not {action}")]
    Forbidden {
        /// The attempted action.
        action: MilestoneAction,
        /// The caller's role.
        role: Role,
    },

    /// The project is not in the status this operation requires.
    #[error("project is {current}, expected {expected}")]
    ProjectStatus {
        /// Current project status.
        current: ProjectStatus,
        /// Required project status.
        expected: ProjectStatus,
    },

    /// Milestone amounts do not sum to the declared total budget.
    #[error("milestone amounts sum to {actual} micro-units, total budget is {declared}")]
    BudgetMismatch {
        /// Sum of the four milestone amounts.
        actual: u64,
        /// Declared total budget.
        declared: u64,
    },

    /// A deliverable reference was empty.
    #[error("deliverable reference must be non-empty")]
    EmptyDeliverable,

    /// An open dispute already exists for this ordinal.
    #[error("an open dispute already exists for milestone {ordinal}")]
    DisputeAlreadyOpen {
        /// The ordinal with the existing open dispute.
        ordinal: Ordinal,
    },

    /// The dispute is not open and cannot be resolved or reset again.
    #[error("dispute is already {status}")]
    DisputeClosed {
        /// The dispute's current status string.
        status: String,
    },

    /// The submission is no longer in the state the action requires.
    /// Raised when an approve/reject races another review of the same row.
    #[error("submission is {current}, expected {expected}")]
    SubmissionStatus {
        /// Current submission status string.
        current: String,
        /// Required submission status string.
        expected: String,
    },
}
