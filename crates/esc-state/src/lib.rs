//! # esc-state — Mirror Entities and the Milestone State Machine
//!
//! Defines the durable mirror entities (`Project`, `Milestone`,
//! `MilestoneSubmission`, `Dispute`) and the state machine that governs
//! them. The crate is pure — no I/O, no async — so every rule here is
//! testable without a store or a ledger.
//!
//! ## Design Decision: Derived Status
//!
//! A milestone's status is never stored. It is a pure projection from
//! four inputs: the project's status, the presence of an open dispute for
//! the ordinal, the refund overlay marker, and the most recent submission
//! row. Storing a status string alongside the submission history would
//! allow the two to disagree — the projection makes that disagreement
//! unrepresentable. See [`milestone::derive_status`].
//!
//! ## Design Decision: Validated Enum over Typestate
//!
//! Transitions are validated at runtime against a transition table rather
//! than encoded as typestate. Milestone state is reconstructed from
//! database rows on every request, so the state is not known at compile
//! time; a validated enum serializes directly via serde and rejects
//! illegal transitions with structured [`StateError`] values.

pub mod dispute;
pub mod error;
pub mod milestone;
pub mod project;
pub mod submission;

pub use dispute::{Dispute, DisputeStatus};
pub use error::StateError;
pub use milestone::{
    check_transition, derive_status, Milestone, MilestoneAction, MilestoneStatus, Ordinal,
    MILESTONE_COUNT,
};
pub use project::{Project, ProjectStatus};
pub use submission::{MilestoneSubmission, SubmissionStatus};
