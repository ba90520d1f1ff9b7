//! # Milestone State Machine
//!
//! Every project carries exactly 4 milestones, fixed at creation. A
//! milestone's status is a pure projection — see [`derive_status`] — and
//! the transition table below is the single place that decides whether a
//! requested action is legal for a given actor and derived state.
//!
//! ## Derivation Precedence
//!
//! 1. Admin force-refund overlay → `REFUNDED` (terminal, unconditional).
//! 2. Project still `OPEN` → `LOCKED`.
//! 3. Open dispute on this ordinal → `DISPUTED` (overlay; the underlying
//!    pending/submitted state is preserved in the submission rows and
//!    re-emerges when the dispute closes).
//! 4. Most recent submission: approved → `APPROVED`, submitted →
//!    `SUBMITTED`, rejected → `PENDING` (eligible for resubmission).
//! 5. No submission → `PENDING`.
//!
//! ## Transition Table
//!
//! | Actor      | From                  | Action        | To        |
//! |------------|-----------------------|---------------|-----------|
//! | Freelancer | pending               | submit        | submitted |
//! | Client     | submitted             | approve       | approved  |
//! | Client     | submitted             | reject        | pending   |
//! | Cl/Fl      | pending, submitted    | file dispute  | disputed  |
//! | Admin      | pending, submitted, disputed | force release | approved |
//! | Admin      | any non-terminal      | force refund  | refunded  |
//!
//! `APPROVED` and `REFUNDED` are terminal per ordinal.

use serde::{Deserialize, Serialize};

use esc_core::{Amount, CoreError, Role, TxId};

use crate::error::StateError;
use crate::project::ProjectStatus;
use crate::submission::{MilestoneSubmission, SubmissionStatus};

/// Exactly 4 milestones per project, fixed at creation.
pub const MILESTONE_COUNT: usize = 4;

// ─── Ordinal ─────────────────────────────────────────────────────────

/// A 1-based milestone number (1–4) within a project.
///
/// Construction validates the range once; everything downstream can rely
/// on an `Ordinal` being in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ordinal(u8);

impl Ordinal {
    /// All four ordinals in order.
    pub const ALL: [Ordinal; MILESTONE_COUNT] = [Ordinal(1), Ordinal(2), Ordinal(3), Ordinal(4)];

    /// Create an ordinal, rejecting values outside 1..=4.
    pub fn new(n: u8) -> Result<Self, CoreError> {
        if (1..=MILESTONE_COUNT as u8).contains(&n) {
            Ok(Self(n))
        } else {
            Err(CoreError::InvalidOrdinal(n))
        }
    }

    /// The 1-based number.
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Ordinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Stored Milestone Fields ─────────────────────────────────────────

/// The stored portion of a milestone: title, amount, and the refund
/// overlay marker. Status is **not** here — it is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// 1-based ordinal, immutable.
    pub ordinal: Ordinal,
    /// Milestone title.
    pub title: String,
    /// Fraction of the total budget escrowed for this ordinal.
    pub amount: Amount,
    /// Set when an admin force-refund for this ordinal was accepted by
    /// the ledger. Presence of this marker makes the derived status
    /// `REFUNDED` unconditionally.
    pub refund_tx_id: Option<TxId>,
}

impl Milestone {
    /// Create a milestone with no refund overlay.
    pub fn new(ordinal: Ordinal, title: impl Into<String>, amount: Amount) -> Self {
        Self {
            ordinal,
            title: title.into(),
            amount,
            refund_tx_id: None,
        }
    }
}

// ─── Derived Status ──────────────────────────────────────────────────

/// The derived status of a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneStatus {
    /// Project not yet funded; no milestone action is possible.
    Locked,
    /// Eligible for freelancer submission (or resubmission after reject).
    Pending,
    /// A submission awaits client review.
    Submitted,
    /// Funds released for this ordinal (terminal).
    Approved,
    /// An open dispute blocks the normal handshake (overlay).
    Disputed,
    /// Admin force-refunded this ordinal (terminal).
    Refunded,
}

impl MilestoneStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::Pending => "PENDING",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Disputed => "DISPUTED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Whether this status is terminal — no further transition accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Refunded)
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute a milestone's status from its inputs.
///
/// Pure function of (project status, refund overlay, open-dispute
/// existence, latest submission): recomputing from the same inputs always
/// yields the same result. `latest_submission` must be the
/// most-recent-by-timestamp row for this ordinal — see
/// [`MilestoneSubmission::latest`].
pub fn derive_status(
    project_status: ProjectStatus,
    milestone: &Milestone,
    has_open_dispute: bool,
    latest_submission: Option<&MilestoneSubmission>,
) -> MilestoneStatus {
    if milestone.refund_tx_id.is_some() {
        return MilestoneStatus::Refunded;
    }
    if project_status == ProjectStatus::Open {
        return MilestoneStatus::Locked;
    }
    if has_open_dispute {
        return MilestoneStatus::Disputed;
    }
    match latest_submission.map(|s| s.status) {
        Some(SubmissionStatus::Approved) => MilestoneStatus::Approved,
        Some(SubmissionStatus::Submitted) => MilestoneStatus::Submitted,
        Some(SubmissionStatus::Rejected) | None => MilestoneStatus::Pending,
    }
}

// ─── Transition Validation ───────────────────────────────────────────

/// Actions that target a single milestone ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneAction {
    /// Freelancer submits a deliverable.
    Submit,
    /// Client approves the current submission, releasing funds.
    Approve,
    /// Client rejects the current submission.
    Reject,
    /// Client or freelancer files a dispute.
    FileDispute,
    /// Admin releases funds without client approval.
    ForceRelease,
    /// Admin refunds this ordinal to the client.
    ForceRefund,
}

impl MilestoneAction {
    /// The canonical string name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "SUBMIT",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::FileDispute => "FILE_DISPUTE",
            Self::ForceRelease => "FORCE_RELEASE",
            Self::ForceRefund => "FORCE_REFUND",
        }
    }

    /// Whether `role` is ever allowed to perform this action.
    fn role_allowed(&self, role: Role) -> bool {
        match self {
            Self::Submit => role == Role::Freelancer,
            Self::Approve | Self::Reject => role == Role::Client,
            Self::FileDispute => matches!(role, Role::Client | Role::Freelancer),
            Self::ForceRelease | Self::ForceRefund => role == Role::Admin,
        }
    }

    /// Source states this action is legal from.
    fn legal_from(&self, current: MilestoneStatus) -> bool {
        use MilestoneStatus::*;
        match self {
            Self::Submit => current == Pending,
            Self::Approve | Self::Reject => current == Submitted,
            Self::FileDispute => matches!(current, Pending | Submitted),
            Self::ForceRelease => matches!(current, Pending | Submitted | Disputed),
            Self::ForceRefund => !current.is_terminal(),
        }
    }
}

impl std::fmt::Display for MilestoneAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a requested transition against the table.
///
/// Checks the role first (an actor who may never perform the action gets
/// `Forbidden` regardless of state), then the source state (`Conflict`
/// naming the current derived state).
pub fn check_transition(
    action: MilestoneAction,
    role: Role,
    ordinal: Ordinal,
    current: MilestoneStatus,
) -> Result<(), StateError> {
    if !action.role_allowed(role) {
        return Err(StateError::Forbidden { action, role });
    }
    if !action.legal_from(current) {
        return Err(StateError::Conflict {
            action,
            ordinal,
            current,
        });
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use esc_core::{ProjectId, Timestamp};

    fn ms() -> Milestone {
        Milestone::new(Ordinal::new(1).unwrap(), "Design", Amount::micro(25_000_000))
    }

    fn sub(status: SubmissionStatus) -> MilestoneSubmission {
        let mut s = MilestoneSubmission::new(
            ProjectId::new(),
            Ordinal::new(1).unwrap(),
            "https://x/1",
            None,
            Some(TxId::accepted("0xabc")),
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        )
        .unwrap();
        s.status = status;
        s
    }

    // ── Derivation ───────────────────────────────────────────────────

    #[test]
    fn test_locked_while_project_open() {
        let st = derive_status(ProjectStatus::Open, &ms(), false, None);
        assert_eq!(st, MilestoneStatus::Locked);
    }

    #[test]
    fn test_pending_when_no_submission() {
        let st = derive_status(ProjectStatus::Active, &ms(), false, None);
        assert_eq!(st, MilestoneStatus::Pending);
    }

    #[test]
    fn test_submitted_follows_latest_submission() {
        let s = sub(SubmissionStatus::Submitted);
        let st = derive_status(ProjectStatus::Active, &ms(), false, Some(&s));
        assert_eq!(st, MilestoneStatus::Submitted);
    }

    #[test]
    fn test_rejected_submission_reverts_to_pending() {
        let s = sub(SubmissionStatus::Rejected);
        let st = derive_status(ProjectStatus::Active, &ms(), false, Some(&s));
        assert_eq!(st, MilestoneStatus::Pending);
    }

    #[test]
    fn test_dispute_overlays_submitted() {
        let s = sub(SubmissionStatus::Submitted);
        let st = derive_status(ProjectStatus::Active, &ms(), true, Some(&s));
        assert_eq!(st, MilestoneStatus::Disputed);
    }

    #[test]
    fn test_dispute_close_restores_underlying_state() {
        // Same inputs minus the dispute flag: the underlying submitted
        // state re-emerges because nothing was destroyed by the overlay.
        let s = sub(SubmissionStatus::Submitted);
        let during = derive_status(ProjectStatus::Active, &ms(), true, Some(&s));
        let after = derive_status(ProjectStatus::Active, &ms(), false, Some(&s));
        assert_eq!(during, MilestoneStatus::Disputed);
        assert_eq!(after, MilestoneStatus::Submitted);
    }

    #[test]
    fn test_refund_overlay_wins_unconditionally() {
        let mut m = ms();
        m.refund_tx_id = Some(TxId::accepted("0xrefund"));
        let s = sub(SubmissionStatus::Approved);
        // Even with an approved submission and an open dispute.
        let st = derive_status(ProjectStatus::Active, &m, true, Some(&s));
        assert_eq!(st, MilestoneStatus::Refunded);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let s = sub(SubmissionStatus::Submitted);
        let a = derive_status(ProjectStatus::Active, &ms(), false, Some(&s));
        let b = derive_status(ProjectStatus::Active, &ms(), false, Some(&s));
        assert_eq!(a, b);
    }

    // ── Transition table ─────────────────────────────────────────────

    fn o1() -> Ordinal {
        Ordinal::new(1).unwrap()
    }

    #[test]
    fn test_freelancer_submit_from_pending() {
        assert!(check_transition(
            MilestoneAction::Submit,
            Role::Freelancer,
            o1(),
            MilestoneStatus::Pending
        )
        .is_ok());
    }

    #[test]
    fn test_submit_from_locked_is_conflict() {
        let err = check_transition(
            MilestoneAction::Submit,
            Role::Freelancer,
            o1(),
            MilestoneStatus::Locked,
        )
        .unwrap_err();
        match err {
            StateError::Conflict { current, .. } => assert_eq!(current, MilestoneStatus::Locked),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_client_cannot_submit() {
        let err = check_transition(
            MilestoneAction::Submit,
            Role::Client,
            o1(),
            MilestoneStatus::Pending,
        )
        .unwrap_err();
        assert!(matches!(err, StateError::Forbidden { .. }));
    }

    #[test]
    fn test_approve_requires_submitted() {
        assert!(check_transition(
            MilestoneAction::Approve,
            Role::Client,
            o1(),
            MilestoneStatus::Submitted
        )
        .is_ok());
        assert!(check_transition(
            MilestoneAction::Approve,
            Role::Client,
            o1(),
            MilestoneStatus::Pending
        )
        .is_err());
    }

    #[test]
    fn test_approve_blocked_by_dispute_overlay() {
        let err = check_transition(
            MilestoneAction::Approve,
            Role::Client,
            o1(),
            MilestoneStatus::Disputed,
        )
        .unwrap_err();
        assert!(matches!(err, StateError::Conflict { .. }));
    }

    #[test]
    fn test_file_dispute_from_pending_or_submitted() {
        for st in [MilestoneStatus::Pending, MilestoneStatus::Submitted] {
            assert!(
                check_transition(MilestoneAction::FileDispute, Role::Freelancer, o1(), st).is_ok()
            );
            assert!(check_transition(MilestoneAction::FileDispute, Role::Client, o1(), st).is_ok());
        }
        assert!(check_transition(
            MilestoneAction::FileDispute,
            Role::Client,
            o1(),
            MilestoneStatus::Disputed
        )
        .is_err());
    }

    #[test]
    fn test_admin_force_release_includes_disputed() {
        for st in [
            MilestoneStatus::Pending,
            MilestoneStatus::Submitted,
            MilestoneStatus::Disputed,
        ] {
            assert!(check_transition(MilestoneAction::ForceRelease, Role::Admin, o1(), st).is_ok());
        }
    }

    #[test]
    fn test_admin_force_refund_any_non_terminal() {
        for st in [
            MilestoneStatus::Locked,
            MilestoneStatus::Pending,
            MilestoneStatus::Submitted,
            MilestoneStatus::Disputed,
        ] {
            assert!(check_transition(MilestoneAction::ForceRefund, Role::Admin, o1(), st).is_ok());
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for st in [MilestoneStatus::Approved, MilestoneStatus::Refunded] {
            for action in [
                MilestoneAction::Submit,
                MilestoneAction::Approve,
                MilestoneAction::Reject,
                MilestoneAction::FileDispute,
                MilestoneAction::ForceRefund,
            ] {
                let role = match action {
                    MilestoneAction::Submit => Role::Freelancer,
                    MilestoneAction::ForceRefund => Role::Admin,
                    _ => Role::Client,
                };
                assert!(
                    check_transition(action, role, o1(), st).is_err(),
                    "{action} accepted from terminal {st}"
                );
            }
        }
    }

    #[test]
    fn test_non_admin_cannot_force() {
        for role in [Role::Client, Role::Freelancer] {
            let err = check_transition(
                MilestoneAction::ForceRefund,
                role,
                o1(),
                MilestoneStatus::Pending,
            )
            .unwrap_err();
            assert!(matches!(err, StateError::Forbidden { .. }));
        }
    }

    #[test]
    fn test_check_transition_reachable_from_crate_root() {
        // Downstream crates import this through the root re-export.
        assert!(crate::check_transition(
            MilestoneAction::Submit,
            Role::Freelancer,
            o1(),
            MilestoneStatus::Pending,
        )
        .is_ok());
    }

    #[test]
    fn test_ordinal_bounds() {
        assert!(Ordinal::new(0).is_err());
        assert!(Ordinal::new(1).is_ok());
        assert!(Ordinal::new(4).is_ok());
        assert!(Ordinal::new(5).is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(MilestoneStatus::Locked.to_string(), "LOCKED");
        assert_eq!(MilestoneStatus::Disputed.to_string(), "DISPUTED");
    }
}
