//! # Project Lifecycle
//!
//! A project is an escrow agreement between exactly one client and one
//! freelancer, owning exactly 4 milestones.
//!
//! ## States
//!
//! ```text
//! Open ──mark_funded()──▶ Active ──mark_completed()──▶ Completed
//!                            │
//!                            └──mark_refunded()──▶ Refunded
//! ```
//!
//! `Disputed` is a display status, derived at read time from open dispute
//! rows — it is intentionally never stored, for the same reason milestone
//! status is derived (a stored flag and the dispute rows could disagree).
//!
//! ## Invariants
//!
//! - `Active` requires a non-null on-ledger identifier; `Open` implies it
//!   is null. Enforced by construction: the only path to `Active` is
//!   [`Project::mark_funded`], which supplies the identifier.
//! - The 4 milestone amounts sum to the total budget, checked at creation.

use serde::{Deserialize, Serialize};

use esc_core::{
    Amount, OnChainProjectId, ProjectId, Timestamp, TokenKind, TxId, WalletAddress,
};

use crate::error::StateError;
use crate::milestone::{Milestone, Ordinal, MILESTONE_COUNT};

/// The stored lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// Created, not yet funded. Milestones are locked.
    Open,
    /// Funding transaction accepted; milestones are live.
    Active,
    /// All 4 ordinals approved (terminal).
    Completed,
    /// An open dispute exists on some ordinal. Derived for display only,
    /// never written to the mirror.
    Disputed,
    /// Admin refunded the whole project (terminal).
    Refunded,
}

impl ProjectStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Disputed => "DISPUTED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Parse a canonical status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "DISPUTED" => Some(Self::Disputed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An escrow agreement between one client and one freelancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Mirror-side identifier.
    pub id: ProjectId,
    /// The funding client's wallet address.
    pub client: WalletAddress,
    /// The delivering freelancer, nullable until assigned.
    pub freelancer: Option<WalletAddress>,
    /// Project title.
    pub title: String,
    /// Free-form description, opaque to the core.
    pub description: String,
    /// Category label, opaque to the core.
    pub category: String,
    /// Token the escrow is denominated in.
    pub token: TokenKind,
    /// Total escrowed budget in micro-units.
    pub total_budget: Amount,
    /// Stored lifecycle status.
    pub status: ProjectStatus,
    /// On-ledger project identifier, set when funding is accepted.
    pub on_chain_id: Option<OnChainProjectId>,
    /// The accepted funding transaction.
    pub funding_tx_id: Option<TxId>,
    /// The exactly-4 milestones, by ordinal.
    pub milestones: Vec<Milestone>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last mirror write affecting this project. Drives the
    /// abandoned-project staleness query.
    pub updated_at: Timestamp,
}

impl Project {
    /// Create a project in `Open` status.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::BudgetMismatch`] when the milestone amounts
    /// do not sum to `total_budget`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: WalletAddress,
        freelancer: Option<WalletAddress>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        token: TokenKind,
        total_budget: Amount,
        milestones: [Milestone; MILESTONE_COUNT],
        now: Timestamp,
    ) -> Result<Self, StateError> {
        let amounts: Vec<Amount> = milestones.iter().map(|m| m.amount).collect();
        let sum = Amount::checked_sum(&amounts).unwrap_or(Amount::micro(u64::MAX));
        if sum != total_budget {
            return Err(StateError::BudgetMismatch {
                actual: sum.as_micro(),
                declared: total_budget.as_micro(),
            });
        }
        Ok(Self {
            id: ProjectId::new(),
            client,
            freelancer,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            token,
            total_budget,
            status: ProjectStatus::Open,
            on_chain_id: None,
            funding_tx_id: None,
            milestones: milestones.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// The milestone for an ordinal.
    pub fn milestone(&self, ordinal: Ordinal) -> &Milestone {
        // Ordinals are validated 1-4 at construction and exactly 4
        // milestones exist, so this index is always in bounds.
        &self.milestones[(ordinal.as_u8() - 1) as usize]
    }

    /// Mutable access to the milestone for an ordinal.
    pub fn milestone_mut(&mut self, ordinal: Ordinal) -> &mut Milestone {
        &mut self.milestones[(ordinal.as_u8() - 1) as usize]
    }

    /// Record accepted funding: `Open → Active`, stamping the on-ledger
    /// identifier and funding transaction.
    pub fn mark_funded(
        &mut self,
        on_chain_id: OnChainProjectId,
        funding_tx_id: TxId,
        now: Timestamp,
    ) -> Result<(), StateError> {
        if self.status != ProjectStatus::Open {
            return Err(StateError::ProjectStatus {
                current: self.status,
                expected: ProjectStatus::Open,
            });
        }
        self.on_chain_id = Some(on_chain_id);
        self.funding_tx_id = Some(funding_tx_id);
        self.status = ProjectStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// Mark the project completed. Idempotent: marking a `Completed`
    /// project again is a no-op, so the all-4-approved check can be
    /// re-evaluated freely after every approval.
    pub fn mark_completed(&mut self, now: Timestamp) -> Result<(), StateError> {
        match self.status {
            ProjectStatus::Completed => Ok(()),
            ProjectStatus::Active => {
                self.status = ProjectStatus::Completed;
                self.updated_at = now;
                Ok(())
            }
            current => Err(StateError::ProjectStatus {
                current,
                expected: ProjectStatus::Active,
            }),
        }
    }

    /// Admin refunded the whole project (terminal).
    pub fn mark_refunded(&mut self, now: Timestamp) -> Result<(), StateError> {
        if self.status != ProjectStatus::Active {
            return Err(StateError::ProjectStatus {
                current: self.status,
                expected: ProjectStatus::Active,
            });
        }
        self.status = ProjectStatus::Refunded;
        self.updated_at = now;
        Ok(())
    }

    /// The status to display, overlaying `Disputed` when any ordinal has
    /// an open dispute and the project is otherwise `Active`.
    pub fn display_status(&self, open_dispute_count: usize) -> ProjectStatus {
        if self.status == ProjectStatus::Active && open_dispute_count > 0 {
            ProjectStatus::Disputed
        } else {
            self.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::new(s).unwrap()
    }

    fn quarter_milestones() -> [Milestone; 4] {
        Ordinal::ALL.map(|o| Milestone::new(o, format!("M{o}"), Amount::micro(25_000_000)))
    }

    fn make_project() -> Project {
        Project::new(
            addr("ST1CLIENT"),
            Some(addr("ST1FREELANCER")),
            "API build",
            "Four-stage build",
            "Development",
            TokenKind::Native,
            Amount::micro(100_000_000),
            quarter_milestones(),
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_project_is_open_with_no_chain_id() {
        let p = make_project();
        assert_eq!(p.status, ProjectStatus::Open);
        assert!(p.on_chain_id.is_none());
        assert!(p.funding_tx_id.is_none());
        assert_eq!(p.milestones.len(), 4);
    }

    #[test]
    fn test_budget_mismatch_rejected() {
        let err = Project::new(
            addr("ST1CLIENT"),
            None,
            "t",
            "d",
            "c",
            TokenKind::Native,
            Amount::micro(99),
            quarter_milestones(),
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, StateError::BudgetMismatch { .. }));
    }

    #[test]
    fn test_funding_sets_chain_id_and_activates() {
        let mut p = make_project();
        let now = Timestamp::parse("2026-01-15T13:00:00Z").unwrap();
        p.mark_funded(OnChainProjectId(7), TxId::accepted("0xfund"), now)
            .unwrap();
        assert_eq!(p.status, ProjectStatus::Active);
        assert_eq!(p.on_chain_id, Some(OnChainProjectId(7)));
        assert_eq!(p.updated_at, now);
    }

    #[test]
    fn test_double_funding_rejected() {
        let mut p = make_project();
        let now = Timestamp::now();
        p.mark_funded(OnChainProjectId(7), TxId::accepted("0xfund"), now)
            .unwrap();
        let err = p
            .mark_funded(OnChainProjectId(8), TxId::accepted("0xfund2"), now)
            .unwrap_err();
        assert!(matches!(err, StateError::ProjectStatus { .. }));
    }

    #[test]
    fn test_completion_is_idempotent() {
        let mut p = make_project();
        let now = Timestamp::now();
        p.mark_funded(OnChainProjectId(1), TxId::accepted("0xfund"), now)
            .unwrap();
        p.mark_completed(now).unwrap();
        assert_eq!(p.status, ProjectStatus::Completed);
        // Second completion is a no-op, not an error.
        p.mark_completed(now).unwrap();
        assert_eq!(p.status, ProjectStatus::Completed);
    }

    #[test]
    fn test_cannot_complete_open_project() {
        let mut p = make_project();
        assert!(p.mark_completed(Timestamp::now()).is_err());
    }

    #[test]
    fn test_display_status_overlays_disputed() {
        let mut p = make_project();
        p.mark_funded(OnChainProjectId(1), TxId::accepted("0xfund"), Timestamp::now())
            .unwrap();
        assert_eq!(p.display_status(0), ProjectStatus::Active);
        assert_eq!(p.display_status(1), ProjectStatus::Disputed);
    }

    #[test]
    fn test_milestone_lookup_by_ordinal() {
        let p = make_project();
        let o3 = Ordinal::new(3).unwrap();
        assert_eq!(p.milestone(o3).ordinal, o3);
    }
}
