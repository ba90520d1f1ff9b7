//! # Disputes
//!
//! One row per filed dispute on a (project, ordinal) pair. At most one
//! `Open` dispute may exist per pair at a time — the store enforces the
//! uniqueness, this module enforces the row lifecycle:
//!
//! ```text
//! Open ──resolve()──▶ Resolved
//!   │
//!   └───reset()────▶ Reset
//! ```
//!
//! Filing requires an accepted ledger transaction (the engine runs the
//! ledger-then-mirror saga); a `Dispute` row therefore always carries a
//! real `dispute_tx_id`. Resolution records the administrator, resolution
//! text, settlement transaction and timestamp for audit.

use serde::{Deserialize, Serialize};

use esc_core::{AdminId, DisputeId, ProjectId, Timestamp, TxId, WalletAddress};

use crate::error::StateError;
use crate::milestone::Ordinal;

/// The lifecycle status of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeStatus {
    /// Filed and blocking the ordinal's normal handshake.
    Open,
    /// Admin closed it with a settlement action (terminal).
    Resolved,
    /// Admin closed it restoring the underlying state (terminal).
    Reset,
}

impl DisputeStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Resolved => "RESOLVED",
            Self::Reset => "RESET",
        }
    }

    /// Parse a canonical status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "RESOLVED" => Some(Self::Resolved),
            "RESET" => Some(Self::Reset),
            _ => None,
        }
    }

    /// Whether this status is terminal.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Resolved | Self::Reset)
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filed dispute on one milestone ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Row identifier.
    pub id: DisputeId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Disputed milestone ordinal.
    pub ordinal: Ordinal,
    /// Why the dispute was filed.
    pub reason: String,
    /// Optional supporting evidence reference.
    pub evidence_url: Option<String>,
    /// Who filed (client or freelancer of the project).
    pub filed_by: WalletAddress,
    /// The accepted ledger file-dispute transaction.
    pub dispute_tx_id: TxId,
    /// Lifecycle status.
    pub status: DisputeStatus,
    /// Admin resolution text, set on close.
    pub resolution: Option<String>,
    /// The resolving administrator.
    pub resolved_by: Option<AdminId>,
    /// The settlement transaction recorded at close.
    pub resolution_tx_id: Option<TxId>,
    /// When the dispute was closed.
    pub resolved_at: Option<Timestamp>,
    /// When the dispute was filed.
    pub filed_at: Timestamp,
}

impl Dispute {
    /// Create an `Open` dispute row from an accepted filing.
    pub fn file(
        project_id: ProjectId,
        ordinal: Ordinal,
        reason: impl Into<String>,
        evidence_url: Option<String>,
        filed_by: WalletAddress,
        dispute_tx_id: TxId,
        now: Timestamp,
    ) -> Self {
        Self {
            id: DisputeId::new(),
            project_id,
            ordinal,
            reason: reason.into(),
            evidence_url,
            filed_by,
            dispute_tx_id,
            status: DisputeStatus::Open,
            resolution: None,
            resolved_by: None,
            resolution_tx_id: None,
            resolved_at: None,
            filed_at: now,
        }
    }

    /// Close as `Resolved`, recording the settlement.
    ///
    /// The settlement action (force-release or force-refund) is recorded
    /// separately with the same administrator and timestamp; the two
    /// writes share this resolution data for auditability.
    pub fn resolve(
        &mut self,
        admin: AdminId,
        resolution: impl Into<String>,
        resolution_tx_id: TxId,
        now: Timestamp,
    ) -> Result<(), StateError> {
        self.require_open()?;
        self.status = DisputeStatus::Resolved;
        self.resolution = Some(resolution.into());
        self.resolved_by = Some(admin);
        self.resolution_tx_id = Some(resolution_tx_id);
        self.resolved_at = Some(now);
        Ok(())
    }

    /// Close as `Reset`: the dispute is withdrawn and the underlying
    /// milestone state re-emerges unchanged.
    pub fn reset(
        &mut self,
        admin: AdminId,
        resolution: impl Into<String>,
        resolution_tx_id: TxId,
        now: Timestamp,
    ) -> Result<(), StateError> {
        self.require_open()?;
        self.status = DisputeStatus::Reset;
        self.resolution = Some(resolution.into());
        self.resolved_by = Some(admin);
        self.resolution_tx_id = Some(resolution_tx_id);
        self.resolved_at = Some(now);
        Ok(())
    }

    fn require_open(&self) -> Result<(), StateError> {
        if self.status.is_closed() {
            return Err(StateError::DisputeClosed {
                status: self.status.as_str().to_string(),
            });
        }
        Ok(())
    }
}
