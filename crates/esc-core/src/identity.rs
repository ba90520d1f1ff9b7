//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the Escrow Stack.
//! These prevent accidental identifier confusion — you cannot pass a
//! `SubmissionId` where a `DisputeId` is expected.
//!
//! ## Security Invariant
//!
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion where one kind of identifier is substituted
//! for another, e.g. releasing against a dispute id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for an escrow project in the mirror store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

/// Unique identifier for a milestone submission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

/// Unique identifier for a dispute row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisputeId(pub Uuid);

impl ProjectId {
    /// Generate a new random project identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl SubmissionId {
    /// Generate a new random submission identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl DisputeId {
    /// Generate a new random dispute identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for DisputeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "project:{}", self.0)
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "submission:{}", self.0)
    }
}

impl std::fmt::Display for DisputeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispute:{}", self.0)
    }
}

// ─── Ledger-Side Identifiers ─────────────────────────────────────────

/// The numeric project identifier assigned by the escrow contract when
/// the funding transaction is accepted.
///
/// Distinct from [`ProjectId`]: the mirror row exists before funding,
/// the on-ledger identifier only after. A project in `OPEN` status has
/// no on-ledger identifier by invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OnChainProjectId(pub u64);

impl std::fmt::Display for OnChainProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

/// A wallet address identifying a client or freelancer.
///
/// Opaque to the core — signature verification happens wallet-side,
/// outside this system. Construction rejects empty and whitespace-only
/// strings so an address can never silently mean "nobody".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Create a wallet address, rejecting empty input.
    pub fn new(addr: impl Into<String>) -> Result<Self, CoreError> {
        let addr = addr.into();
        if addr.trim().is_empty() {
            return Err(CoreError::InvalidAddress(
                "address must be non-empty".to_string(),
            ));
        }
        Ok(Self(addr))
    }

    /// The address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Transaction Identifiers ─────────────────────────────────────────

/// A ledger transaction identifier.
///
/// Two constructions exist:
///
/// - [`TxId::accepted`] — an identifier returned by the ledger gateway
///   when a transaction enters the pending pool. Acceptance is not
///   finality; finality is assumed eventually true and never observed
///   by this core.
/// - [`TxId::recovered`] — a synthesized marker recorded when the
///   ledger rejects a "complete" call as already complete, meaning the
///   transfer happened in a session the mirror never recorded. Markers
///   are visibly distinct (`recovered:` prefix) so audits can tell them
///   apart from real transaction ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(String);

impl TxId {
    /// Wrap a transaction identifier returned by the ledger.
    pub fn accepted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Synthesize a recovery marker for an on-ledger transfer the
    /// mirror never recorded.
    pub fn recovered(project: OnChainProjectId, ordinal: u8) -> Self {
        Self(format!("recovered:{}:{}", project.0, ordinal))
    }

    /// Whether this id is a synthesized recovery marker rather than a
    /// real ledger transaction id.
    pub fn is_recovery_marker(&self) -> bool {
        self.0.starts_with("recovered:")
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
