//! # Ledger Outcome Model
//!
//! Every gateway call either yields a transaction id or one of these
//! rejections. `AlreadyComplete` is the single recoverable code: the
//! contract's own state says the ordinal is finalized, from a session the
//! mirror never recorded — the reconciliation engine absorbs it instead
//! of surfacing a failure.

use thiserror::Error;

/// A terminal or recoverable rejection from the ledger gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The contract reports this ordinal as already finalized. The one
    /// recoverable code — the engine synthesizes a recovery marker and
    /// proceeds as if the call had been accepted.
    #[error("ledger reports milestone already complete")]
    AlreadyComplete,

    /// The contract rejected the call with a coded reason.
    #[error("ledger rejected the transaction (code {code}): {reason}")]
    Rejected {
        /// Contract error code.
        code: u32,
        /// Human-readable reason.
        reason: String,
    },

    /// The signer cancelled wallet-side before broadcast. Treated
    /// identically to a rejection: mirror untouched, no automatic retry.
    #[error("transaction cancelled by signer")]
    Cancelled,

    /// The gateway could not reach the network.
    #[error("ledger unreachable: {0}")]
    Unreachable(String),
}

impl LedgerError {
    /// Whether the reconciliation engine can absorb this rejection.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AlreadyComplete)
    }
}
