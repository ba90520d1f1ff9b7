//! # Ledger Gateway Trait
//!
//! The fixed operation set of the escrow contract. Wallet signing and
//! broadcast live behind implementations of this trait; the wire format
//! is the contract ABI and out of scope here.
//!
//! Calls are network-bound and may take seconds to minutes to be accepted
//! into the pending pool — this is the only suspension point in the stack
//! besides the mirror store itself.

use async_trait::async_trait;

use esc_core::{Amount, OnChainProjectId, TokenKind, TxId, WalletAddress};
use esc_state::{Ordinal, MILESTONE_COUNT};

use crate::error::LedgerError;

/// Result of an accepted funding call: the contract assigns the
/// on-ledger project identifier when it takes custody of the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundAcceptance {
    /// The accepted funding transaction.
    pub tx_id: TxId,
    /// The on-ledger project identifier assigned by the contract.
    pub on_chain_id: OnChainProjectId,
}

/// The escrow contract's operation set.
///
/// Every method returns either an accepted transaction id or a
/// [`LedgerError`]. Implementations must not retry internally — retry
/// policy belongs to the reconciliation engine, which knows which
/// rejections are recoverable.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Fund a project's escrow with the four milestone amounts.
    async fn fund(
        &self,
        client: &WalletAddress,
        freelancer: &WalletAddress,
        token: TokenKind,
        milestone_amounts: [Amount; MILESTONE_COUNT],
    ) -> Result<FundAcceptance, LedgerError>;

    /// Freelancer marks a milestone complete on-ledger.
    ///
    /// May fail with [`LedgerError::AlreadyComplete`] when the contract
    /// already holds a completion for this ordinal.
    async fn complete(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError>;

    /// Client releases the escrowed amount for a completed milestone.
    async fn release(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError>;

    /// File a dispute on a milestone.
    async fn file_dispute(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError>;

    /// Admin: release a milestone without client approval.
    async fn force_release(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError>;

    /// Admin: refund a milestone's escrowed amount to the client.
    async fn force_refund(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError>;

    /// Admin: refund the entire remaining escrow to the client.
    async fn refund_project(&self, project: OnChainProjectId) -> Result<TxId, LedgerError>;

    /// Admin: record a dispute settlement on-ledger.
    async fn resolve_dispute(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError>;
}
