//! # Deterministic In-Process Ledger
//!
//! A [`LedgerGateway`] implementation for tests and local development.
//! Transaction ids are sequential and deterministic, every call is
//! recorded in an inspectable log, and individual failures can be
//! scripted ahead of the calls they should reject.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use esc_core::{Amount, OnChainProjectId, TokenKind, TxId, WalletAddress};
use esc_state::{Ordinal, MILESTONE_COUNT};

use crate::error::LedgerError;
use crate::gateway::{FundAcceptance, LedgerGateway};

/// One recorded gateway invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Fund {
        client: WalletAddress,
        freelancer: WalletAddress,
        token: TokenKind,
        total: Amount,
    },
    Complete {
        project: OnChainProjectId,
        ordinal: Ordinal,
    },
    Release {
        project: OnChainProjectId,
        ordinal: Ordinal,
    },
    FileDispute {
        project: OnChainProjectId,
        ordinal: Ordinal,
    },
    ForceRelease {
        project: OnChainProjectId,
        ordinal: Ordinal,
    },
    ForceRefund {
        project: OnChainProjectId,
        ordinal: Ordinal,
    },
    RefundProject {
        project: OnChainProjectId,
    },
    ResolveDispute {
        project: OnChainProjectId,
        ordinal: Ordinal,
    },
}

#[derive(Debug, Default)]
struct Inner {
    next_chain_id: u64,
    next_tx: u64,
    calls: Vec<LedgerCall>,
    scripted_failures: VecDeque<LedgerError>,
}

/// In-process ledger stub with a call log and scriptable failures.
///
/// Failures are consumed in FIFO order: each queued error rejects the
/// next gateway call, whatever it is. The rejected call is still
/// recorded in the log.
#[derive(Debug, Default)]
pub struct StubLedger {
    inner: Mutex<Inner>,
}

impl StubLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error that will reject the next gateway call.
    pub fn fail_next(&self, err: LedgerError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.scripted_failures.push_back(err);
        }
    }

    /// Snapshot of every call made so far, in order.
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.inner
            .lock()
            .map(|inner| inner.calls.clone())
            .unwrap_or_default()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.calls.len()).unwrap_or(0)
    }

    fn record(&self, call: LedgerCall) -> Result<TxId, LedgerError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| LedgerError::Unreachable("stub ledger poisoned".to_string()))?;
        inner.calls.push(call);
        if let Some(err) = inner.scripted_failures.pop_front() {
            return Err(err);
        }
        inner.next_tx += 1;
        Ok(TxId::accepted(format!("stub-tx-{:04}", inner.next_tx)))
    }
}

#[async_trait]
impl LedgerGateway for StubLedger {
    async fn fund(
        &self,
        client: &WalletAddress,
        freelancer: &WalletAddress,
        token: TokenKind,
        milestone_amounts: [Amount; MILESTONE_COUNT],
    ) -> Result<FundAcceptance, LedgerError> {
        let total = Amount::checked_sum(&milestone_amounts)
            .ok_or_else(|| LedgerError::Rejected {
                code: 1,
                reason: "budget overflow".to_string(),
            })?;
        let tx_id = self.record(LedgerCall::Fund {
            client: client.clone(),
            freelancer: freelancer.clone(),
            token,
            total,
        })?;
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| LedgerError::Unreachable("stub ledger poisoned".to_string()))?;
        inner.next_chain_id += 1;
        Ok(FundAcceptance {
            tx_id,
            on_chain_id: OnChainProjectId(inner.next_chain_id),
        })
    }

    async fn complete(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError> {
        self.record(LedgerCall::Complete { project, ordinal })
    }

    async fn release(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError> {
        self.record(LedgerCall::Release { project, ordinal })
    }

    async fn file_dispute(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError> {
        self.record(LedgerCall::FileDispute { project, ordinal })
    }

    async fn force_release(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError> {
        self.record(LedgerCall::ForceRelease { project, ordinal })
    }

    async fn force_refund(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError> {
        self.record(LedgerCall::ForceRefund { project, ordinal })
    }

    async fn refund_project(&self, project: OnChainProjectId) -> Result<TxId, LedgerError> {
        self.record(LedgerCall::RefundProject { project })
    }

    async fn resolve_dispute(
        &self,
        project: OnChainProjectId,
        ordinal: Ordinal,
    ) -> Result<TxId, LedgerError> {
        self.record(LedgerCall::ResolveDispute { project, ordinal })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(s: &str) -> WalletAddress {
        WalletAddress::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_tx_ids_are_sequential_and_deterministic() {
        let ledger = StubLedger::new();
        let chain = OnChainProjectId(1);
        let tx1 = ledger.complete(chain, Ordinal::new(1).unwrap()).await.unwrap();
        let tx2 = ledger.release(chain, Ordinal::new(1).unwrap()).await.unwrap();
        assert_eq!(tx1.as_str(), "stub-tx-0001");
        assert_eq!(tx2.as_str(), "stub-tx-0002");
    }

    #[tokio::test]
    async fn test_fund_assigns_sequential_chain_ids() {
        let ledger = StubLedger::new();
        let amounts = [Amount(250_000); MILESTONE_COUNT];
        let a = ledger
            .fund(&wallet("client-a"), &wallet("dev-a"), TokenKind::Native, amounts)
            .await
            .unwrap();
        let b = ledger
            .fund(&wallet("client-b"), &wallet("dev-b"), TokenKind::Asset, amounts)
            .await
            .unwrap();
        assert_eq!(a.on_chain_id, OnChainProjectId(1));
        assert_eq!(b.on_chain_id, OnChainProjectId(2));
    }

    #[tokio::test]
    async fn test_scripted_failure_rejects_next_call_only() {
        let ledger = StubLedger::new();
        let chain = OnChainProjectId(3);
        ledger.fail_next(LedgerError::AlreadyComplete);

        let first = ledger.complete(chain, Ordinal::new(2).unwrap()).await;
        assert_eq!(first, Err(LedgerError::AlreadyComplete));

        let second = ledger.complete(chain, Ordinal::new(2).unwrap()).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_calls_are_still_logged() {
        let ledger = StubLedger::new();
        let chain = OnChainProjectId(9);
        ledger.fail_next(LedgerError::Unreachable("node down".to_string()));
        let _ = ledger.force_refund(chain, Ordinal::new(4).unwrap()).await;
        assert_eq!(ledger.call_count(), 1);
        assert_eq!(
            ledger.calls()[0],
            LedgerCall::ForceRefund {
                project: chain,
                ordinal: Ordinal::new(4).unwrap()
            }
        );
    }
}
