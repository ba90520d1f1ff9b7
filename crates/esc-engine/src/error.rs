//! Engine error taxonomy.
//!
//! Four failure families with different caller contracts:
//!
//! - `State` — the request is legal in general but not from the current
//!   state (or the role may never make it). Recoverable by re-fetching.
//! - `Authorization` — the caller is not a participant of the project.
//! - `Ledger` — the contract rejected or could not be reached. Only
//!   `AlreadyComplete` is absorbed by the engine (recovery path); every
//!   other rejection surfaces here.
//! - `Store` — mirror infrastructure failure; retry later.

use thiserror::Error;

use esc_core::CoreError;
use esc_ledger::LedgerError;
use esc_mirror::StoreError;
use esc_state::StateError;

/// Errors surfaced by engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Illegal transition or broken entity invariant.
    #[error(transparent)]
    State(StateError),

    /// The caller is not authorized to act on this project.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// The ledger rejected the transaction or was unreachable.
    #[error("ledger: {0}")]
    Ledger(LedgerError),

    /// The mirror store failed.
    #[error("mirror store: {0}")]
    Store(StoreError),

    /// The requested entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The request payload is malformed.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl From<StateError> for EngineError {
    fn from(err: StateError) -> Self {
        EngineError::State(err)
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            // The store-enforced uniqueness rule is a state conflict from
            // the caller's point of view, not an infrastructure failure.
            StoreError::OpenDisputeExists { ordinal } => {
                EngineError::State(StateError::DisputeAlreadyOpen { ordinal })
            }
            other => EngineError::Store(other),
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        EngineError::Ledger(err)
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        EngineError::Validation(err.to_string())
    }
}
