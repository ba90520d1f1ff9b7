//! # esc-ledger — Ledger Gateway Abstraction
//!
//! The escrow contract on the external ledger is the source of truth for
//! fund movement. This crate defines the seam the rest of the stack talks
//! through: a trait over the contract's fixed operation set, returning
//! either a transaction identifier (accepted into the pending pool) or a
//! structured rejection.
//!
//! Acceptance is **not** finality. The gateway reports only that the
//! network took the transaction; confirmation is assumed eventually true
//! and never observed by this stack.
//!
//! The [`StubLedger`] implementation backs tests and local development:
//! deterministic transaction ids, sequential on-chain project ids, a call
//! log, and scriptable failure injection.

pub mod error;
pub mod gateway;
pub mod stub;

pub use error::LedgerError;
pub use gateway::{FundAcceptance, LedgerGateway};
pub use stub::{LedgerCall, StubLedger};
