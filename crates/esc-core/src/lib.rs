//! # esc-core — Foundational Types for the Escrow Stack
//!
//! The bedrock of the Escrow Stack. Defines the type-system primitives that
//! every other crate in the workspace depends on; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `ProjectId`, `SubmissionId`,
//!    `DisputeId`, `WalletAddress`, `TxId` — all newtypes. No bare strings or
//!    UUIDs crossing crate boundaries.
//!
//! 2. **Named absence over nullable primitives.** "No completion transaction
//!    yet" is `Option<TxId>`, never an empty string. Recovery-marker
//!    transaction ids are a distinct, inspectable construction of `TxId`.
//!
//! 3. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision, so mirror rows order deterministically.
//!
//! 4. **Micro-unit integer amounts.** Monetary values are integer micro-units
//!    of a closed `TokenKind` set. No floating point anywhere near funds.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `esc-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod actor;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod token;

// Re-export primary types for ergonomic imports.
pub use actor::{AdminId, Caller, Role};
pub use error::CoreError;
pub use identity::{DisputeId, OnChainProjectId, ProjectId, SubmissionId, TxId, WalletAddress};
pub use temporal::Timestamp;
pub use token::{Amount, TokenKind};
