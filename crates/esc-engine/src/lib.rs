//! # esc-engine — The Reconciliation Engine
//!
//! Coordinates every write across the trust boundary between the ledger
//! (source of truth for custody) and the mirror (source of truth for
//! everything else). The invariant all write paths share:
//!
//! ```text
//! validate ──▶ ledger call ──▶ mirror write
//! ```
//!
//! The mirror is only written after the ledger accepted the transaction,
//! so the mirror can lag the ledger but never contradict it. The one
//! place the two can still drift — a completion accepted on-ledger in a
//! session whose mirror write was lost — has a dedicated recovery path
//! in [`Engine::submit_milestone`].
//!
//! ## Design Decision: No Internal Retries
//!
//! A rejected ledger call surfaces to the caller as an error; the engine
//! never retries on its own. Retrying a custody operation without the
//! caller's knowledge risks double-spending escrow; re-submitting after
//! an explicit error is recoverable precisely because every path here is
//! idempotent against state that already advanced.

pub mod engine;
pub mod error;
pub mod refresh;
pub mod view;

pub use engine::{
    Engine, MilestoneDraft, NewProject, ReviewDecision, Settlement, ABANDONED_AFTER_DAYS,
};
pub use error::EngineError;
pub use refresh::{
    subscribe, watch_project, ProjectSnapshot, RefreshHandle, Snapshot, DEFAULT_REFRESH_INTERVAL,
};
pub use view::{MilestoneView, ProjectView};
