//! # esc-mirror — Durable Off-Ledger State
//!
//! The mirror is the off-ledger database this service owns: project rows,
//! append-only submission rows, and dispute rows. The ledger remains the
//! source of truth for custody; the mirror is the source of truth for
//! everything the contract does not store (titles, deliverable URLs,
//! dispute reasons, review history).
//!
//! Two backends implement the [`MirrorStore`] trait:
//!
//! - [`MemoryStore`] — in-process maps for development and tests.
//! - [`PgStore`] — PostgreSQL via SQLx with embedded migrations.
//!
//! The trait is the unit of substitution: the reconciliation engine only
//! ever sees `Arc<dyn MirrorStore>`.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{MirrorCounts, MirrorStore, ReviewOutcome};
