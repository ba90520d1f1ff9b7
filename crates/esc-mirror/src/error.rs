//! Mirror store errors.
//!
//! Store failures are infrastructure failures from the caller's point of
//! view — the engine maps every variant except `OpenDisputeExists` to a
//! retry-later response. `OpenDisputeExists` surfaces the one uniqueness
//! rule the store itself enforces (at most one open dispute per project
//! and ordinal), because only the store can enforce it atomically.

use thiserror::Error;

use esc_state::Ordinal;

/// Errors raised by mirror store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or the query failed.
    #[error("mirror store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded back into its entity.
    #[error("corrupt mirror row: {0}")]
    Corrupt(String),

    /// An open dispute already exists for this (project, ordinal) pair.
    #[error("an open dispute already exists for milestone {ordinal}")]
    OpenDisputeExists {
        /// The ordinal with the existing open dispute.
        ordinal: Ordinal,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
