//! # Core Error Type
//!
//! Validation errors raised by the foundational types. Domain-level error
//! taxonomies (conflict, authorization, ledger rejection) live in the crates
//! that own those concerns; this type only covers construction and parsing
//! of the primitives defined here.

use thiserror::Error;

/// Errors raised when constructing or parsing core types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A timestamp string failed validation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A monetary amount string failed validation.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A wallet address failed validation.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// A milestone ordinal was outside 1..=4.
    #[error("invalid milestone ordinal: {0} (must be 1-4)")]
    InvalidOrdinal(u8),
}
