//! Identifier and clock capabilities.
//!
//! Medex stamps every generated resource with a *canonical* identifier:
//! **32 lowercase hexadecimal characters** (no hyphens), the same value you
//! would get from `Uuid::new_v4().simple().to_string()`.
//!
//! This crate provides:
//! - A small wrapper type ([`CanonicalId`]) that *guarantees* the canonical
//!   format once constructed.
//! - The [`IdGenerator`] and [`Clock`] traits: fresh-identifier generation and
//!   current-time reads are capabilities handed to the transformer rather than
//!   ambient global calls, so tests can substitute fixed values and make
//!   document assembly fully deterministic.
//!
//! ## Canonical identifier form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are
//! rejected by [`CanonicalId::parse`].

mod service;

// Re-export public types
pub use service::{
    CanonicalId, Clock, FixedClock, IdGenerator, SequenceIds, SystemClock, Uuid, UuidIds,
};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
