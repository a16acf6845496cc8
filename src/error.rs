//! Error types for rule configuration.

use thiserror::Error;

/// Errors surfaced while merging rules. Scanning itself never errors; runtime
/// trouble is reported through [`MaskOutcome`](crate::MaskOutcome) instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// A rule key contained a byte outside the key-legal ASCII set (letters,
    /// digits, `-`, `_`, `@`), used `*` anywhere but the first or last byte,
    /// or stripped down to an empty stem.
    #[error("invalid key '{key}'")]
    InvalidKey {
        /// The offending key, exactly as supplied.
        key: String,
    },
}
