//! Error types for configsync operations.

use thiserror::Error;

/// Pull endpoint failures.
///
/// Kept `Clone + PartialEq` with string reasons so the core types stay
/// independent of any particular HTTP client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport failure talking to the value endpoint: {reason}")]
    Transport { reason: String },

    #[error("Value endpoint returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Failed to decode value response: {reason}")]
    Decode { reason: String },
}

/// Errors surfaced to callers of a key lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Config key not found: {key}")]
    NotFound { key: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl LookupError {
    /// Convenience constructor for the common miss case.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }
}
