//! Cache entries and their freshness semantics.

use crate::Timestamp;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// A single cached configuration value.
///
/// Entries written by the pull path carry an absolute expiration deadline
/// derived from the server-supplied TTL. Entries written by the push path
/// carry no deadline: a pushed value is authoritative until superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The configuration value.
    pub value: String,
    /// Absolute expiration deadline. `None` never expires.
    pub expires_at: Option<Timestamp>,
}

impl CacheEntry {
    /// Entry from a pull response: expires `ttl_seconds` after `now`.
    ///
    /// A TTL whose deadline cannot be represented degrades to
    /// never-expiring rather than panicking.
    pub fn from_pull(value: impl Into<String>, ttl_seconds: i64, now: Timestamp) -> Self {
        let expires_at =
            Duration::try_seconds(ttl_seconds).and_then(|ttl| now.checked_add_signed(ttl));
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Entry from a live-channel update. Never expires.
    pub fn from_push(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// True when the entry's deadline is strictly before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self.expires_at {
            Some(deadline) => deadline < now,
            None => false,
        }
    }
}
