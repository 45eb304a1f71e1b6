//! Wire types for the pull endpoint and the live channel.
//!
//! These mirror the upstream service's JSON shapes exactly; do not "fix"
//! the doubly-nested update payload, it is part of the wire protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of a successful pull response:
/// `{"data": {"<key>": {"value": ..., "ttl": <seconds>}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueResponse {
    pub data: HashMap<String, ValueEntry>,
}

/// One returned key: the value plus its freshness window in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub value: String,
    pub ttl: i64,
}

/// Frames the client sends on the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Sent once, immediately after the connection opens. Fire-and-forget;
    /// no acknowledgment is expected.
    #[serde(rename_all = "camelCase")]
    Handshake { api_key: String },
}

/// Frames the server sends on the live channel.
///
/// Unknown frame types deserialize to [`ServerFrame::Other`] so new
/// server-side frames never break older clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    ConfigUpdate { payload: UpdateEnvelope },
    #[serde(other)]
    Other,
}

/// Outer envelope of a config update. Both nesting levels are named
/// `payload` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEnvelope {
    pub payload: KeyUpdate,
}

/// The key/value pair carried by a config update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyUpdate {
    pub key: String,
    pub value: String,
}
