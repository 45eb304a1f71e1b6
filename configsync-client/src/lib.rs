//! configsync client library exports.
//!
//! A client-side configuration cache with two update paths into one shared
//! store: pull-based fetches with TTL expiration for cold lookups, and
//! push-based live updates over a persistent WebSocket once the client has
//! handshaked. See [`client::ConfigClient`] for the entry point.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod realtime;
pub mod settings;
pub mod store;

pub use client::{ConfigClient, Mode};
pub use error::ClientError;
pub use fetcher::Fetcher;
pub use realtime::ChannelState;
pub use settings::{AuthSettings, ReconnectSettings, Settings, SettingsError};
pub use store::KeyStore;
