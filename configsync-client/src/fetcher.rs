//! Batched pull requests against the value endpoint.

use crate::settings::Settings;
use crate::store::KeyStore;
use chrono::Utc;
use configsync_core::{CacheEntry, FetchError, ValueResponse};
use std::time::Duration;
use tracing::debug;

const LIB_VERSION_HEADER: &str = "X-Lib-Version";
const LIB_VERSION: &str = concat!("configsync-rust/", env!("CARGO_PKG_VERSION"));

/// HTTP fetcher for the pull path.
///
/// The only component that talks to the value endpoint. Called with
/// `respect_ttl = false` for the startup preload and the post-reconnect
/// resync, and with `respect_ttl = true` for lazy single-key fetches in
/// pull mode.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    value_url: String,
    api_key: Option<String>,
    store: KeyStore,
}

impl Fetcher {
    pub fn new(settings: &Settings, store: KeyStore) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|err| FetchError::Transport {
                reason: err.to_string(),
            })?;
        Ok(Self {
            client,
            value_url: settings.value_url.clone(),
            api_key: settings.auth.api_key.clone(),
            store,
        })
    }

    /// Fetch `keys` from the value endpoint and store the results.
    ///
    /// With `respect_ttl`, keys whose cached entry is still fresh are
    /// filtered out first; an empty remainder is a no-op without a network
    /// call. The store is only written after the whole response decodes,
    /// so a failed batch leaves every existing entry untouched.
    pub async fn fetch_batch(&self, keys: &[String], respect_ttl: bool) -> Result<(), FetchError> {
        let now = Utc::now();
        let keys_to_fetch: Vec<&String> = if respect_ttl {
            keys.iter()
                .filter(|key| {
                    self.store
                        .get(key)
                        .map_or(true, |entry| entry.is_expired_at(now))
                })
                .collect()
        } else {
            keys.iter().collect()
        };

        if keys_to_fetch.is_empty() {
            debug!(requested = keys.len(), "All keys fresh, skipping fetch");
            return Ok(());
        }

        let query: Vec<(&str, &str)> = keys_to_fetch
            .iter()
            .map(|key| ("keys[]", key.as_str()))
            .collect();
        let mut request = self
            .client
            .get(&self.value_url)
            .query(&query)
            .header(LIB_VERSION_HEADER, LIB_VERSION);
        if let Some(api_key) = &self.api_key {
            request = request.basic_auth(api_key, Some(""));
        }

        let response = request.send().await.map_err(|err| FetchError::Transport {
            reason: err.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| FetchError::Transport {
            reason: err.to_string(),
        })?;
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: ValueResponse =
            serde_json::from_str(&body).map_err(|err| FetchError::Decode {
                reason: err.to_string(),
            })?;

        debug!(
            requested = keys_to_fetch.len(),
            returned = decoded.data.len(),
            "Fetched value batch"
        );
        for (key, entry) in decoded.data {
            self.store
                .set(key, CacheEntry::from_pull(entry.value, entry.ttl, now));
        }
        Ok(())
    }
}
