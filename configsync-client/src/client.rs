//! Client façade tying the store, fetcher, and live channel together.

use crate::error::ClientError;
use crate::fetcher::Fetcher;
use crate::realtime::{spawn_live_channel, ChannelState, LiveChannel};
use crate::settings::Settings;
use crate::store::KeyStore;
use configsync_core::{FetchError, LookupError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lookup dispatch mode. Flips from `Pull` to `Live` exactly once, when
/// initialization completes, and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Cache misses trigger a synchronous fetch.
    Pull,
    /// Lookups are served purely from the cache; the live channel keeps it
    /// current.
    Live,
}

/// A client-side configuration cache.
///
/// Owns the key store and both update paths into it. Construct with
/// [`ConfigClient::new`], then call [`ConfigClient::initialize`] once; the
/// client is usable before and during initialization in pull mode.
pub struct ConfigClient {
    settings: Settings,
    store: KeyStore,
    fetcher: Fetcher,
    live_mode: AtomicBool,
    // Moved into the live channel when it is spawned.
    state_tx: Mutex<Option<watch::Sender<ChannelState>>>,
    state_rx: watch::Receiver<ChannelState>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    live_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConfigClient {
    /// Build a client from settings. Validates them; no network activity.
    pub fn new(settings: Settings) -> Result<Self, ClientError> {
        settings.validate()?;
        let store = KeyStore::new();
        let fetcher = Fetcher::new(&settings, store.clone())?;
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            settings,
            store,
            fetcher,
            live_mode: AtomicBool::new(false),
            state_tx: Mutex::new(Some(state_tx)),
            state_rx,
            shutdown_tx,
            shutdown_rx,
            live_task: Mutex::new(None),
        })
    }

    /// Preload the configured keys, start the live channel, and flip to
    /// live mode. One-shot; later calls are no-ops.
    ///
    /// Without an API key this degrades deliberately: no preload, no live
    /// channel, and every subsequent lookup fails with `NotFound` instead
    /// of the client erroring at startup.
    pub async fn initialize(&self) -> Result<(), FetchError> {
        if self.live_mode.load(Ordering::Acquire) {
            return Ok(());
        }

        let Some(api_key) = self.settings.auth.api_key.clone() else {
            warn!("No API key configured; every lookup will fail until one is provided");
            self.live_mode.store(true, Ordering::Release);
            return Ok(());
        };

        self.fetcher
            .fetch_batch(&self.settings.preload_keys, false)
            .await?;

        // The sender is taken exactly once, so a racing second initialize
        // cannot spawn a second channel.
        let state_tx = self
            .state_tx
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .take();
        if let Some(state_tx) = state_tx {
            let channel = LiveChannel::new(
                &self.settings,
                api_key,
                self.store.clone(),
                self.fetcher.clone(),
                state_tx,
                self.shutdown_rx.clone(),
            );
            let handle = spawn_live_channel(channel);
            *self
                .live_task
                .lock()
                .unwrap_or_else(|err| err.into_inner()) = Some(handle);
        }

        self.live_mode.store(true, Ordering::Release);
        info!(preloaded = self.store.len(), "Client initialized in live mode");
        Ok(())
    }

    /// Look up a configuration value.
    ///
    /// In live mode this is a pure cache read and never touches the
    /// network. In pull mode (including before [`Self::initialize`]
    /// completes) a cache miss or expired entry triggers a synchronous
    /// fetch awaited on the caller's task; wrap the call with your own
    /// timeout if the transport's is not enough.
    pub async fn get(&self, key: &str) -> Result<String, LookupError> {
        if self.mode() == Mode::Pull {
            let keys = [key.to_string()];
            self.fetcher.fetch_batch(&keys, true).await?;
        }
        match self.store.get(key) {
            Some(entry) => Ok(entry.value),
            None => Err(LookupError::not_found(key)),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.live_mode.load(Ordering::Acquire) {
            Mode::Live
        } else {
            Mode::Pull
        }
    }

    /// Watch the live channel's connection state.
    pub fn live_state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Stop the live channel task and wait for it to exit.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self
            .live_task
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "Live channel task ended abnormally");
            }
        }
    }
}
