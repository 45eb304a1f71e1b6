//! WebSocket live channel with reconnect backoff.
//!
//! One background task owns the connection for the client's lifetime:
//! connect, handshake, resync, then stream inbound updates into the key
//! store until the connection drops, and start over. Failures here are
//! never surfaced to lookup callers; they are logged and retried.

use crate::fetcher::Fetcher;
use crate::settings::{ReconnectSettings, Settings};
use crate::store::KeyStore;
use configsync_core::{CacheEntry, ClientFrame, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle states, published on a watch channel for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Handshaking,
    Streaming,
    /// Shutdown was requested and the task has exited.
    Stopped,
}

enum ConnectionEnd {
    Closed,
    Shutdown,
}

/// One persistent streaming connection into the key store.
pub struct LiveChannel {
    stream_url: String,
    api_key: String,
    store: KeyStore,
    fetcher: Fetcher,
    reconnect: ReconnectSettings,
    keepalive: Duration,
    state_tx: watch::Sender<ChannelState>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Run a [`LiveChannel`] on its own task.
pub fn spawn_live_channel(channel: LiveChannel) -> JoinHandle<()> {
    tokio::spawn(channel.run())
}

impl LiveChannel {
    pub fn new(
        settings: &Settings,
        api_key: String,
        store: KeyStore,
        fetcher: Fetcher,
        state_tx: watch::Sender<ChannelState>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            stream_url: settings.stream_url.clone(),
            api_key,
            store,
            fetcher,
            reconnect: settings.reconnect.clone(),
            keepalive: Duration::from_millis(settings.keepalive_interval_ms),
            state_tx,
            shutdown_rx,
        }
    }

    async fn run(mut self) {
        let mut backoff = self.reconnect.initial_ms;
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            self.set_state(ChannelState::Connecting);
            match tokio_tungstenite::connect_async(self.stream_url.as_str()).await {
                Ok((stream, _)) => {
                    backoff = self.reconnect.initial_ms;
                    match self.serve_connection(stream).await {
                        ConnectionEnd::Shutdown => break,
                        ConnectionEnd::Closed => {}
                    }
                }
                Err(err) => {
                    warn!(error = %err, url = %self.stream_url, "Live channel connect failed");
                }
            }
            self.set_state(ChannelState::Disconnected);

            let delay = jittered_backoff(backoff, self.reconnect.jitter_ms);
            debug!(delay_ms = delay, "Reconnecting after backoff");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
            backoff = next_backoff(backoff, &self.reconnect);
        }
        self.set_state(ChannelState::Stopped);
        info!("Live channel stopped");
    }

    async fn serve_connection(&mut self, mut stream: WsStream) -> ConnectionEnd {
        self.set_state(ChannelState::Handshaking);
        let handshake = ClientFrame::Handshake {
            api_key: self.api_key.clone(),
        };
        let frame = match serde_json::to_string(&handshake) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "Failed to encode handshake");
                return ConnectionEnd::Closed;
            }
        };
        // Fire-and-forget: no acknowledgment precedes streaming.
        if let Err(err) = stream.send(Message::Text(frame)).await {
            warn!(error = %err, "Handshake send failed");
            return ConnectionEnd::Closed;
        }
        info!("Live channel connected");
        self.set_state(ChannelState::Streaming);

        // The channel does not replay updates missed while disconnected, so
        // bound the staleness window by refreshing everything the store
        // already holds.
        let known = self.store.known_keys();
        if !known.is_empty() {
            if let Err(err) = self.fetcher.fetch_batch(&known, false).await {
                warn!(error = %err, keys = known.len(), "Post-connect resync failed");
            }
        }

        let mut keepalive = interval_at(Instant::now() + self.keepalive, self.keepalive);
        loop {
            tokio::select! {
                message = stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                        Some(Ok(Message::Close(_))) => {
                            info!("Live channel closed by remote");
                            return ConnectionEnd::Closed;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(error = %err, "Live channel read failed");
                            return ConnectionEnd::Closed;
                        }
                        None => {
                            info!("Live channel stream ended");
                            return ConnectionEnd::Closed;
                        }
                    }
                }
                _ = keepalive.tick() => {
                    if let Err(err) = stream.send(Message::Ping(Vec::new())).await {
                        warn!(error = %err, "Keepalive ping failed");
                        return ConnectionEnd::Closed;
                    }
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        let _ = stream.close(None).await;
                        return ConnectionEnd::Shutdown;
                    }
                }
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        match serde_json::from_str::<ServerFrame>(text) {
            Ok(ServerFrame::ConfigUpdate { payload }) => {
                let update = payload.payload;
                debug!(key = %update.key, "Applying pushed update");
                self.store.set(update.key, CacheEntry::from_push(update.value));
            }
            Ok(ServerFrame::Other) => {}
            Err(err) => {
                warn!(error = %err, "Undecodable live frame");
            }
        }
    }

    fn set_state(&self, state: ChannelState) {
        let _ = self.state_tx.send(state);
    }
}

fn next_backoff(current_ms: u64, reconnect: &ReconnectSettings) -> u64 {
    let next = (current_ms as f64 * reconnect.multiplier) as u64;
    next.min(reconnect.max_ms)
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}
