//! Stream client for the live telemetry feed
//!
//! Manages one persistent duplex connection with subscription (re)issuance
//! and automatic reconnection under a bounded retry budget. Errors are
//! reported through callbacks, never thrown across socket or timer
//! boundaries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use telemetry_shared::TelemetryError;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

/// Stream client configuration
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// WebSocket endpoint of the telemetry collector
    pub url: String,
    /// Enable auto-reconnect
    pub reconnect: bool,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Retry budget before the client gives up terminally
    pub max_reconnect_attempts: u32,
}

impl Default for StreamClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".to_string(),
            reconnect: true,
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_attempts: 10,
        }
    }
}

/// Connection state visible to the UI surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Subscription request; one active logical subscription per connection,
/// re-sending replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

type EventCallback = dyn Fn(Value) + Send + Sync;
type StateCallback = dyn Fn(ConnectionState) + Send + Sync;
type ErrorCallback = dyn Fn(TelemetryError) + Send + Sync;

/// Callbacks invoked from the connection task
#[derive(Default)]
pub struct StreamCallbacks {
    pub on_event: Option<Box<EventCallback>>,
    pub on_state_change: Option<Box<StateCallback>>,
    pub on_error: Option<Box<ErrorCallback>>,
}

/// Bounded retry bookkeeping for reconnection.
///
/// Pure state machine: `next_delay` either schedules one more attempt or
/// signals exhaustion; `reset` is called on every successful open.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    delay: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, or `None` when the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.delay)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

struct Inner {
    config: StreamClientConfig,
    callbacks: StreamCallbacks,
    state: RwLock<ConnectionState>,
    pending_request: RwLock<Option<SubscriptionRequest>>,
    outbound: RwLock<Option<mpsc::UnboundedSender<String>>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Inner {
    fn set_state(&self, next: ConnectionState) {
        let changed = {
            let mut state = self.state.write();
            if *state != next {
                *state = next;
                true
            } else {
                false
            }
        };
        if changed {
            if let Some(cb) = &self.callbacks.on_state_change {
                cb(next);
            }
        }
    }

    fn report(&self, err: TelemetryError) {
        if let Some(cb) = &self.callbacks.on_error {
            cb(err);
        } else {
            log::error!("stream error: {err}");
        }
    }

    /// Queue a subscription request onto the live socket, if any.
    fn send_request(&self, request: &SubscriptionRequest) -> bool {
        let outbound = self.outbound.read();
        let Some(tx) = outbound.as_ref() else {
            return false;
        };
        match serde_json::to_string(request) {
            Ok(text) => tx.send(text).is_ok(),
            Err(err) => {
                self.report(err.into());
                false
            }
        }
    }
}

/// Client for the collector's live event feed
pub struct StreamClient {
    inner: Arc<Inner>,
}

impl StreamClient {
    pub fn new(config: StreamClientConfig, callbacks: StreamCallbacks) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                callbacks,
                state: RwLock::new(ConnectionState::Disconnected),
                pending_request: RwLock::new(None),
                outbound: RwLock::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Connect with a subscription. If the socket is already open the
    /// request is re-sent over it (filter changes need no reconnect); if a
    /// connection attempt is in flight the request is stashed and flushed
    /// on open; otherwise a fresh connection attempt starts.
    pub fn connect(&self, request: SubscriptionRequest) {
        *self.inner.pending_request.write() = Some(request.clone());

        match self.state() {
            ConnectionState::Connected => {
                self.inner.send_request(&request);
            }
            ConnectionState::Connecting => {}
            ConnectionState::Disconnected | ConnectionState::Error => {
                self.spawn_connection();
            }
        }
    }

    /// Replace the active subscription: sends immediately when connected,
    /// reconnects when disconnected or errored.
    pub fn update_subscription(&self, request: SubscriptionRequest) {
        *self.inner.pending_request.write() = Some(request.clone());

        match self.state() {
            ConnectionState::Connected => {
                self.inner.send_request(&request);
            }
            ConnectionState::Connecting => {}
            ConnectionState::Disconnected | ConnectionState::Error => {
                self.spawn_connection();
            }
        }
    }

    /// Tear the connection down: cancels the connection task (and any
    /// pending reconnect sleep with it), clears the pending request so no
    /// further auto-reconnect occurs, and forces `Disconnected`. Safe to
    /// call repeatedly.
    pub fn disconnect(&self) {
        if let Some(handle) = self.inner.task.lock().take() {
            handle.abort();
        }
        *self.inner.pending_request.write() = None;
        *self.inner.outbound.write() = None;
        self.inner.set_state(ConnectionState::Disconnected);
    }

    fn spawn_connection(&self) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_connection(inner));
        if let Some(old) = self.inner.task.lock().replace(handle) {
            old.abort();
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.task.lock().take() {
            handle.abort();
        }
    }
}

/// Connection task: connect, pump messages, reconnect on failure until the
/// retry budget is spent or the subscription is withdrawn.
async fn run_connection(inner: Arc<Inner>) {
    let mut policy = ReconnectPolicy::new(
        inner.config.reconnect_delay,
        inner.config.max_reconnect_attempts,
    );

    loop {
        inner.set_state(ConnectionState::Connecting);

        match connect_async(inner.config.url.as_str()).await {
            Ok((ws, _)) => {
                policy.reset();

                let (mut write, mut read) = ws.split();
                let (tx, mut rx) = mpsc::unbounded_channel::<String>();
                *inner.outbound.write() = Some(tx);
                inner.set_state(ConnectionState::Connected);

                // Flush the subscription stashed before/while connecting.
                let pending = inner.pending_request.read().clone();
                if let Some(request) = pending {
                    inner.send_request(&request);
                }

                loop {
                    tokio::select! {
                        outgoing = rx.recv() => {
                            let Some(text) = outgoing else { break };
                            if let Err(err) = write.send(Message::Text(text)).await {
                                inner.report(TelemetryError::Transport {
                                    message: format!("send failed: {err}"),
                                });
                                break;
                            }
                        }
                        incoming = read.next() => {
                            match incoming {
                                Some(Ok(Message::Text(text))) => {
                                    match serde_json::from_str::<Value>(&text) {
                                        Ok(value) => {
                                            if let Some(cb) = &inner.callbacks.on_event {
                                                cb(value);
                                            }
                                        }
                                        // A bad frame never closes the connection.
                                        Err(err) => inner.report(TelemetryError::Parse {
                                            message: format!("bad stream message: {err}"),
                                        }),
                                    }
                                }
                                Some(Ok(Message::Ping(data))) => {
                                    let _ = write.send(Message::Pong(data)).await;
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {}
                                Some(Err(err)) => {
                                    inner.report(TelemetryError::Transport {
                                        message: format!("socket error: {err}"),
                                    });
                                    break;
                                }
                            }
                        }
                    }
                }

                *inner.outbound.write() = None;
                inner.set_state(ConnectionState::Disconnected);
            }
            Err(err) => {
                inner.report(TelemetryError::Transport {
                    message: format!("connection failed: {err}"),
                });
                inner.set_state(ConnectionState::Error);
            }
        }

        // Reconnect only while enabled and a subscription is outstanding.
        if !inner.config.reconnect || inner.pending_request.read().is_none() {
            break;
        }

        match policy.next_delay() {
            Some(delay) => {
                log::debug!(
                    "reconnecting to {} in {:?} (attempt {})",
                    inner.config.url,
                    delay,
                    policy.attempts()
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                inner.report(TelemetryError::ReconnectExhausted {
                    attempts: inner.config.max_reconnect_attempts,
                });
                inner.set_state(ConnectionState::Error);
                break;
            }
        }
    }
}
