// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token-aware reconnecting WebSocket channel.
//!
//! One spawned task owns the connection lifecycle:
//! DISCONNECTED → CONNECTING → OPEN → RECONNECT_SCHEDULED → … with a fresh
//! token fetched before every attempt. Messages are delivered in wire order
//! within one connection; nothing is replayed across a reconnect
//! (at-most-once, best effort).

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::channel::envelope::{heartbeat_frame, ChannelMessage};
use crate::config::GateConfig;
use crate::credential::refresh::TokenRefresher;
use crate::error::GateError;

/// Close codes the backend uses for rejected credentials (policy violation
/// plus the consumer's 4001–4003 range; it closes unauthenticated sockets
/// with 4003).
fn is_auth_close(code: u16) -> bool {
    code == 1008 || (4001..=4003).contains(&code)
}

/// Channel lifecycle state, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    ReconnectScheduled,
}

/// Events delivered to the subscriber.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Open,
    Message(ChannelMessage),
    Closed { code: u16 },
    /// Terminal failure: [`GateError::ChannelAuthRejected`] when the server
    /// refused the token and the refresh failed,
    /// [`GateError::ChannelRetriesExhausted`] when the retry budget is spent.
    Terminated(GateError),
}

/// Tunables for one channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub heartbeat_interval: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub max_retries: u32,
    pub refresh_threshold: Duration,
}

impl ChannelConfig {
    pub fn from_gate(config: &GateConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            backoff_base: config.backoff_base(),
            backoff_max: config.backoff_max(),
            max_retries: config.max_retries,
            refresh_threshold: Duration::from_secs(config.refresh_threshold_secs),
        }
    }
}

/// Exponential backoff: `base × 2^retry`, clamped to `max`.
pub fn backoff_delay(retry: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(retry);
    base.checked_mul(factor).map_or(max, |delay| delay.min(max))
}

/// Per-subscription bookkeeping, kept by the channel task.
struct ChannelSession {
    id: String,
    url: String,
    retry_count: u32,
    last_heartbeat_at: Option<Instant>,
}

/// A live subscription to one channel endpoint.
pub struct ReconnectingChannel {
    events: mpsc::Receiver<ChannelEvent>,
    outbound: mpsc::Sender<String>,
    state: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
}

impl ReconnectingChannel {
    /// Subscribe to `url` (without the token query parameter; it is appended
    /// fresh on every connection attempt).
    pub fn subscribe(
        url: String,
        refresher: Arc<TokenRefresher>,
        config: ChannelConfig,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (out_tx, out_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);
        let cancel = CancellationToken::new();

        let session = ChannelSession {
            id: uuid::Uuid::new_v4().to_string(),
            url,
            retry_count: 0,
            last_heartbeat_at: None,
        };

        tokio::spawn(run_channel(
            session,
            refresher,
            config,
            cancel.clone(),
            event_tx,
            out_rx,
            state_tx,
        ));

        Self { events: event_rx, outbound: out_tx, state: state_rx, cancel }
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Receive the next event. `None` once the channel task has exited.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Send a frame if the channel is currently open. Frames queued while
    /// disconnected are refused, and queued frames do not survive a
    /// reconnect.
    pub fn send(&self, value: &serde_json::Value) -> bool {
        if *self.state.borrow() != ChannelState::Open {
            return false;
        }
        self.outbound.try_send(value.to_string()).is_ok()
    }

    /// Stop the subscription: the heartbeat stops, any scheduled reconnect is
    /// suppressed, and a connect completing after this call is closed without
    /// delivering messages.
    pub fn unsubscribe(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReconnectingChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// How one OPEN connection ended.
enum CloseOutcome {
    Cancelled,
    /// Server closed with 1000.
    Clean,
    Dropped { code: u16 },
}

async fn run_channel(
    mut session: ChannelSession,
    refresher: Arc<TokenRefresher>,
    config: ChannelConfig,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<ChannelEvent>,
    mut out_rx: mpsc::Receiver<String>,
    state_tx: watch::Sender<ChannelState>,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let _ = state_tx.send(ChannelState::Connecting);

        // Fresh token before every attempt: a long-lived subscription must
        // never hand the server a token that is about to expire.
        let token = tokio::select! {
            _ = cancel.cancelled() => break,
            result = refresher.ensure_fresh(config.refresh_threshold) => match result {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(session_id = %session.id, err = %e, "channel token refresh failed");
                    let _ = event_tx
                        .send(ChannelEvent::Terminated(GateError::ChannelAuthRejected))
                        .await;
                    break;
                }
            },
        };

        let connect_url = format!("{}?token={token}", session.url);
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio_tungstenite::connect_async(&connect_url) => result,
        };

        match connected {
            Ok((ws_stream, _)) => {
                if cancel.is_cancelled() {
                    // Unsubscribed while the handshake raced us: close the
                    // fresh connection, deliver nothing.
                    let (mut write, _read) = ws_stream.split();
                    let _ = write.close().await;
                    break;
                }

                session.retry_count = 0;
                tracing::debug!(session_id = %session.id, "channel connected");
                let _ = state_tx.send(ChannelState::Open);
                let _ = event_tx.send(ChannelEvent::Open).await;

                let outcome = drive_open(
                    ws_stream,
                    &config,
                    &cancel,
                    &event_tx,
                    &mut out_rx,
                    &mut session,
                )
                .await;

                match outcome {
                    CloseOutcome::Cancelled => break,
                    CloseOutcome::Clean => {
                        tracing::debug!(session_id = %session.id, "channel closed cleanly");
                        let _ = event_tx.send(ChannelEvent::Closed { code: 1000 }).await;
                        break;
                    }
                    CloseOutcome::Dropped { code } => {
                        let heartbeat_age_secs =
                            session.last_heartbeat_at.map(|at| at.elapsed().as_secs());
                        tracing::debug!(session_id = %session.id, code, heartbeat_age_secs, "channel dropped");
                        let _ = event_tx.send(ChannelEvent::Closed { code }).await;
                        if is_auth_close(code) {
                            // The server refused this token; only a refresh
                            // makes the next attempt worth anything.
                            let refreshed = tokio::select! {
                                _ = cancel.cancelled() => break,
                                result = refresher.refresh() => result,
                            };
                            if let Err(e) = refreshed {
                                tracing::warn!(session_id = %session.id, err = %e, "refresh after auth close failed");
                                let _ = event_tx
                                    .send(ChannelEvent::Terminated(GateError::ChannelAuthRejected))
                                    .await;
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!(session_id = %session.id, err = %e, "channel connect failed");
            }
        }

        session.retry_count += 1;
        if session.retry_count > config.max_retries {
            tracing::warn!(session_id = %session.id, retries = session.retry_count - 1, "channel retries exhausted");
            let _ = event_tx
                .send(ChannelEvent::Terminated(GateError::ChannelRetriesExhausted))
                .await;
            break;
        }

        let delay =
            backoff_delay(session.retry_count - 1, config.backoff_base, config.backoff_max);
        tracing::debug!(session_id = %session.id, delay_ms = delay.as_millis() as u64, "reconnect scheduled");
        let _ = state_tx.send(ChannelState::ReconnectScheduled);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let _ = state_tx.send(ChannelState::Disconnected);
}

/// Drive one OPEN connection until it ends.
async fn drive_open(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    config: &ChannelConfig,
    cancel: &CancellationToken,
    event_tx: &mpsc::Sender<ChannelEvent>,
    out_rx: &mut mpsc::Receiver<String>,
    session: &mut ChannelSession,
) -> CloseOutcome {
    let (mut write, mut read) = ws_stream.split();

    let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; the connection is already fresh.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write
                    .send(Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "unsubscribed".into(),
                    })))
                    .await;
                return CloseOutcome::Cancelled;
            }

            _ = heartbeat.tick() => {
                if let Err(e) = write.send(Message::Text(heartbeat_frame().into())).await {
                    tracing::debug!(session_id = %session.id, err = %e, "heartbeat send failed");
                    return CloseOutcome::Dropped { code: 1006 };
                }
                session.last_heartbeat_at = Some(Instant::now());
            }

            frame = out_rx.recv() => {
                let Some(frame) = frame else {
                    // Subscriber handle dropped; treat as unsubscribe.
                    return CloseOutcome::Cancelled;
                };
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    tracing::debug!(session_id = %session.id, err = %e, "channel send failed");
                    return CloseOutcome::Dropped { code: 1006 };
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ChannelMessage>(&text) {
                            Ok(parsed) => {
                                if event_tx.send(ChannelEvent::Message(parsed)).await.is_err() {
                                    return CloseOutcome::Cancelled;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(session_id = %session.id, err = %e, "unparseable channel message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        // 1005 = no status code present.
                        let code = frame.map(|f| u16::from(f.code)).unwrap_or(1005);
                        return if code == 1000 {
                            CloseOutcome::Clean
                        } else {
                            CloseOutcome::Dropped { code }
                        };
                    }
                    Some(Ok(_)) => {} // ping/pong/binary ignored
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session.id, err = %e, "channel read error");
                        return CloseOutcome::Dropped { code: 1006 };
                    }
                    None => return CloseOutcome::Dropped { code: 1006 },
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
