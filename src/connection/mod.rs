//! Connection Manager - WebSocket Lifecycle
//!
//! ## Responsibilities
//!
//! - Own the socket to the video-stream endpoint
//! - Apply lifecycle transitions and carry out their effects
//! - Decode inbound text frames at the boundary and forward typed events
//! - Serialize outbound commands onto the socket
//! - Cancelable retry sleep: shutdown interrupts a pending reconnect

pub mod transitions;

use crate::protocol::{self, InboundEvent, OutboundCommand};
use crate::reconnect::{ReconnectPolicy, ReconnectState};
use crate::ui::UIProjection;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use transitions::{transition, ConnectionState, Effect, LinkEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Drives the WebSocket lifecycle for one session
pub struct ConnectionManager {
    url: String,
    policy: ReconnectPolicy,
    state: Arc<RwLock<ConnectionState>>,
    ui: Arc<dyn UIProjection>,
}

impl ConnectionManager {
    pub fn new(url: String, ui: Arc<dyn UIProjection>) -> Self {
        Self {
            url,
            policy: ReconnectPolicy::with_defaults(),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            ui,
        }
    }

    /// Shared handle for command gating
    pub fn state_handle(&self) -> Arc<RwLock<ConnectionState>> {
        self.state.clone()
    }

    /// Run until the retry budget is exhausted or shutdown is signaled.
    pub async fn run(
        self,
        events: mpsc::Sender<InboundEvent>,
        mut commands: mpsc::Receiver<OutboundCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut retries = ReconnectState::new();
        let mut wake = LinkEvent::OpenRequested;

        loop {
            self.apply(&wake, &mut retries).await;

            let socket = tokio::select! {
                result = connect_async(self.url.as_str()) => result,
                _ = shutdown.changed() => return,
            };

            let exit = match socket {
                Ok((ws, _)) => {
                    self.apply(&LinkEvent::HandshakeCompleted, &mut retries).await;
                    info!(url = %self.url, "WebSocket connected");
                    self.drive(ws, &events, &mut commands, &mut shutdown).await
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "WebSocket connect failed");
                    LinkEvent::TransportError
                }
            };

            if exit == LinkEvent::CloseRequested {
                self.apply(&exit, &mut retries).await;
                self.apply(&LinkEvent::RemoteClosed { clean: true }, &mut retries)
                    .await;
                return;
            }

            let retry_after = self.apply(&exit, &mut retries).await;
            match retry_after {
                Some(delay) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown.changed() => return,
                    }
                    wake = LinkEvent::RetryTimerFired;
                }
                None => return,
            }
        }
    }

    /// Apply one transition, run its effects, return any retry delay.
    async fn apply(&self, event: &LinkEvent, retries: &mut ReconnectState) -> Option<Duration> {
        let mut state = self.state.write().await;
        let from = *state;
        let t = transition(from, event, retries, &self.policy);
        debug!(?from, to = ?t.next, ?event, "Connection transition");
        *state = t.next;
        drop(state);

        let mut retry_after = None;
        for effect in t.effects {
            match effect {
                Effect::Notify(level, message) => self.ui.status(level, &message),
                Effect::ScheduleRetry(delay) => retry_after = Some(delay),
            }
        }
        retry_after
    }

    /// Pump one live socket until it drops or a close is requested.
    async fn drive(
        &self,
        ws: Socket,
        events: &mpsc::Sender<InboundEvent>,
        commands: &mut mpsc::Receiver<OutboundCommand>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> LinkEvent {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match protocol::decode_event(&text) {
                            Ok(event) => {
                                if events.send(event).await.is_err() {
                                    // Consumer is gone; shut the socket down.
                                    let _ = sink.send(Message::Close(None)).await;
                                    return LinkEvent::CloseRequested;
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "Dropping malformed message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        return LinkEvent::RemoteClosed { clean: true };
                    }
                    Some(Ok(_)) => {
                        // Binary/ping/pong frames carry nothing for us.
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket read error");
                        return LinkEvent::TransportError;
                    }
                    None => {
                        return LinkEvent::RemoteClosed { clean: false };
                    }
                },

                outgoing = commands.recv() => match outgoing {
                    Some(command) => {
                        let payload = match serde_json::to_string(&command) {
                            Ok(p) => p,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode command");
                                continue;
                            }
                        };
                        debug!(command = %payload, "Sending command");
                        if let Err(e) = sink.send(Message::Text(payload)).await {
                            warn!(error = %e, "WebSocket write error");
                            return LinkEvent::TransportError;
                        }
                    }
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return LinkEvent::CloseRequested;
                    }
                },

                _ = shutdown.changed() => {
                    // Flush queued commands (a final stop_camera rides here)
                    // before closing the socket.
                    while let Ok(command) = commands.try_recv() {
                        if let Ok(payload) = serde_json::to_string(&command) {
                            let _ = sink.send(Message::Text(payload)).await;
                        }
                    }
                    let _ = sink.send(Message::Close(None)).await;
                    return LinkEvent::CloseRequested;
                }
            }
        }
    }
}
