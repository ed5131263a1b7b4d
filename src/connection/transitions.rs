//! Connection State Transitions
//!
//! ## Responsibilities
//!
//! - Pure transition function: (state, link event) -> next state + effects
//! - Retry scheduling decisions delegated to the reconnect policy
//! - A clean remote close or a requested close never schedules a retry

use crate::reconnect::{ReconnectDecision, ReconnectPolicy, ReconnectState};
use crate::ui::StatusLevel;
use std::time::Duration;

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    /// A close was requested; the remote close that follows must not retry
    Closing,
}

/// Events observed on the transport
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    OpenRequested,
    HandshakeCompleted,
    TransportError,
    RemoteClosed { clean: bool },
    CloseRequested,
    RetryTimerFired,
}

/// Side effects the caller must carry out after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(StatusLevel, String),
    ScheduleRetry(Duration),
}

/// Result of applying one link event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: ConnectionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: ConnectionState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }
}

/// Apply one link event.
///
/// The only mutation is the attempt counter: incremented when a retry is
/// scheduled, reset when a handshake completes.
pub fn transition(
    state: ConnectionState,
    event: &LinkEvent,
    retries: &mut ReconnectState,
    policy: &ReconnectPolicy,
) -> Transition {
    use ConnectionState::*;

    match (state, event) {
        (Disconnected, LinkEvent::OpenRequested) => Transition {
            next: Connecting,
            effects: vec![Effect::Notify(
                StatusLevel::Info,
                "Connecting to video stream...".to_string(),
            )],
        },

        (Disconnected, LinkEvent::RetryTimerFired) => Transition {
            next: Connecting,
            effects: vec![Effect::Notify(
                StatusLevel::Info,
                format!(
                    "Reconnecting (attempt {}/{})...",
                    retries.attempts(),
                    policy.max_attempts
                ),
            )],
        },

        (Connecting, LinkEvent::HandshakeCompleted) => {
            retries.reset();
            Transition {
                next: Open,
                effects: vec![Effect::Notify(
                    StatusLevel::Success,
                    "Connected to video stream".to_string(),
                )],
            }
        }

        // Abnormal loss while connecting or open: consult the retry budget.
        (Connecting | Open, LinkEvent::TransportError)
        | (Connecting | Open, LinkEvent::RemoteClosed { clean: false }) => {
            match policy.decide(retries.attempts()) {
                ReconnectDecision::RetryAfter(delay) => {
                    retries.record_attempt();
                    Transition {
                        next: Disconnected,
                        effects: vec![
                            Effect::Notify(
                                StatusLevel::Error,
                                "Connection lost".to_string(),
                            ),
                            Effect::ScheduleRetry(delay),
                        ],
                    }
                }
                ReconnectDecision::GiveUp => Transition {
                    next: Disconnected,
                    effects: vec![Effect::Notify(
                        StatusLevel::Error,
                        "Cannot reconnect. Restart the client to retry.".to_string(),
                    )],
                },
            }
        }

        (Open, LinkEvent::RemoteClosed { clean: true }) => Transition {
            next: Disconnected,
            effects: vec![Effect::Notify(
                StatusLevel::Info,
                "Connection closed".to_string(),
            )],
        },

        (Connecting | Open, LinkEvent::CloseRequested) => Transition {
            next: Closing,
            effects: vec![Effect::Notify(
                StatusLevel::Info,
                "Closing connection...".to_string(),
            )],
        },

        // Once closing, nothing that arrives can schedule a retry.
        (Closing, LinkEvent::RemoteClosed { .. }) | (Closing, LinkEvent::TransportError) => {
            Transition {
                next: Disconnected,
                effects: vec![Effect::Notify(
                    StatusLevel::Info,
                    "Disconnected".to_string(),
                )],
            }
        }

        // Anything else is a no-op in the current state.
        (s, _) => Transition::stay(s),
    }
}
