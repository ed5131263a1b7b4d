//! Reconnect Policy - Bounded Retry Schedule
//!
//! ## Responsibilities
//!
//! - Decide whether a dropped connection gets another attempt
//! - Fixed delay between attempts, hard cap on attempt count
//! - Attempt counter resets only on a successful handshake

use std::time::Duration;

/// Maximum consecutive failed attempts before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between reconnect attempts
pub const RECONNECT_DELAY_MS: u64 = 3000;

/// Outcome of a reconnect decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Schedule another attempt after the given delay
    RetryAfter(Duration),
    /// Budget exhausted; the session is terminal until restarted
    GiveUp,
}

/// Retry schedule parameters
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl ReconnectPolicy {
    pub fn with_defaults() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            delay: Duration::from_millis(RECONNECT_DELAY_MS),
        }
    }

    /// Decide based on attempts already consumed. The caller records the
    /// attempt after a `RetryAfter`, so `attempts` counts prior failures.
    pub fn decide(&self, attempts: u32) -> ReconnectDecision {
        if attempts < self.max_attempts {
            ReconnectDecision::RetryAfter(self.delay)
        } else {
            ReconnectDecision::GiveUp
        }
    }
}

/// Mutable attempt counter for one connection lifecycle
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconnectState {
    attempts: u32,
}

impl ReconnectState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Called when a handshake completes. A live connection means the
    /// retry budget is whole again.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_up_to_max_then_gives_up() {
        let policy = ReconnectPolicy::with_defaults();
        let mut state = ReconnectState::new();

        for _ in 0..MAX_RECONNECT_ATTEMPTS {
            assert_eq!(
                policy.decide(state.attempts()),
                ReconnectDecision::RetryAfter(Duration::from_millis(RECONNECT_DELAY_MS))
            );
            state.record_attempt();
        }

        assert_eq!(policy.decide(state.attempts()), ReconnectDecision::GiveUp);
    }

    #[test]
    fn test_reset_restores_full_budget() {
        let policy = ReconnectPolicy::with_defaults();
        let mut state = ReconnectState::new();

        state.record_attempt();
        state.record_attempt();
        state.reset();

        assert_eq!(state.attempts(), 0);
        assert!(matches!(
            policy.decide(state.attempts()),
            ReconnectDecision::RetryAfter(_)
        ));
    }
}
