//! Circuit breaker guarding oracle generation calls.
//!
//! Tracks a consecutive-failure streak. Once the streak reaches the
//! threshold the breaker opens for a fixed cooldown; any success closes it
//! and clears the streak.
//!
//! Time is read from [`tokio::time::Instant`] so tests can drive the
//! cooldown with a paused clock.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ResilienceConfig;

/// Observable state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls allowed
    Closed,
    /// Calls skipped until the cooldown ends
    Open,
}

impl CircuitState {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-run circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    /// Failures needed to open
    failure_threshold: u32,

    /// How long the breaker stays open
    cooldown: Duration,

    /// Consecutive failures since the last success
    failure_streak: u32,

    /// End of the current open window
    open_until: Option<Instant>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            failure_streak: 0,
            open_until: None,
        }
    }

    /// Create a closed breaker from resilience settings.
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(config.failure_threshold, config.cooldown())
    }

    /// Whether calls must currently be skipped.
    pub fn is_open(&self) -> bool {
        self.open_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        if self.is_open() {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    /// Time left in the open window, if open.
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        self.open_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Record a failed call.
    pub fn record_failure(&mut self) {
        self.failure_streak += 1;

        if self.failure_streak >= self.failure_threshold {
            self.open_until = Some(Instant::now() + self.cooldown);
            tracing::warn!(
                failure_streak = self.failure_streak,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Circuit breaker opened"
            );
        }
    }

    /// Record a successful call.
    pub fn record_success(&mut self) {
        if self.failure_streak > 0 || self.open_until.is_some() {
            tracing::debug!(
                failure_streak = self.failure_streak,
                "Circuit breaker reset after success"
            );
        }
        self.failure_streak = 0;
        self.open_until = None;
    }

    /// Consecutive failures since the last success.
    pub fn failure_streak(&self) -> u32 {
        self.failure_streak
    }

    /// Manually reset to closed.
    pub fn reset(&mut self) {
        self.failure_streak = 0;
        self.open_until = None;
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_secs(30))
    }

    #[test]
    fn test_initial_state_is_closed() {
        let cb = test_breaker();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(!cb.is_open());
        assert_eq!(cb.remaining(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold_failures() {
        let mut cb = test_breaker();

        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());

        cb.record_failure();
        assert!(cb.is_open());
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.remaining(), Some(Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stays_open_until_cooldown_elapses() {
        let mut cb = test_breaker();
        for _ in 0..3 {
            cb.record_failure();
        }

        tokio::time::advance(Duration::from_millis(29_999)).await;
        assert!(cb.is_open());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!cb.is_open());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_streak_and_window() {
        let mut cb = test_breaker();
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(cb.is_open());

        cb.record_success();
        assert_eq!(cb.failure_streak(), 0);
        assert!(!cb.is_open());
    }

    #[test]
    fn test_success_interrupts_streak() {
        let mut cb = test_breaker();
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();

        assert_eq!(cb.failure_streak(), 2);
        assert!(!cb.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_cooldown_reopens_immediately() {
        let mut cb = test_breaker();
        for _ in 0..3 {
            cb.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!cb.is_open());

        cb.record_failure();
        assert!(cb.is_open());
        assert_eq!(cb.failure_streak(), 4);
    }

    #[test]
    fn test_zero_threshold_is_treated_as_one() {
        let mut cb = CircuitBreaker::new(0, Duration::from_secs(1));
        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn test_reset() {
        let mut cb = test_breaker();
        for _ in 0..3 {
            cb.record_failure();
        }
        cb.reset();
        assert!(!cb.is_open());
        assert_eq!(cb.failure_streak(), 0);
    }

    #[test]
    fn test_circuit_state_string() {
        assert_eq!(CircuitState::Closed.to_string(), "closed");
        assert_eq!(CircuitState::Open.as_str(), "open");
    }
}
