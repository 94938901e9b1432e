//! Circuit breaker guarding the completion API

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    /// Rejecting calls until the reset timeout elapses
    Open,
    /// One probe call is allowed through
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    failure_count: usize,
    last_failure: Option<Instant>,
    opened_at: Option<Instant>,
}

impl Inner {
    fn closed() -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            last_failure: None,
            opened_at: None,
        }
    }
}

/// Consecutive-failure breaker for a single upstream
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner::closed()),
            config,
        }
    }

    // A panic while holding the lock leaves plain counters behind, so a
    // poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a call may proceed; moves Open to HalfOpen once the reset
    /// timeout has elapsed
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let expired = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.reset_timeout)
                    .unwrap_or(true);
                if expired {
                    inner.state = BreakerState::HalfOpen;
                }
                expired
            }
        }
    }

    pub fn record_success(&self) {
        *self.lock() = Inner::closed();
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.failure_count += 1;
        inner.last_failure = Some(now);

        // a failed probe reopens immediately
        if inner.state == BreakerState::HalfOpen
            || inner.failure_count >= self.config.failure_threshold
        {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(now);
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        BreakerStats {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure: inner.last_failure,
        }
    }

    pub fn reset(&self) {
        *self.lock() = Inner::closed();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct BreakerStats {
    pub state: BreakerState,
    pub failure_count: usize,
    pub last_failure: Option<Instant>,
}
