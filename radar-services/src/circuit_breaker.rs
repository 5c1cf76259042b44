//! Circuit breaker
//!
//! Tracks call outcomes over a sliding window and gates new calls through a
//! CLOSED / OPEN / HALF_OPEN state machine. Rejection is immediate; the
//! breaker never waits.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use radar_core::{CircuitState, RadarError};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::CircuitConfig;

/// Failure rate above which a busy circuit opens
const MAX_FAILURE_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
struct CallOutcome {
    at: Instant,
    success: bool,
}

/// Why a call was not let through
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitRejection {
    pub state: CircuitState,
    /// Time until the next probe is allowed, if known
    pub retry_in: Option<Duration>,
}

impl CircuitRejection {
    pub fn into_error(self, fallback_attempted: bool) -> RadarError {
        RadarError::circuit_open(self.state, fallback_attempted)
    }
}

pub type CircuitResult<T> = Result<T, CircuitRejection>;

/// Snapshot of breaker state for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct CircuitStats {
    pub state: CircuitState,
    /// Calls recorded inside the monitoring period
    pub total_calls: usize,
    pub failures: usize,
    pub successes: usize,
    pub failure_rate: f64,
    pub half_open_calls: u32,
    pub half_open_successes: u32,
    pub last_state_change_ago_ms: u64,
    /// Only set while OPEN
    pub next_probe_in_ms: Option<u64>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    history: VecDeque<CallOutcome>,
    state_changed_at: Instant,
    half_open_calls: u32,
    half_open_successes: u32,
}

impl BreakerState {
    fn new(now: Instant) -> Self {
        Self {
            state: CircuitState::Closed,
            history: VecDeque::new(),
            state_changed_at: now,
            half_open_calls: 0,
            half_open_successes: 0,
        }
    }

    fn evict(&mut self, now: Instant, window: Duration) {
        while let Some(front) = self.history.front() {
            if now.duration_since(front.at) > window {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    fn failures(&self) -> usize {
        self.history.iter().filter(|o| !o.success).count()
    }

    fn transition(&mut self, name: &str, to: CircuitState, now: Instant) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        self.state_changed_at = now;
        self.half_open_calls = 0;
        self.half_open_successes = 0;
        if to == CircuitState::Closed {
            self.history.clear();
        }

        match to {
            CircuitState::Open => warn!(breaker = name, %from, %to, "Circuit breaker opened"),
            _ => info!(breaker = name, %from, %to, "Circuit breaker state change"),
        }
    }
}

/// Three-state circuit breaker.
///
/// All methods take `&self`; the state sits behind a mutex that is never
/// held across an await point.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: Mutex<CircuitConfig>,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: &str, config: CircuitConfig) -> Self {
        Self {
            name: name.to_string(),
            config: Mutex::new(config),
            inner: Mutex::new(BreakerState::new(Instant::now())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a new call may proceed.
    ///
    /// An OPEN circuit whose reset timeout has elapsed moves to HALF_OPEN and
    /// lets this call through as the first probe.
    pub fn allow(&self) -> bool {
        self.check().is_ok()
    }

    /// Like [`allow`](Self::allow) but says why a call was rejected
    pub fn check(&self) -> CircuitResult<()> {
        let config = self.config.lock().clone();
        let now = Instant::now();
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let open_for = now.duration_since(inner.state_changed_at);
                let timeout = config.reset_timeout();
                if open_for >= timeout {
                    inner.transition(&self.name, CircuitState::HalfOpen, now);
                    inner.half_open_calls = 1;
                    Ok(())
                } else {
                    Err(CircuitRejection {
                        state: CircuitState::Open,
                        retry_in: Some(timeout - open_for),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_calls < config.half_open_max_calls {
                    inner.half_open_calls += 1;
                    return Ok(());
                }

                // Trial calls that never reported back must not hold the circuit half-open
                let timeout = config.reset_timeout();
                if now.duration_since(inner.state_changed_at) >= timeout {
                    warn!(
                        breaker = %self.name,
                        trial_calls = inner.half_open_calls,
                        successes = inner.half_open_successes,
                        "Half-open trial calls unresolved, reopening"
                    );
                    inner.transition(&self.name, CircuitState::Open, now);
                    return Err(CircuitRejection {
                        state: CircuitState::Open,
                        retry_in: Some(timeout),
                    });
                }

                debug!(breaker = %self.name, "Half-open probe limit reached");
                Err(CircuitRejection {
                    state: CircuitState::HalfOpen,
                    retry_in: None,
                })
            }
        }
    }

    pub fn record_success(&self) {
        let config = self.config.lock().clone();
        let now = Instant::now();
        let mut inner = self.inner.lock();

        inner.history.push_back(CallOutcome { at: now, success: true });
        inner.evict(now, config.monitoring_period());

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_successes += 1;
            if inner.half_open_successes >= config.success_threshold {
                inner.transition(&self.name, CircuitState::Closed, now);
            }
        }
    }

    pub fn record_failure(&self) {
        let config = self.config.lock().clone();
        let now = Instant::now();
        let mut inner = self.inner.lock();

        inner.history.push_back(CallOutcome { at: now, success: false });
        inner.evict(now, config.monitoring_period());

        match inner.state {
            CircuitState::HalfOpen => inner.transition(&self.name, CircuitState::Open, now),
            CircuitState::Closed => {
                let calls = inner.history.len();
                let failures = inner.failures();
                let threshold = config.failure_threshold as usize;
                let trip = if calls < config.volume_threshold as usize {
                    failures >= threshold
                } else {
                    failures >= threshold || failures as f64 / calls as f64 > MAX_FAILURE_RATE
                };
                if trip {
                    warn!(
                        breaker = %self.name,
                        failures, calls, "Failure threshold reached"
                    );
                    inner.transition(&self.name, CircuitState::Open, now);
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn stats(&self) -> CircuitStats {
        let config = self.config.lock().clone();
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.evict(now, config.monitoring_period());

        let total_calls = inner.history.len();
        let failures = inner.failures();
        let since_change = now.duration_since(inner.state_changed_at);
        let next_probe_in_ms = (inner.state == CircuitState::Open)
            .then(|| config.reset_timeout().saturating_sub(since_change).as_millis() as u64);

        CircuitStats {
            state: inner.state,
            total_calls,
            failures,
            successes: total_calls - failures,
            failure_rate: if total_calls == 0 {
                0.0
            } else {
                failures as f64 / total_calls as f64
            },
            half_open_calls: inner.half_open_calls,
            half_open_successes: inner.half_open_successes,
            last_state_change_ago_ms: since_change.as_millis() as u64,
            next_probe_in_ms,
        }
    }

    /// Force the breaker back to CLOSED with an empty history
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = BreakerState::new(Instant::now());
        info!(breaker = %self.name, "Circuit breaker reset");
    }

    /// Replace the thresholds; the current state is kept
    pub fn reconfigure(&self, config: CircuitConfig) {
        *self.config.lock() = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn config(failure_threshold: u32, volume_threshold: u32) -> CircuitConfig {
        CircuitConfig {
            failure_threshold,
            volume_threshold,
            reset_timeout_ms: 1_000,
            half_open_max_calls: 2,
            success_threshold: 2,
            monitoring_period_ms: 10_000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new("test", config(5, 5));
        for _ in 0..4 {
            breaker.record_failure();
            assert_eq!(breaker.state(), CircuitState::Closed);
        }
        breaker.record_failure();
        assert_eq!(breaker.stats().state, CircuitState::Open);
        assert_eq!(breaker.stats().state.as_str(), "OPEN");
        assert!(!breaker.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_k_failures_open_for_any_small_volume_threshold() {
        for k in 1..8 {
            for volume in 1..=k {
                let breaker = CircuitBreaker::new("prop", config(k, volume));
                for _ in 0..k {
                    breaker.record_failure();
                }
                assert_eq!(breaker.state(), CircuitState::Open, "k={} volume={}", k, volume);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_rate_trips_busy_circuit() {
        let breaker = CircuitBreaker::new("rate", config(100, 4));
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        // 3 of 4 failed
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_failures_leave_the_window() {
        let breaker = CircuitBreaker::new("window", config(3, 10));
        breaker.record_failure();
        breaker.record_failure();
        advance(Duration::from_millis(10_001)).await;
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_until_timeout_then_single_probe() {
        let breaker = CircuitBreaker::new("probe", config(1, 1));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        advance(Duration::from_millis(999)).await;
        assert!(!breaker.allow());
        assert_eq!(breaker.state(), CircuitState::Open);
        let stats = breaker.stats();
        assert_eq!(stats.next_probe_in_ms, Some(1));

        advance(Duration::from_millis(1)).await;
        assert!(breaker.allow());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.stats().half_open_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_limits_probes() {
        let breaker = CircuitBreaker::new("limit", config(1, 1));
        breaker.record_failure();
        advance(Duration::from_secs(1)).await;

        assert!(breaker.allow());
        assert!(breaker.allow());
        let rejection = breaker.check().unwrap_err();
        assert_eq!(rejection.state, CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let breaker = CircuitBreaker::new("reopen", config(1, 1));
        breaker.record_failure();
        advance(Duration::from_secs(1)).await;
        assert!(breaker.allow());
        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_successes_close() {
        let breaker = CircuitBreaker::new("close", config(1, 1));
        breaker.record_failure();
        advance(Duration::from_secs(1)).await;
        assert!(breaker.allow());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.allow());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);

        let stats = breaker.stats();
        assert_eq!(stats.total_calls, 0);
        assert_eq!(stats.half_open_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_trial_calls_reopen_after_timeout() {
        let breaker = CircuitBreaker::new("stalled", config(1, 1));
        breaker.record_failure();
        advance(Duration::from_secs(1)).await;

        // Both trial slots taken, neither records an outcome
        assert!(breaker.allow());
        assert!(breaker.allow());
        advance(Duration::from_millis(999)).await;
        assert_eq!(breaker.check().unwrap_err().state, CircuitState::HalfOpen);

        advance(Duration::from_millis(1)).await;
        let rejection = breaker.check().unwrap_err();
        assert_eq!(rejection.state, CircuitState::Open);
        assert_eq!(breaker.state(), CircuitState::Open);

        advance(Duration::from_secs(1)).await;
        assert!(breaker.allow());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.record_success();
        assert!(breaker.allow());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_keeps_state_and_applies_thresholds() {
        let breaker = CircuitBreaker::new("tuned", config(3, 3));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.reconfigure(CircuitConfig {
            reset_timeout_ms: 5_000,
            ..config(2, 2)
        });
        assert_eq!(breaker.stats().failures, 1);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        advance(Duration::from_secs(1)).await;
        assert!(!breaker.allow());
        assert_eq!(breaker.stats().next_probe_in_ms, Some(4_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_and_rejection_error() {
        let breaker = CircuitBreaker::new("reset", config(1, 1));
        breaker.record_failure();
        let err = breaker.check().unwrap_err().into_error(false);
        assert!(matches!(
            err,
            RadarError::CircuitOpen {
                state: CircuitState::Open,
                fallback_attempted: false
            }
        ));

        breaker.reset();
        assert!(breaker.allow());
        assert_eq!(breaker.stats().total_calls, 0);
    }
}
