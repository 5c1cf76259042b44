//! Adaptive token-bucket rate limiter
//!
//! Admission control for upstream calls, independent of the circuit breaker.
//! `acquire()` never fails; it only delays.
//!
//! ## Reservation-based waiting
//!
//! The bucket is updated and the wait is computed while holding the lock,
//! then the lock is released and the caller sleeps. A caller that has to
//! wait for a refill reserves that refill by moving `last_refill` forward,
//! so concurrent callers queue behind it instead of claiming the same token.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitConfig;

const HOUR: Duration = Duration::from_secs(3600);
/// Longest throttle delay applied for high usage
const MAX_THROTTLE_DELAY: Duration = Duration::from_millis(2000);
/// Throttle delay per unit of usage above the threshold
const THROTTLE_DELAY_SCALE_MS: f64 = 10_000.0;
/// Slowdown applied when the bucket runs low
const BUFFER_DELAY: Duration = Duration::from_millis(200);
/// Usage fraction below which the burst capacity is unlocked
const LOW_USAGE: f64 = 0.5;
/// Usage fraction above which the refill rate is boosted
const HIGH_USAGE: f64 = 0.8;
/// Minimum number of consumption timestamps kept
const MIN_HISTORY: usize = 1000;
/// Floor for the refill rate when computing waits
const MIN_REFILL_RATE: f64 = 1e-6;

/// Snapshot of the bucket for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatus {
    pub tokens: f64,
    pub max_tokens: f64,
    pub effective_refill_rate: f64,
    pub burst_capacity: f64,
    pub usage_last_hour: usize,
    pub usage_fraction: f64,
    pub throttled: bool,
    pub total_acquired: u64,
    pub total_waited: u64,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
    max_tokens: f64,
    refill_rate: f64,
    history: VecDeque<Instant>,
    total_acquired: u64,
    total_waited: u64,
}

impl Bucket {
    fn new(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: config.capacity as f64,
            last_refill: now,
            max_tokens: config.capacity as f64,
            refill_rate: config.refill_rate,
            history: VecDeque::new(),
            total_acquired: 0,
            total_waited: 0,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(front) = self.history.front() {
            if now.saturating_duration_since(*front) > HOUR {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Consumption in the last hour relative to what the base rate delivers in an hour
    fn usage_fraction(&self, config: &RateLimitConfig) -> f64 {
        let expected = config.refill_rate * HOUR.as_secs_f64();
        if expected <= 0.0 {
            return 0.0;
        }
        self.history.len() as f64 / expected
    }

    fn adapt(&mut self, config: &RateLimitConfig, usage: f64) {
        let capacity = config.capacity as f64;
        if !config.adaptive_refill {
            self.max_tokens = capacity;
            self.refill_rate = config.refill_rate;
        } else if usage < LOW_USAGE {
            self.max_tokens = config.burst_capacity();
            self.refill_rate = config.refill_rate;
        } else if usage > HIGH_USAGE {
            let boost = ((usage - HIGH_USAGE) / (1.0 - HIGH_USAGE)).min(1.0);
            self.max_tokens = capacity;
            self.refill_rate = config.refill_rate * (1.0 + boost);
        } else {
            self.max_tokens = capacity;
            self.refill_rate = config.refill_rate;
        }
        self.tokens = self.tokens.min(self.max_tokens);
    }

    fn refill(&mut self, now: Instant) {
        if now > self.last_refill {
            let elapsed = now.duration_since(self.last_refill).as_secs_f64();
            self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
            self.last_refill = now;
        }
    }

    fn update(&mut self, config: &RateLimitConfig, now: Instant) -> f64 {
        self.evict(now);
        let usage = self.usage_fraction(config);
        self.adapt(config, usage);
        self.refill(now);
        usage
    }
}

/// Token bucket with adaptive refill and proportional throttling
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    config: RateLimitConfig,
    history_limit: usize,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(name: &str, config: RateLimitConfig) -> Self {
        // Enough history to see a full hour at the base rate
        let hourly = (config.refill_rate * HOUR.as_secs_f64() + config.burst_capacity()).ceil();
        let history_limit = MIN_HISTORY.max(hourly as usize);
        Self {
            name: name.to_string(),
            bucket: Mutex::new(Bucket::new(&config, Instant::now())),
            config,
            history_limit,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Take one token, sleeping first if the bucket or recent usage says so.
    ///
    /// Returns the total time spent waiting.
    pub async fn acquire(&self) -> Duration {
        let (wait, reasons) = {
            let mut bucket = self.bucket.lock();
            let now = Instant::now();
            let usage = bucket.update(&self.config, now);

            let mut wait = Duration::ZERO;
            let mut reasons: Vec<&'static str> = Vec::new();

            if usage > self.config.throttle_threshold {
                let delay = Duration::from_secs_f64(
                    (usage - self.config.throttle_threshold) * THROTTLE_DELAY_SCALE_MS / 1000.0,
                )
                .min(MAX_THROTTLE_DELAY);
                wait += delay;
                reasons.push("throttle");
            }

            if bucket.tokens < 1.0 {
                // Queue behind any refill already reserved by another caller
                let queued = bucket.last_refill.saturating_duration_since(now);
                let refill_wait =
                    queued + Duration::from_secs_f64(1.0 / bucket.refill_rate.max(MIN_REFILL_RATE));
                bucket.last_refill = now + refill_wait;
                bucket.tokens = 1.0;
                wait += refill_wait;
                reasons.push("refill");
            } else if bucket.tokens < self.config.buffer_percent * bucket.max_tokens {
                wait += BUFFER_DELAY;
                reasons.push("buffer");
            }

            bucket.tokens -= 1.0;
            bucket.history.push_back(now);
            while bucket.history.len() > self.history_limit {
                bucket.history.pop_front();
            }
            bucket.total_acquired += 1;
            if !wait.is_zero() {
                bucket.total_waited += 1;
            }
            (wait, reasons)
        };

        if !wait.is_zero() {
            debug!(
                limiter = %self.name,
                reason = %reasons.join("+"),
                wait_ms = wait.as_millis() as u64,
                "Rate limiter delaying request"
            );
            tokio::time::sleep(wait).await;
        }
        wait
    }

    pub fn status(&self) -> RateLimitStatus {
        let mut bucket = self.bucket.lock();
        let usage = bucket.update(&self.config, Instant::now());
        RateLimitStatus {
            tokens: bucket.tokens,
            max_tokens: bucket.max_tokens,
            effective_refill_rate: bucket.refill_rate,
            burst_capacity: self.config.burst_capacity(),
            usage_last_hour: bucket.history.len(),
            usage_fraction: usage,
            throttled: usage > self.config.throttle_threshold,
            total_acquired: bucket.total_acquired,
            total_waited: bucket.total_waited,
        }
    }

    /// Refill the bucket and forget usage history
    pub fn reset(&self) {
        *self.bucket.lock() = Bucket::new(&self.config, Instant::now());
        debug!(limiter = %self.name, "Rate limiter reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn config(capacity: u32, refill_rate: f64, adaptive: bool) -> RateLimitConfig {
        RateLimitConfig {
            capacity,
            refill_rate,
            adaptive_refill: adaptive,
            ..RateLimitConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_bucket_is_immediate() {
        let limiter = RateLimiter::new("test", config(10, 1.0, false));
        let start = Instant::now();
        for _ in 0..10 {
            assert_eq!(limiter.acquire().await, Duration::ZERO);
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.status().total_waited, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eleventh_acquire_waits_for_refill() {
        let limiter = RateLimiter::new("test", config(10, 1.0, false));
        for _ in 0..10 {
            limiter.acquire().await;
        }
        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(1000) && elapsed < Duration::from_millis(1010),
            "waited {:?}",
            elapsed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_eleventh_acquire_waits_with_adaptive_burst() {
        let limiter = RateLimiter::new("test", config(10, 1.0, true));
        for _ in 0..10 {
            limiter.acquire().await;
        }
        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(1000) && elapsed < Duration::from_millis(1010),
            "waited {:?}",
            elapsed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_bucket_slowdown() {
        let limiter = RateLimiter::new(
            "buffer",
            RateLimitConfig {
                capacity: 10,
                refill_rate: 1.0,
                adaptive_refill: false,
                buffer_percent: 0.5,
                ..RateLimitConfig::default()
            },
        );
        for _ in 0..5 {
            assert_eq!(limiter.acquire().await, Duration::ZERO);
        }
        // 5 tokens left, below half of 10 after the next one
        assert_eq!(limiter.acquire().await, Duration::ZERO);
        assert_eq!(limiter.acquire().await, BUFFER_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_high_usage_is_throttled() {
        // 36 tokens per hour at the base rate
        let limiter = RateLimiter::new(
            "throttle",
            RateLimitConfig {
                capacity: 40,
                refill_rate: 0.01,
                adaptive_refill: false,
                buffer_percent: 0.0,
                ..RateLimitConfig::default()
            },
        );
        for _ in 0..30 {
            limiter.acquire().await;
        }
        let status = limiter.status();
        assert!(status.throttled);
        assert_eq!(status.usage_last_hour, 30);

        // (30/36 - 0.8) * 10s
        let waited = limiter.acquire().await;
        assert!(
            waited >= Duration::from_millis(333) && waited <= Duration::from_millis(334),
            "waited {:?}",
            waited
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_delay_is_capped() {
        let limiter = RateLimiter::new(
            "cap",
            RateLimitConfig {
                capacity: 50,
                refill_rate: 0.01,
                adaptive_refill: false,
                buffer_percent: 0.0,
                ..RateLimitConfig::default()
            },
        );
        for _ in 0..45 {
            limiter.acquire().await;
        }
        // usage 45/36 would ask for 4.5s
        assert_eq!(limiter.acquire().await, MAX_THROTTLE_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adaptive_capacity_and_rate() {
        let limiter = RateLimiter::new("adaptive", config(40, 0.01, true));
        assert_eq!(limiter.status().max_tokens, 60.0);
        assert_eq!(limiter.status().effective_refill_rate, 0.01);

        for _ in 0..33 {
            limiter.acquire().await;
        }
        // usage 33/36 is above 0.8: rate boosted, burst withdrawn
        let status = limiter.status();
        assert_eq!(status.max_tokens, 40.0);
        assert!(status.effective_refill_rate > 0.01);
        assert!(status.effective_refill_rate <= 0.02);
        assert!(status.tokens <= 40.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_stay_in_bounds() {
        let cfg = config(5, 2.0, true);
        let upper = (cfg.capacity as f64).max(cfg.burst_capacity());
        let limiter = RateLimiter::new("bounds", cfg);

        for i in 0..200u64 {
            limiter.acquire().await;
            if i % 7 == 0 {
                tokio::time::advance(Duration::from_millis(i * 37 % 5000)).await;
            }
            let tokens = limiter.status().tokens;
            assert!((0.0..=upper).contains(&tokens), "tokens {} out of bounds", tokens);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_queue() {
        let limiter = Arc::new(RateLimiter::new("concurrent", config(1, 1.0, false)));
        limiter.acquire().await;

        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                start.elapsed()
            }));
        }
        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();
        assert_eq!(
            times,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3)
            ]
        );
        assert_eq!(limiter.status().total_waited, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_refills() {
        let limiter = RateLimiter::new("reset", config(2, 1.0, false));
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.reset();
        let status = limiter.status();
        assert_eq!(status.tokens, 2.0);
        assert_eq!(status.total_acquired, 0);
        assert_eq!(status.usage_last_hour, 0);
    }
}
