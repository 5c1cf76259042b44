//! Radar configuration
//!
//! Every component is configured at construction time. Defaults are used for
//! anything not overridden through `RADAR_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use radar_core::{RadarError, RadarResult};
use serde::{Deserialize, Serialize};

/// Circuit breaker thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Failures within the monitoring period that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing (ms)
    pub reset_timeout_ms: u64,
    /// Probe calls allowed while half-open
    pub half_open_max_calls: u32,
    /// Sliding window of recorded outcomes (ms)
    pub monitoring_period_ms: u64,
    /// Half-open successes needed to close the circuit
    pub success_threshold: u32,
    /// Calls in the window before the failure rate is considered
    pub volume_threshold: u32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 60_000,
            half_open_max_calls: 3,
            monitoring_period_ms: 120_000,
            success_threshold: 2,
            volume_threshold: 10,
        }
    }
}

impl CircuitConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    pub fn monitoring_period(&self) -> Duration {
        Duration::from_millis(self.monitoring_period_ms)
    }
}

/// Token bucket settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Bucket capacity
    pub capacity: u32,
    /// Base refill rate (tokens per second)
    pub refill_rate: f64,
    /// Burst capacity = capacity * burst_multiplier
    pub burst_multiplier: f64,
    /// Adapt refill rate and burst capacity to recent usage
    pub adaptive_refill: bool,
    /// Usage fraction above which acquisitions are slowed down
    pub throttle_threshold: f64,
    /// Token fraction below which a short slowdown is applied
    pub buffer_percent: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 60,
            refill_rate: 1.0,
            burst_multiplier: 1.5,
            adaptive_refill: true,
            throttle_threshold: 0.8,
            buffer_percent: 0.1,
        }
    }
}

impl RateLimitConfig {
    pub fn burst_capacity(&self) -> f64 {
        self.capacity as f64 * self.burst_multiplier
    }
}

/// Fallback cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: 300_000 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Upstream client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Attempts per call including the first one
    pub max_attempts: u32,
    /// Concurrent fetches per batch
    pub batch_size: usize,
    /// Pause between batches (ms)
    pub batch_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: radar_polymarket::GAMMA_API_BASE.to_string(),
            timeout_ms: 30_000,
            max_attempts: 3,
            batch_size: 5,
            batch_delay_ms: 1_000,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Complete radar configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub circuit: CircuitConfig,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
    pub client: ClientConfig,
}

fn parse_var<T, F>(lookup: &F, key: &str, target: &mut T) -> RadarResult<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| RadarError::config(format!("Invalid {}={:?}: {}", key, raw, e)))?;
    }
    Ok(())
}

impl RadarConfig {
    /// Load configuration from `RADAR_*` environment variables
    pub fn from_env() -> RadarResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> RadarResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let c = &mut config.circuit;
        parse_var(&lookup, "RADAR_FAILURE_THRESHOLD", &mut c.failure_threshold)?;
        parse_var(&lookup, "RADAR_RESET_TIMEOUT_MS", &mut c.reset_timeout_ms)?;
        parse_var(&lookup, "RADAR_HALF_OPEN_MAX_CALLS", &mut c.half_open_max_calls)?;
        parse_var(&lookup, "RADAR_MONITORING_PERIOD_MS", &mut c.monitoring_period_ms)?;
        parse_var(&lookup, "RADAR_SUCCESS_THRESHOLD", &mut c.success_threshold)?;
        parse_var(&lookup, "RADAR_VOLUME_THRESHOLD", &mut c.volume_threshold)?;

        let r = &mut config.rate_limit;
        parse_var(&lookup, "RADAR_BUCKET_CAPACITY", &mut r.capacity)?;
        parse_var(&lookup, "RADAR_REFILL_RATE", &mut r.refill_rate)?;
        parse_var(&lookup, "RADAR_BURST_MULTIPLIER", &mut r.burst_multiplier)?;
        parse_var(&lookup, "RADAR_ADAPTIVE_REFILL", &mut r.adaptive_refill)?;
        parse_var(&lookup, "RADAR_THROTTLE_THRESHOLD", &mut r.throttle_threshold)?;
        parse_var(&lookup, "RADAR_BUFFER_PERCENT", &mut r.buffer_percent)?;

        parse_var(&lookup, "RADAR_CACHE_TTL_MS", &mut config.cache.ttl_ms)?;

        let cl = &mut config.client;
        parse_var(&lookup, "RADAR_GAMMA_BASE_URL", &mut cl.base_url)?;
        parse_var(&lookup, "RADAR_HTTP_TIMEOUT_MS", &mut cl.timeout_ms)?;
        parse_var(&lookup, "RADAR_MAX_ATTEMPTS", &mut cl.max_attempts)?;
        parse_var(&lookup, "RADAR_BATCH_SIZE", &mut cl.batch_size)?;
        parse_var(&lookup, "RADAR_BATCH_DELAY_MS", &mut cl.batch_delay_ms)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the components cannot work with
    pub fn validate(&self) -> RadarResult<()> {
        let c = &self.circuit;
        if c.failure_threshold == 0 || c.success_threshold == 0 || c.half_open_max_calls == 0 {
            return Err(RadarError::config(
                "circuit thresholds and half-open calls must be at least 1",
            ));
        }
        if c.success_threshold > c.half_open_max_calls {
            return Err(RadarError::config(
                "success threshold cannot exceed half-open max calls",
            ));
        }
        if c.monitoring_period_ms == 0 {
            return Err(RadarError::config("monitoring period must be positive"));
        }

        let r = &self.rate_limit;
        if r.capacity == 0 {
            return Err(RadarError::config("bucket capacity must be at least 1"));
        }
        if !(r.refill_rate.is_finite() && r.refill_rate > 0.0) {
            return Err(RadarError::config("refill rate must be positive"));
        }
        if !(r.burst_multiplier.is_finite() && r.burst_multiplier >= 1.0) {
            return Err(RadarError::config("burst multiplier must be >= 1"));
        }
        if !(r.throttle_threshold > 0.0 && r.throttle_threshold <= 1.0) {
            return Err(RadarError::config("throttle threshold must be in (0, 1]"));
        }
        if !(0.0..1.0).contains(&r.buffer_percent) {
            return Err(RadarError::config("buffer percent must be in [0, 1)"));
        }

        let cl = &self.client;
        if cl.max_attempts == 0 || cl.batch_size == 0 {
            return Err(RadarError::config("max attempts and batch size must be at least 1"));
        }
        Ok(())
    }
}
