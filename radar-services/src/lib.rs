//! Resilient acquisition services for the Prediction Radar
//!
//! This crate wraps an upstream [`radar_polymarket::EventSource`] in a
//! circuit breaker, an adaptive rate limiter, a retry executor and a
//! fallback cache, and exposes event discovery and ranking on top.

pub mod circuit_breaker;
pub mod config;
pub mod event_service;
pub mod fallback_cache;
pub mod orchestrator;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitRejection, CircuitResult, CircuitStats};
pub use config::{CacheConfig, CircuitConfig, ClientConfig, RadarConfig, RateLimitConfig};
pub use event_service::{
    BatchFailure, BatchOutcome, EventDetails, EventMetrics, EventService, ServiceHealth,
    DEFAULT_MAX_EVENTS,
};
pub use fallback_cache::{CacheStats, FallbackCache};
pub use orchestrator::{Fallback, Fetched, Orchestrator, OrchestratorResult};
pub use rate_limiter::{RateLimitStatus, RateLimiter};
pub use retry::{RetryExecutor, RetryFailure, RetryResult};
