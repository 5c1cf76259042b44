//! Resilient call orchestration
//!
//! `execute` consults the circuit breaker, waits on the rate limiter, runs
//! the call through the retry executor, records the outcome and falls back
//! when the live path is blocked or fails.

use std::future::Future;

use futures::future::BoxFuture;
use radar_core::{CircuitState, RadarError, RadarResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitStats};
use crate::config::RadarConfig;
use crate::fallback_cache::{CacheStats, FallbackCache};
use crate::rate_limiter::{RateLimitStatus, RateLimiter};
use crate::retry::{RetryExecutor, RetryFailure};

/// A result together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    pub data: T,
    /// True when the live call was skipped or failed and a fallback answered
    pub from_fallback: bool,
}

impl<T> Fetched<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            from_fallback: false,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            from_fallback: true,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            from_fallback: self.from_fallback,
        }
    }
}

pub type OrchestratorResult<T> = RadarResult<Fetched<T>>;

/// Deferred fallback computation
pub type Fallback<'a, T> = BoxFuture<'a, RadarResult<T>>;

pub struct Orchestrator {
    breaker: CircuitBreaker,
    limiter: RateLimiter,
    retry: RetryExecutor,
    cache: FallbackCache,
}

impl Orchestrator {
    pub fn new(name: &str, config: &RadarConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(name, config.circuit.clone()),
            limiter: RateLimiter::new(name, config.rate_limit.clone()),
            retry: RetryExecutor::new(config.client.max_attempts),
            cache: FallbackCache::new(config.cache.ttl()),
        }
    }

    /// Replace the retry policy (e.g. a shorter backoff)
    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &FallbackCache {
        &self.cache
    }

    pub fn circuit_stats(&self) -> CircuitStats {
        self.breaker.stats()
    }

    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.limiter.status()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Fallback that serves the last good result stored under `key`
    pub fn cache_fallback<'a, T>(&'a self, key: &str) -> Fallback<'a, T>
    where
        T: DeserializeOwned + Send + 'a,
    {
        let key = key.to_string();
        Box::pin(async move {
            self.cache
                .get::<T>(&key)
                .ok_or_else(|| RadarError::not_found(format!("cached result for {}", key)))
        })
    }

    /// Run `primary` under the full resilience stack.
    ///
    /// Successful results are cached under `name`. `fallback` is only
    /// awaited when the circuit rejects the call, or when the call failed
    /// and the circuit is now open or the error was transient.
    pub async fn execute<T, F, Fut>(
        &self,
        name: &str,
        primary: F,
        fallback: Option<Fallback<'_, T>>,
    ) -> OrchestratorResult<T>
    where
        T: Serialize,
        F: FnMut() -> Fut,
        Fut: Future<Output = RadarResult<T>>,
    {
        if let Err(rejection) = self.breaker.check() {
            let Some(fallback) = fallback else {
                debug!(operation = name, state = %rejection.state, "Circuit rejected call, no fallback");
                return Err(rejection.into_error(false));
            };
            return match fallback.await {
                Ok(data) => {
                    info!(operation = name, state = %rejection.state, "Circuit rejected call, served fallback");
                    Ok(Fetched::fallback(data))
                }
                Err(e) => {
                    warn!(operation = name, state = %rejection.state, "Circuit rejected call and fallback failed: {}", e);
                    Err(rejection.into_error(true))
                }
            };
        }

        self.limiter.acquire().await;

        match self.retry.run(name, primary).await {
            Ok(data) => {
                self.breaker.record_success();
                if let Err(e) = self.cache.put(name, &data) {
                    warn!(operation = name, "Failed to cache result: {}", e);
                }
                Ok(Fetched::live(data))
            }
            Err(RetryFailure { attempts, error }) => {
                self.breaker.record_failure();
                let circuit_open = self.breaker.state() == CircuitState::Open;
                warn!(
                    operation = name,
                    attempts,
                    circuit_open,
                    %error,
                    "Call failed"
                );

                let eligible = circuit_open || error.is_retryable();
                match fallback {
                    Some(fallback) if eligible => match fallback.await {
                        Ok(data) => {
                            info!(operation = name, "Served fallback after failure");
                            Ok(Fetched::fallback(data))
                        }
                        Err(fallback_error) => {
                            Err(RadarError::fallback_exhausted(error, fallback_error))
                        }
                    },
                    _ => Err(error),
                }
            }
        }
    }

    /// [`execute`](Self::execute) with the cached result for `name` as fallback
    pub async fn execute_cached<T, F, Fut>(&self, name: &str, primary: F) -> OrchestratorResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnMut() -> Fut,
        Fut: Future<Output = RadarResult<T>>,
    {
        let fallback = self.cache_fallback::<T>(name);
        self.execute(name, primary, Some(fallback)).await
    }

    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
    }

    pub fn reset_rate_limiter(&self) {
        self.limiter.reset();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
