//! Event acquisition and ranking service
//!
//! Every upstream call goes through the [`Orchestrator`], so discovery and
//! detail lookups share one circuit breaker, one rate limiter and one
//! fallback cache.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use radar_core::{CircuitState, Event, Market, RadarError, RadarResult};
use radar_polymarket::{
    validate_event, validate_event_page, EventFilter, EventPage, EventSource, GammaClient,
    MAX_PAGE_SIZE,
};
use radar_ranking::{
    MarketAnalysis, MarketCorrelation, MultiPeriodAnalysis, QualityMetrics, RankedEvent,
    RankingEngine, RankingFactors,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::circuit_breaker::CircuitStats;
use crate::config::RadarConfig;
use crate::fallback_cache::CacheStats;
use crate::orchestrator::{Fetched, Orchestrator, OrchestratorResult};
use crate::rate_limiter::RateLimitStatus;
use crate::retry::RetryExecutor;

const EVENTS_PATH: &str = "/events";

/// Upper bound for [`EventService::discover_all_events`] when none is given
pub const DEFAULT_MAX_EVENTS: usize = 500;

/// Ranking output for a single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetrics {
    pub trending_score: f64,
    pub factors: RankingFactors,
    pub market_analysis: MarketAnalysis,
    pub multi_period: MultiPeriodAnalysis,
    pub quality: QualityMetrics,
}

/// An event with its markets, pairwise correlations and ranking metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub event: Event,
    pub markets: Vec<Market>,
    pub correlations: Vec<MarketCorrelation>,
    pub metrics: EventMetrics,
}

impl From<RankedEvent> for EventDetails {
    fn from(ranked: RankedEvent) -> Self {
        Self {
            markets: ranked.event.markets.clone(),
            correlations: ranked.market_analysis.correlations.clone(),
            event: ranked.event,
            metrics: EventMetrics {
                trending_score: ranked.trending_score,
                factors: ranked.factors,
                market_analysis: ranked.market_analysis,
                multi_period: ranked.multi_period,
                quality: ranked.quality,
            },
        }
    }
}

/// An id that could not be fetched in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

/// Result of [`EventService::fetch_events_batch`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Fetched events, in request order
    pub events: Vec<Event>,
    pub failures: Vec<BatchFailure>,
    /// How many of `events` were served from the fallback cache
    pub fallback_hits: usize,
}

/// Combined view of the resilience components
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    /// True while the circuit is closed
    pub healthy: bool,
    pub source: String,
    pub circuit: CircuitStats,
    pub rate_limit: RateLimitStatus,
    pub cache: CacheStats,
}

/// Service for discovering, fetching and ranking prediction-market events
pub struct EventService {
    source: Arc<dyn EventSource>,
    orchestrator: Orchestrator,
    ranking: RankingEngine,
    config: RadarConfig,
}

impl EventService {
    pub fn new(source: Arc<dyn EventSource>, config: RadarConfig) -> Self {
        let orchestrator = Orchestrator::new(source.name(), &config);
        Self {
            source,
            orchestrator,
            ranking: RankingEngine::default(),
            config,
        }
    }

    /// Build a service backed by the Gamma HTTP client
    pub fn from_config(config: RadarConfig) -> RadarResult<Self> {
        config.validate()?;
        let client = GammaClient::with_config(&config.client.base_url, config.client.timeout())?;
        info!(base_url = client.base_url(), "Created Gamma event source");
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn with_ranking(mut self, ranking: RankingEngine) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.orchestrator = self.orchestrator.with_retry(retry);
        self
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Discover events matching `filter`
    #[instrument(skip(self))]
    pub async fn discover_events(&self, filter: &EventFilter) -> OrchestratorResult<Vec<Event>> {
        let fetched = self.discover_page(filter).await?;
        Ok(fetched.map(|page| page.events))
    }

    /// One `/events` page, keeping how many entries the upstream sent
    pub async fn discover_page(&self, filter: &EventFilter) -> OrchestratorResult<EventPage> {
        let key = filter.cache_key();
        let query = filter.to_query();
        let query = query.as_slice();
        let source = self.source.as_ref();

        let fetched = self
            .orchestrator
            .execute_cached(&key, move || async move {
                let raw = source.fetch_raw(EVENTS_PATH, query).await?;
                validate_event_page(raw).into_result()
            })
            .await?;

        debug!(
            count = fetched.data.events.len(),
            upstream_count = fetched.data.upstream_count,
            from_fallback = fetched.from_fallback,
            "Discovered events"
        );
        Ok(fetched)
    }

    /// Fetch a single event by id
    #[instrument(skip(self))]
    pub async fn fetch_event(&self, id: &str) -> OrchestratorResult<Event> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RadarError::validation("event id must not be empty"));
        }

        let key = format!("event:{}", id);
        let path = format!("{}/{}", EVENTS_PATH, id);
        let path = path.as_str();
        let source = self.source.as_ref();

        self.orchestrator
            .execute_cached(&key, move || async move {
                let raw = source.fetch_raw(path, &[]).await?;
                validate_event(raw).into_result()
            })
            .await
    }

    /// Fetch an event and compute its market correlations and ranking metrics
    #[instrument(skip(self))]
    pub async fn fetch_event_with_markets(&self, id: &str) -> OrchestratorResult<EventDetails> {
        let fetched = self.fetch_event(id).await?;
        Ok(fetched.map(|event| EventDetails::from(self.ranking.score(event))))
    }

    /// Rank events by trending score, highest first
    pub fn rank_events(&self, events: Vec<Event>) -> Vec<RankedEvent> {
        self.ranking.rank(events)
    }

    /// Page through `/events` until a short page or `max_events`.
    ///
    /// A page is short when the upstream sent fewer than a full page of
    /// entries, regardless of how many survived validation.
    ///
    /// A failure on the first page is returned; a failure on a later page
    /// ends pagination with what was collected so far.
    #[instrument(skip(self))]
    pub async fn discover_all_events(
        &self,
        filter: &EventFilter,
        max_events: Option<usize>,
    ) -> OrchestratorResult<Vec<Event>> {
        let max_events = max_events.unwrap_or(DEFAULT_MAX_EVENTS);
        let page_size = MAX_PAGE_SIZE as usize;
        let mut offset = filter.offset.unwrap_or(0);
        let mut events: Vec<Event> = Vec::new();
        let mut from_fallback = false;
        let mut page_number = 0;

        while events.len() < max_events {
            let page = filter.page(MAX_PAGE_SIZE, offset);
            match self.discover_page(&page).await {
                Ok(fetched) => {
                    from_fallback |= fetched.from_fallback;
                    let upstream_count = fetched.data.upstream_count;
                    events.extend(fetched.data.events);
                    if upstream_count < page_size {
                        break;
                    }
                    offset += MAX_PAGE_SIZE;
                }
                Err(e) if page_number == 0 => return Err(e),
                Err(e) => {
                    warn!(page = page_number, offset, "Stopping pagination early: {}", e);
                    break;
                }
            }
            page_number += 1;
        }

        events.truncate(max_events);
        info!(
            count = events.len(),
            pages = page_number + 1,
            from_fallback,
            "Discovered all events"
        );
        Ok(Fetched {
            data: events,
            from_fallback,
        })
    }

    /// Fetch many events in concurrent batches.
    ///
    /// A failed id is recorded and skipped; it never aborts the batch.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn fetch_events_batch(&self, ids: &[String]) -> BatchOutcome {
        let batch_size = self.config.client.batch_size.max(1);
        let delay = self.config.client.batch_delay();
        let mut outcome = BatchOutcome::default();

        for (index, batch) in ids.chunks(batch_size).enumerate() {
            if index > 0 && delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }

            let results = join_all(batch.iter().map(|id| self.fetch_event(id))).await;
            for (id, result) in batch.iter().zip(results) {
                match result {
                    Ok(fetched) => {
                        if fetched.from_fallback {
                            outcome.fallback_hits += 1;
                        }
                        outcome.events.push(fetched.data);
                    }
                    Err(e) => {
                        warn!(id = %id, "Batch fetch failed: {}", e);
                        outcome.failures.push(BatchFailure {
                            id: id.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            fetched = outcome.events.len(),
            failed = outcome.failures.len(),
            fallback_hits = outcome.fallback_hits,
            "Batch fetch complete"
        );
        outcome
    }

    /// Discover, rank and keep the `top_n` highest scoring events
    #[instrument(skip(self))]
    pub async fn discover_trending(
        &self,
        filter: &EventFilter,
        top_n: usize,
    ) -> OrchestratorResult<Vec<RankedEvent>> {
        let fetched = self.discover_events(filter).await?;
        Ok(fetched.map(|events| {
            let mut ranked = self.ranking.rank(events);
            ranked.truncate(top_n);
            ranked
        }))
    }

    pub fn health(&self) -> ServiceHealth {
        let circuit = self.orchestrator.circuit_stats();
        ServiceHealth {
            healthy: circuit.state == CircuitState::Closed,
            source: self.source.name().to_string(),
            circuit,
            rate_limit: self.orchestrator.rate_limit_status(),
            cache: self.orchestrator.cache_stats(),
        }
    }

    pub fn circuit_stats(&self) -> CircuitStats {
        self.orchestrator.circuit_stats()
    }

    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.orchestrator.rate_limit_status()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.orchestrator.cache_stats()
    }

    pub fn reset_circuit_breaker(&self) {
        info!("Resetting circuit breaker");
        self.orchestrator.reset_circuit_breaker();
    }

    pub fn reset_rate_limiter(&self) {
        info!("Resetting rate limiter");
        self.orchestrator.reset_rate_limiter();
    }

    pub fn clear_cache(&self) {
        info!("Clearing fallback cache");
        self.orchestrator.clear_cache();
    }
}
