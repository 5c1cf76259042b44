//! Trending score computation and ranking

use chrono::{DateTime, Utc};
use radar_core::Event;
use tracing::debug;

use crate::analysis::analyze_markets;
use crate::multi_period::analyze_periods;
use crate::quality::{age_days, assess_quality, event_volume, event_volume_24h};
use crate::stats::log_scaled;
use crate::types::{
    MarketAnalysis, MultiPeriodAnalysis, QualityMetrics, RankedEvent, RankingConfig,
    RankingFactors,
};

/// Pure ranking engine.
///
/// Holds no mutable state; the only input besides the events is the clock,
/// which can be pinned with [`RankingEngine::at`].
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    config: RankingConfig,
    now: Option<DateTime<Utc>>,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config, now: None }
    }

    /// Evaluate recency against a fixed instant instead of the wall clock
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn factors(
        &self,
        event: &Event,
        analysis: &MarketAnalysis,
        multi_period: &MultiPeriodAnalysis,
        quality: &QualityMetrics,
        now: DateTime<Utc>,
    ) -> RankingFactors {
        let liquidity = if analysis.total_liquidity > 0.0 {
            analysis.total_liquidity
        } else {
            event.liquidity
        };

        let recency_score = age_days(event, now)
            .map(|age| (-age / self.config.recency_half_life_days).exp())
            .unwrap_or(0.0);

        let multi_period_volume_score = 0.4 * multi_period.momentum
            + 0.3 * multi_period.consistency
            + 0.3 * multi_period.growth.max(0.0);

        let cross_market_correlation_score =
            (1.0 - 2.0 * (analysis.average_correlation() - 0.5).abs()).max(0.0);

        RankingFactors {
            total_volume_score: log_scaled(event_volume(event, analysis), 6.0),
            total_liquidity_score: log_scaled(liquidity, 6.0),
            average_competitive_score: analysis.average_competitive.clamp(0.0, 1.0),
            market_count_score: (analysis.market_count as f64 / 10.0).min(1.0),
            recency_score,
            activity_24h_score: log_scaled(event_volume_24h(event), 5.0),
            multi_period_volume_score,
            event_quality_score: quality.overall_score,
            cross_market_correlation_score,
            market_diversity_score: quality.diversity.score,
            liquidity_distribution_score: quality.liquidity.distribution,
        }
    }

    /// Score a single event
    pub fn score(&self, event: Event) -> RankedEvent {
        self.score_at(event, self.now())
    }

    fn score_at(&self, event: Event, now: DateTime<Utc>) -> RankedEvent {
        let market_analysis = analyze_markets(&event);
        let multi_period = analyze_periods(
            &event,
            market_analysis.average_abs_correlation(),
            &self.config,
        );
        let quality = assess_quality(&event, &market_analysis, now, &self.config);
        let factors = self.factors(&event, &market_analysis, &multi_period, &quality, now);

        let score = factors.weighted(&self.config.weights);
        let trending_score = if score.is_finite() { score } else { 0.0 };

        RankedEvent {
            event,
            trending_score,
            factors,
            market_analysis,
            multi_period,
            quality,
        }
    }

    /// Score every event and sort by trending score, highest first.
    ///
    /// The sort is stable: events with equal scores keep their input order.
    pub fn rank(&self, events: Vec<Event>) -> Vec<RankedEvent> {
        let now = self.now();
        let count = events.len();

        let mut ranked: Vec<RankedEvent> =
            events.into_iter().map(|e| self.score_at(e, now)).collect();
        ranked.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));

        if let Some(top) = ranked.first() {
            debug!(
                "Ranked {} events, top: {} ({:.3})",
                count, top.event.id, top.trending_score
            );
        }
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use radar_core::Market;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_recency_decay() {
        let now = fixed_now();
        let engine = RankingEngine::default().at(now);

        let fresh = engine.score(Event {
            created_at: Some(now),
            ..Event::default()
        });
        let two_weeks = engine.score(Event {
            created_at: Some(now - Duration::days(14)),
            ..Event::default()
        });
        let undated = engine.score(Event::default());

        assert!((fresh.factors.recency_score - 1.0).abs() < 1e-9);
        assert!((two_weeks.factors.recency_score - (-1.0f64).exp()).abs() < 1e-9);
        assert_eq!(undated.factors.recency_score, 0.0);
    }

    #[test]
    fn test_start_date_stands_in_for_creation() {
        let now = fixed_now();
        let ranked = RankingEngine::default().at(now).score(Event {
            start_date: Some(now - Duration::days(7)),
            ..Event::default()
        });
        assert!((ranked.factors.recency_score - (-0.5f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_score_peaks_at_half() {
        let event = Event {
            markets: vec![
                Market {
                    id: "a".to_string(),
                    outcome_prices: vec![0.9, 0.1],
                    ..Market::default()
                },
                Market {
                    id: "b".to_string(),
                    outcome_prices: vec![0.4, 0.6],
                    ..Market::default()
                },
            ],
            ..Event::default()
        };
        let ranked = RankingEngine::default().at(fixed_now()).score(event);
        assert!((ranked.factors.cross_market_correlation_score - 1.0).abs() < 1e-9);
        assert!((ranked.factors.market_count_score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_trending_score_matches_weights() {
        let engine = RankingEngine::default().at(fixed_now());
        let ranked = engine.score(Event {
            volume: 1_000_000.0,
            ..Event::default()
        });
        let expected = ranked.factors.weighted(&engine.config().weights);
        assert!((ranked.trending_score - expected).abs() < 1e-12);
        assert!((ranked.factors.total_volume_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rank_empty() {
        assert!(RankingEngine::default().rank(Vec::new()).is_empty());
    }
}
