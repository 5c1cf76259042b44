//! Output types of the ranking engine

use radar_core::{Event, Period};
use serde::{Deserialize, Serialize};

/// Number of ranking factors
pub const FACTOR_COUNT: usize = 11;

/// Default weights for the trending score, in [`RankingFactors::as_array`] order
pub const DEFAULT_WEIGHTS: [f64; FACTOR_COUNT] =
    [0.18, 0.15, 0.12, 0.10, 0.10, 0.08, 0.12, 0.08, 0.04, 0.02, 0.01];

/// Tunable ranking parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Recency decay constant in days (`exp(-age / half_life)`)
    pub recency_half_life_days: f64,
    /// Cap on each momentum ratio
    pub momentum_cap: f64,
    /// Divisor applied to the volume slope before clamping to [-1, 1]
    pub growth_divisor: f64,
    /// Markets with more liquidity than this count as "deep"
    pub deep_liquidity: f64,
    /// Trending score weights
    pub weights: [f64; FACTOR_COUNT],
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            recency_half_life_days: 14.0,
            momentum_cap: 2.0,
            growth_divisor: 1000.0,
            deep_liquidity: 1000.0,
            weights: DEFAULT_WEIGHTS,
        }
    }
}

/// Volume and liquidity share of one market inside its event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketShare {
    pub market_id: String,
    /// Percentage of the event's volume (0-100)
    pub volume_percent: f64,
    /// Percentage of the event's liquidity (0-100)
    pub liquidity_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationKind {
    Positive,
    Negative,
    Neutral,
}

impl CorrelationKind {
    pub fn classify(correlation: f64) -> Self {
        if correlation > 0.3 {
            CorrelationKind::Positive
        } else if correlation < -0.3 {
            CorrelationKind::Negative
        } else {
            CorrelationKind::Neutral
        }
    }
}

/// Price-similarity between two markets of the same event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCorrelation {
    pub market_a: String,
    pub market_b: String,
    /// `1 - |p_a - p_b|` over the first outcome prices
    pub correlation: f64,
    pub kind: CorrelationKind,
}

/// Cross-market breakdown of a single event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub market_count: usize,
    pub total_volume: f64,
    pub total_liquidity: f64,
    /// Mean of the markets that report a competitive score (0 if none do)
    pub average_competitive: f64,
    pub shares: Vec<MarketShare>,
    /// Market with the largest volume
    pub dominant_market: Option<String>,
    /// Liquid markets with comparatively little trading
    pub opportunity_markets: Vec<String>,
    pub correlations: Vec<MarketCorrelation>,
}

impl MarketAnalysis {
    /// Mean of the raw pairwise correlations (0 with fewer than two priced markets)
    pub fn average_correlation(&self) -> f64 {
        if self.correlations.is_empty() {
            return 0.0;
        }
        self.correlations.iter().map(|c| c.correlation).sum::<f64>() / self.correlations.len() as f64
    }

    /// Mean of the absolute pairwise correlations
    pub fn average_abs_correlation(&self) -> f64 {
        if self.correlations.is_empty() {
            return 0.0;
        }
        self.correlations.iter().map(|c| c.correlation.abs()).sum::<f64>()
            / self.correlations.len() as f64
    }
}

/// Volume statistics for one look-back window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAnalysis {
    pub period: Period,
    pub total_volume: f64,
    pub average_volume: f64,
    pub dominant_market_volume: f64,
    /// Gini coefficient of per-market volumes in this window
    pub gini: f64,
    pub average_correlation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Volume behaviour across the 24h / 1wk / 1mo / 1yr windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPeriodAnalysis {
    pub periods: Vec<PeriodAnalysis>,
    pub trend: Trend,
    /// Recent activity relative to weekly and monthly averages, in [0, 1]
    pub momentum: f64,
    /// `1 - min(1, cv)` over the period totals
    pub consistency: f64,
    /// Normalised least-squares slope over the period totals, in [-1, 1]
    pub growth: f64,
}

impl MultiPeriodAnalysis {
    pub fn period(&self, period: Period) -> Option<&PeriodAnalysis> {
        self.periods.iter().find(|p| p.period == period)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityQuality {
    pub total: f64,
    pub average: f64,
    /// `1 - gini` of per-market liquidity
    pub distribution: f64,
    /// Fraction of markets with deep liquidity
    pub depth: f64,
    /// Consistency of per-market liquidity
    pub stability: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuality {
    pub average_competitive: f64,
    pub competitive_consistency: f64,
    pub maturity: f64,
    pub resolution_reliability: f64,
    pub trading_activity: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveBalance {
    pub outcome_balance: f64,
    pub volume_balance: f64,
    pub liquidity_balance: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityMetrics {
    pub market_type: f64,
    pub outcome: f64,
    pub participant: f64,
    pub topic: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub concentration: f64,
    pub correlation: f64,
    pub liquidity: f64,
    pub resolution: f64,
    pub overall: f64,
}

/// Composite quality assessment of an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub liquidity: LiquidityQuality,
    pub market: MarketQuality,
    pub balance: CompetitiveBalance,
    pub diversity: DiversityMetrics,
    pub risk: RiskMetrics,
    pub overall_score: f64,
}

/// The eleven normalised sub-scores behind the trending score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingFactors {
    pub total_volume_score: f64,
    pub total_liquidity_score: f64,
    pub average_competitive_score: f64,
    pub market_count_score: f64,
    pub recency_score: f64,
    pub activity_24h_score: f64,
    pub multi_period_volume_score: f64,
    pub event_quality_score: f64,
    pub cross_market_correlation_score: f64,
    pub market_diversity_score: f64,
    pub liquidity_distribution_score: f64,
}

impl RankingFactors {
    pub fn as_array(&self) -> [f64; FACTOR_COUNT] {
        [
            self.total_volume_score,
            self.total_liquidity_score,
            self.average_competitive_score,
            self.market_count_score,
            self.recency_score,
            self.activity_24h_score,
            self.multi_period_volume_score,
            self.event_quality_score,
            self.cross_market_correlation_score,
            self.market_diversity_score,
            self.liquidity_distribution_score,
        ]
    }

    /// Weighted sum of the factors
    pub fn weighted(&self, weights: &[f64; FACTOR_COUNT]) -> f64 {
        self.as_array()
            .iter()
            .zip(weights.iter())
            .map(|(f, w)| f * w)
            .sum()
    }
}

/// An event together with everything the engine derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEvent {
    pub event: Event,
    pub trending_score: f64,
    pub factors: RankingFactors,
    pub market_analysis: MarketAnalysis,
    pub multi_period: MultiPeriodAnalysis,
    pub quality: QualityMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let sum: f64 = DEFAULT_WEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_classification() {
        assert_eq!(CorrelationKind::classify(0.9), CorrelationKind::Positive);
        assert_eq!(CorrelationKind::classify(0.3), CorrelationKind::Neutral);
        assert_eq!(CorrelationKind::classify(-0.31), CorrelationKind::Negative);
    }

    #[test]
    fn test_weighted_factors() {
        let factors = RankingFactors {
            total_volume_score: 1.0,
            recency_score: 0.5,
            ..RankingFactors::default()
        };
        assert!((factors.weighted(&DEFAULT_WEIGHTS) - 0.23).abs() < 1e-9);
    }
}
