//! Trending and quality ranking for prediction-market events
//!
//! Everything in this crate is pure computation over `radar-core` events:
//! no I/O and no shared state.
//!
//! ## Passes
//! - Market analysis: volume/liquidity shares, dominant market, price correlations
//! - Multi-period analysis: Gini, trend, momentum, consistency and growth over
//!   the 24h / 1wk / 1mo / 1yr windows
//! - Quality metrics: liquidity, market quality, balance, diversity and risk
//! - Ranking factors: eleven normalised sub-scores combined into a trending score

pub mod analysis;
pub mod engine;
pub mod multi_period;
pub mod quality;
pub mod stats;
pub mod types;

pub use analysis::{analyze_markets, price_correlation};
pub use engine::RankingEngine;
pub use multi_period::analyze_periods;
pub use quality::{assess_quality, resolution_reliability};
pub use stats::gini;
pub use types::{
    CompetitiveBalance, CorrelationKind, DiversityMetrics, LiquidityQuality, MarketAnalysis,
    MarketCorrelation, MarketQuality, MarketShare, MultiPeriodAnalysis, PeriodAnalysis,
    QualityMetrics, RankedEvent, RankingConfig, RankingFactors, RiskMetrics, Trend,
    DEFAULT_WEIGHTS, FACTOR_COUNT,
};
