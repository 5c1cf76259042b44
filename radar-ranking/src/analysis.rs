//! Cross-market analysis of a single event

use itertools::Itertools;
use radar_core::Event;

use crate::stats::mean;
use crate::types::{CorrelationKind, MarketAnalysis, MarketCorrelation, MarketShare};

/// Liquidity above which a thinly traded market is flagged as an opportunity
const OPPORTUNITY_LIQUIDITY: f64 = 1000.0;
/// Volume/liquidity ratio below which a liquid market counts as under-traded
const OPPORTUNITY_TURNOVER: f64 = 0.1;

fn percent(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total * 100.0 } else { 0.0 }
}

/// Price-similarity proxy between two markets.
///
/// This compares current first-outcome prices only; it is not a statistical
/// correlation over price history.
pub fn price_correlation(p1: f64, p2: f64) -> f64 {
    1.0 - (p1 - p2).abs()
}

/// Break an event down by market
pub fn analyze_markets(event: &Event) -> MarketAnalysis {
    let markets = &event.markets;
    let total_volume: f64 = markets.iter().map(|m| m.volume).sum();
    let total_liquidity: f64 = markets.iter().map(|m| m.liquidity).sum();

    let competitive: Vec<f64> = markets.iter().filter_map(|m| m.competitive).collect();

    let shares = markets
        .iter()
        .map(|m| MarketShare {
            market_id: m.id.clone(),
            volume_percent: percent(m.volume, total_volume),
            liquidity_percent: percent(m.liquidity, total_liquidity),
        })
        .collect();

    let dominant_market = markets
        .iter()
        .max_by(|a, b| a.volume.total_cmp(&b.volume))
        .map(|m| m.id.clone());

    let opportunity_markets = markets
        .iter()
        .filter(|m| {
            m.liquidity > OPPORTUNITY_LIQUIDITY && m.volume < m.liquidity * OPPORTUNITY_TURNOVER
        })
        .map(|m| m.id.clone())
        .collect();

    let correlations = markets
        .iter()
        .filter_map(|m| m.first_outcome_price().map(|p| (m, p)))
        .tuple_combinations()
        .map(|((a, pa), (b, pb))| {
            let correlation = price_correlation(pa, pb);
            MarketCorrelation {
                market_a: a.id.clone(),
                market_b: b.id.clone(),
                correlation,
                kind: CorrelationKind::classify(correlation),
            }
        })
        .collect();

    MarketAnalysis {
        market_count: markets.len(),
        total_volume,
        total_liquidity,
        average_competitive: mean(&competitive),
        shares,
        dominant_market,
        opportunity_markets,
        correlations,
    }
}
