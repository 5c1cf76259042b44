//! Quality and risk assessment of an event

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use radar_core::Event;
use regex::Regex;

use crate::stats::{coefficient_of_variation, consistency, gini, mean};
use crate::types::{
    CompetitiveBalance, DiversityMetrics, LiquidityQuality, MarketAnalysis, MarketQuality,
    QualityMetrics, RankingConfig, RiskMetrics,
};

const OFFICIAL_SOURCES: [&str; 5] = [
    "official",
    "government",
    ".gov",
    "reuters",
    "associated press",
];
const MEDIA_SOURCES: [&str; 3] = ["news", "media", "press"];

const STOPWORDS: [&str; 32] = [
    "will", "what", "when", "where", "which", "who", "that", "this", "with", "from", "have",
    "been", "before", "after", "than", "more", "less", "into", "over", "under", "about", "there",
    "their", "they", "would", "could", "should", "does", "other", "above", "below", "between",
];

/// Days after which an event counts as fully mature
const MATURITY_DAYS: f64 = 30.0;
/// Number of distinct topic words that maps to full topic diversity
const TOPIC_WORDS: f64 = 20.0;

/// Lower-cased alphanumeric words of `text`
pub(crate) fn words(text: &str) -> Vec<String> {
    let Ok(word) = Regex::new(r"[a-z0-9]+") else {
        return Vec::new();
    };
    let lower = text.to_lowercase();
    word.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Aggregate volume, preferring the per-market sum
pub(crate) fn event_volume(event: &Event, analysis: &MarketAnalysis) -> f64 {
    if analysis.total_volume > 0.0 {
        analysis.total_volume
    } else {
        event.volume
    }
}

/// 24h volume, preferring the per-market sum
pub(crate) fn event_volume_24h(event: &Event) -> f64 {
    let sum: f64 = event.markets.iter().map(|m| m.period_volumes.volume_24h).sum();
    if sum > 0.0 {
        sum
    } else {
        event.period_volumes.volume_24h.max(0.0)
    }
}

/// Age of the event in days, `None` when no creation or start date is known
pub(crate) fn age_days(event: &Event, now: DateTime<Utc>) -> Option<f64> {
    event
        .created()
        .map(|created| ((now - created).num_seconds() as f64 / 86_400.0).max(0.0))
}

/// Keyword heuristic over the resolution source text
pub fn resolution_reliability(source: Option<&str>) -> f64 {
    let Some(text) = source else {
        return 0.5;
    };
    let lower = text.to_lowercase();
    let tokens = words(&lower);

    if OFFICIAL_SOURCES.iter().any(|k| lower.contains(k)) || tokens.iter().any(|w| w == "ap") {
        0.9
    } else if MEDIA_SOURCES.iter().any(|k| lower.contains(k)) {
        0.7
    } else {
        0.5
    }
}

fn liquidity_quality(event: &Event, analysis: &MarketAnalysis, config: &RankingConfig) -> LiquidityQuality {
    let liquidities: Vec<f64> = event.markets.iter().map(|m| m.liquidity).collect();
    let total = if analysis.total_liquidity > 0.0 {
        analysis.total_liquidity
    } else {
        event.liquidity
    };
    let average = if liquidities.is_empty() {
        total
    } else {
        total / liquidities.len() as f64
    };

    let distribution = 1.0 - gini(&liquidities);
    let depth = if liquidities.is_empty() {
        0.0
    } else {
        liquidities.iter().filter(|l| **l > config.deep_liquidity).count() as f64
            / liquidities.len() as f64
    };
    let stability = consistency(&liquidities);

    LiquidityQuality {
        total,
        average,
        distribution,
        depth,
        stability,
        score: mean(&[distribution, depth, stability]),
    }
}

fn market_quality(event: &Event, analysis: &MarketAnalysis, now: DateTime<Utc>) -> MarketQuality {
    let competitive: Vec<f64> = event.markets.iter().filter_map(|m| m.competitive).collect();
    let competitive_consistency = if competitive.is_empty() {
        0.0
    } else {
        consistency(&competitive)
    };

    let volume = event_volume(event, analysis);
    let activity_ratio = if volume > 0.0 {
        (event_volume_24h(event) / volume).min(1.0)
    } else {
        0.0
    };
    let age_score = age_days(event, now)
        .map(|d| (d / MATURITY_DAYS).min(1.0))
        .unwrap_or(0.0);
    let maturity = 0.3 * age_score + 0.7 * activity_ratio;

    let resolution_reliability = resolution_reliability(event.resolution_text());

    let average_competitive = analysis.average_competitive;
    MarketQuality {
        average_competitive,
        competitive_consistency,
        maturity,
        resolution_reliability,
        trading_activity: activity_ratio,
        score: mean(&[
            average_competitive,
            competitive_consistency,
            maturity,
            resolution_reliability,
            activity_ratio,
        ]),
    }
}

fn competitive_balance(event: &Event) -> CompetitiveBalance {
    let per_market: Vec<f64> = event
        .markets
        .iter()
        .filter(|m| m.outcome_prices.len() >= 2)
        .map(|m| 1.0 - coefficient_of_variation(&m.outcome_prices).min(1.0))
        .collect();
    let outcome_balance = if per_market.is_empty() { 0.5 } else { mean(&per_market) };

    // No per-outcome volume or liquidity is available, so these stay neutral
    let volume_balance = 0.5;
    let liquidity_balance = 0.5;

    CompetitiveBalance {
        outcome_balance,
        volume_balance,
        liquidity_balance,
        score: mean(&[outcome_balance, volume_balance, liquidity_balance]),
    }
}

/// Question buckets: prediction, selection, timing, quantity
fn market_type_buckets(question: &str) -> [bool; 4] {
    let tokens = words(question);
    let has = |w: &str| tokens.iter().any(|t| t == w);
    let joined = format!(" {} ", tokens.join(" "));
    let phrase = |p: &str| joined.contains(&format!(" {} ", p));

    [
        has("will") || has("win") || has("happen"),
        has("who") || has("which"),
        has("when") || has("before") || has("by"),
        ["how many", "how much", "above", "below", "more than", "less than"]
            .iter()
            .any(|p| phrase(p)),
    ]
}

fn diversity(event: &Event) -> DiversityMetrics {
    let mut buckets = [false; 4];
    for m in &event.markets {
        for (seen, hit) in buckets.iter_mut().zip(market_type_buckets(&m.question)) {
            *seen |= hit;
        }
    }
    let market_type = buckets.iter().filter(|b| **b).count() as f64 / 4.0;

    let outcome_counts: Vec<f64> = event
        .markets
        .iter()
        .map(|m| m.outcomes.len().max(m.outcome_prices.len()) as f64)
        .collect();
    let outcome = if outcome_counts.is_empty() {
        0.0
    } else {
        ((mean(&outcome_counts) - 2.0) / 3.0).clamp(0.0, 1.0)
    };

    let volumes: Vec<f64> = event.markets.iter().map(|m| m.volume).collect();
    let participant = 1.0 - gini(&volumes);

    let mut topics: HashSet<String> = std::iter::once(event.title.as_str())
        .chain(event.markets.iter().map(|m| m.question.as_str()))
        .flat_map(words)
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.as_str()))
        .collect();
    topics.extend(event.tags.iter().map(|t| t.to_lowercase()));
    let topic = (topics.len() as f64 / TOPIC_WORDS).min(1.0);

    DiversityMetrics {
        market_type,
        outcome,
        participant,
        topic,
        score: mean(&[market_type, outcome, participant, topic]),
    }
}

fn risk(
    event: &Event,
    analysis: &MarketAnalysis,
    liquidity: &LiquidityQuality,
    reliability: f64,
) -> RiskMetrics {
    let volumes: Vec<f64> = event.markets.iter().map(|m| m.volume).collect();
    let liquidities: Vec<f64> = event.markets.iter().map(|m| m.liquidity).collect();

    let concentration = (gini(&volumes) + gini(&liquidities)) / 2.0;
    let correlation = analysis.average_abs_correlation();
    let liquidity_risk = 1.0 - ((liquidity.average.max(0.0) + 1.0).log10() / 5.0).min(1.0);
    let resolution = 1.0 - reliability;

    RiskMetrics {
        concentration,
        correlation,
        liquidity: liquidity_risk,
        resolution,
        overall: 0.30 * concentration + 0.25 * correlation + 0.25 * liquidity_risk + 0.20 * resolution,
    }
}

/// Full quality assessment of an event
pub fn assess_quality(
    event: &Event,
    analysis: &MarketAnalysis,
    now: DateTime<Utc>,
    config: &RankingConfig,
) -> QualityMetrics {
    let liquidity = liquidity_quality(event, analysis, config);
    let market = market_quality(event, analysis, now);
    let balance = competitive_balance(event);
    let diversity = diversity(event);
    let risk = risk(event, analysis, &liquidity, market.resolution_reliability);

    let overall_score = 0.25 * liquidity.score
        + 0.25 * market.score
        + 0.20 * balance.score
        + 0.15 * diversity.score
        + 0.15 * (1.0 - risk.overall);

    QualityMetrics {
        liquidity,
        market,
        balance,
        diversity,
        risk,
        overall_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_markets;
    use chrono::Duration;
    use radar_core::{Market, PeriodVolumes};

    fn market(id: &str, question: &str, volume: f64, liquidity: f64, prices: Vec<f64>) -> Market {
        Market {
            id: id.to_string(),
            question: question.to_string(),
            volume,
            liquidity,
            outcomes: vec!["Yes".to_string(), "No".to_string()],
            outcome_prices: prices,
            ..Market::default()
        }
    }

    #[test]
    fn test_resolution_keywords() {
        assert_eq!(resolution_reliability(Some("Official results from the FEC")), 0.9);
        assert_eq!(resolution_reliability(Some("https://www.bls.gov/cpi")), 0.9);
        assert_eq!(resolution_reliability(Some("AP race call")), 0.9);
        assert_eq!(resolution_reliability(Some("Major news outlets")), 0.7);
        assert_eq!(resolution_reliability(Some("Coingecko price")), 0.5);
        assert_eq!(resolution_reliability(None), 0.5);
        // "ap" only counts as a whole word
        assert_eq!(resolution_reliability(Some("Snapshot vote")), 0.5);
    }

    #[test]
    fn test_market_type_buckets() {
        assert_eq!(market_type_buckets("Will BTC hit $100k?"), [true, false, false, false]);
        assert_eq!(market_type_buckets("Who will win the race?"), [true, true, false, false]);
        assert_eq!(market_type_buckets("ETH above 5000 by June?"), [false, false, true, true]);
        assert_eq!(market_type_buckets("How many seats?"), [false, false, false, true]);
        assert_eq!(market_type_buckets("Willingness index"), [false; 4]);
    }

    #[test]
    fn test_balanced_binary_market() {
        let event = Event {
            markets: vec![market("a", "Will it happen?", 100.0, 100.0, vec![0.5, 0.5])],
            ..Event::default()
        };
        let balance = competitive_balance(&event);
        assert_eq!(balance.outcome_balance, 1.0);
        assert!((balance.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_liquidity_quality() {
        let event = Event {
            markets: vec![
                market("a", "", 0.0, 2000.0, vec![]),
                market("b", "", 0.0, 2000.0, vec![]),
                market("c", "", 0.0, 500.0, vec![]),
                market("d", "", 0.0, 500.0, vec![]),
            ],
            ..Event::default()
        };
        let analysis = analyze_markets(&event);
        let liquidity = liquidity_quality(&event, &analysis, &RankingConfig::default());
        assert_eq!(liquidity.total, 5000.0);
        assert_eq!(liquidity.average, 1250.0);
        assert_eq!(liquidity.depth, 0.5);
        assert!((liquidity.distribution - 0.7).abs() < 1e-9);
        assert!((liquidity.stability - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_maturity_uses_age_and_activity() {
        let now = Utc::now();
        let event = Event {
            created_at: Some(now - Duration::days(15)),
            markets: vec![Market {
                id: "m".to_string(),
                volume: 1000.0,
                period_volumes: PeriodVolumes {
                    volume_24h: 100.0,
                    ..PeriodVolumes::default()
                },
                ..Market::default()
            }],
            ..Event::default()
        };
        let analysis = analyze_markets(&event);
        let quality = market_quality(&event, &analysis, now);
        assert!((quality.trading_activity - 0.1).abs() < 1e-9);
        assert!((quality.maturity - (0.3 * 0.5 + 0.7 * 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_dates_do_not_add_maturity() {
        let event = Event::default();
        let quality = market_quality(&event, &analyze_markets(&event), Utc::now());
        assert_eq!(quality.maturity, 0.0);
    }

    #[test]
    fn test_topic_diversity_counts_tags_and_words() {
        let event = Event {
            title: "Bitcoin price prediction".to_string(),
            tags: vec!["Crypto".to_string(), "Bitcoin".to_string()],
            markets: vec![market("a", "Will Bitcoin close above target?", 0.0, 0.0, vec![])],
            ..Event::default()
        };
        let diversity = diversity(&event);
        // bitcoin, price, prediction, close, target, crypto
        assert!((diversity.topic - 6.0 / 20.0).abs() < 1e-9);
        assert_eq!(diversity.market_type, 0.5);
        assert_eq!(diversity.outcome, 0.0);
    }

    #[test]
    fn test_quality_scores_are_bounded() {
        let event = Event {
            title: "Election".to_string(),
            resolution_source: Some("Associated Press".to_string()),
            markets: vec![
                market("a", "Who will win?", 5000.0, 20_000.0, vec![0.6, 0.4]),
                market("b", "Will turnout be above 60%?", 100.0, 800.0, vec![0.1, 0.9]),
            ],
            ..Event::default()
        };
        let analysis = analyze_markets(&event);
        let quality = assess_quality(&event, &analysis, Utc::now(), &RankingConfig::default());
        assert_eq!(quality.market.resolution_reliability, 0.9);
        assert!((quality.risk.resolution - 0.1).abs() < 1e-9);
        for score in [
            quality.liquidity.score,
            quality.market.score,
            quality.balance.score,
            quality.diversity.score,
            quality.risk.overall,
            quality.overall_score,
        ] {
            assert!((0.0..=1.0).contains(&score), "score out of range: {}", score);
        }
    }
}
