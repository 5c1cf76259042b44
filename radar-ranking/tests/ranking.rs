//! Ranking engine behaviour over whole events

use chrono::{DateTime, Duration, Utc};
use radar_core::{Event, Market, PeriodVolumes};
use radar_ranking::{analyze_markets, gini, RankingEngine, Trend};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-06-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn market(id: &str, volume: f64, liquidity: f64, yes_price: f64) -> Market {
    Market {
        id: id.to_string(),
        question: format!("Will {} happen?", id),
        volume,
        liquidity,
        competitive: Some(0.8),
        outcomes: vec!["Yes".to_string(), "No".to_string()],
        outcome_prices: vec![yes_price, 1.0 - yes_price],
        active: true,
        period_volumes: PeriodVolumes {
            volume_24h: volume / 50.0,
            volume_1wk: volume / 8.0,
            volume_1mo: volume / 2.0,
            volume_1yr: volume,
        },
        ..Market::default()
    }
}

fn event(id: &str, markets: Vec<Market>) -> Event {
    Event {
        id: id.to_string(),
        title: format!("Event {}", id),
        created_at: Some(now() - Duration::days(3)),
        active: true,
        markets,
        ..Event::default()
    }
}

#[test]
fn gini_of_equal_values_is_zero() {
    for v in [0.5, 1.0, 250.0, 1e9] {
        assert_eq!(gini(&[v, v, v]), 0.0);
    }
}

#[test]
fn gini_approaches_single_market_limit() {
    for n in 2..8 {
        let mut values = vec![0.0; n - 1];
        values.push(1e12);
        let expected = (n as f64 - 1.0) / n as f64;
        assert!((gini(&values) - expected).abs() < 1e-9, "n = {}", n);
    }
}

#[test]
fn two_market_event_shares_and_concentration() {
    let e = event("split", vec![market("a", 100.0, 10.0, 0.5), market("b", 900.0, 10.0, 0.5)]);
    let analysis = analyze_markets(&e);
    let percents: Vec<f64> = analysis.shares.iter().map(|s| s.volume_percent).collect();
    assert!((percents[0] - 10.0).abs() < 1e-9);
    assert!((percents[1] - 90.0).abs() < 1e-9);

    let volumes: Vec<f64> = e.markets.iter().map(|m| m.volume).collect();
    assert!((gini(&volumes) - 0.4).abs() < 1e-9);
}

#[test]
fn rank_preserves_length_and_sorts_descending() {
    let events = vec![
        event("small", vec![market("s", 10.0, 5.0, 0.5)]),
        event("big", vec![market("b1", 50_000.0, 20_000.0, 0.4), market("b2", 30_000.0, 9_000.0, 0.7)]),
        event("empty", vec![]),
        event("mid", vec![market("m", 2_000.0, 1_500.0, 0.3)]),
    ];
    let ranked = RankingEngine::default().at(now()).rank(events);

    assert_eq!(ranked.len(), 4);
    for pair in ranked.windows(2) {
        assert!(pair[0].trending_score >= pair[1].trending_score);
    }
    assert_eq!(ranked[0].event.id, "big");
}

#[test]
fn equal_scores_keep_input_order() {
    let events: Vec<Event> = ["first", "second", "third"]
        .iter()
        .map(|id| event(id, vec![market("x", 500.0, 500.0, 0.5)]))
        .collect();
    let ranked = RankingEngine::default().at(now()).rank(events);
    let ids: Vec<&str> = ranked.iter().map(|r| r.event.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[test]
fn higher_volume_ranks_first() {
    // Markets carry no volume, so only the event aggregate differs
    let quiet = |id: &str, volume: f64| Event {
        volume,
        ..event(id, vec![market("m", 0.0, 1_000.0, 0.5)])
    };
    let low = quiet("low", 1_000.0);
    let high = quiet("high", 100_000.0);
    let ranked = RankingEngine::default().at(now()).rank(vec![low, high]);

    let (first, second) = (&ranked[0].factors, &ranked[1].factors);
    assert!(first.total_volume_score > second.total_volume_score);
    let mut first_rest = first.as_array();
    let mut second_rest = second.as_array();
    first_rest[0] = 0.0;
    second_rest[0] = 0.0;
    assert_eq!(first_rest, second_rest);
    assert_eq!(ranked[0].event.id, "high");
}

#[test]
fn ranking_is_deterministic_for_a_pinned_clock() {
    let build = || {
        vec![
            event("a", vec![market("a1", 700.0, 300.0, 0.2), market("a2", 100.0, 900.0, 0.9)]),
            event("b", vec![market("b1", 4_000.0, 100.0, 0.6)]),
        ]
    };
    let engine = RankingEngine::default().at(now());
    let first = engine.rank(build());
    let second = engine.rank(build());
    assert_eq!(first, second);
}

#[test]
fn ranked_event_exposes_all_passes() {
    let ranked = RankingEngine::default()
        .at(now())
        .score(event("full", vec![market("a", 1_000.0, 2_000.0, 0.3), market("b", 3_000.0, 500.0, 0.6)]));

    assert_eq!(ranked.market_analysis.market_count, 2);
    assert_eq!(ranked.multi_period.periods.len(), 4);
    // 24h daily rate exceeds the weekly, monthly and yearly ones
    assert_eq!(ranked.multi_period.trend, Trend::Increasing);
    assert!(ranked.factors.as_array().iter().all(|f| (0.0..=1.0).contains(f)));

    let json = serde_json::to_value(&ranked).unwrap();
    assert!(json.get("trending_score").is_some());
    assert_eq!(json["factors"].as_object().unwrap().len(), 11);
}
