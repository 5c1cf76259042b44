//! Multi-period volume analysis (24h / 1wk / 1mo / 1yr)

use radar_core::{Event, Period};

use crate::stats::{consistency, gini, linear_slope};
use crate::types::{MultiPeriodAnalysis, PeriodAnalysis, RankingConfig, Trend};

/// Relative change below which two daily averages count as equal
const TREND_EPSILON: f64 = 1e-9;

/// Per-market volumes for one period
fn period_volumes(event: &Event, period: Period) -> Vec<f64> {
    event
        .markets
        .iter()
        .map(|m| m.period_volumes.get(period).max(0.0))
        .collect()
}

fn analyze_period(event: &Event, period: Period, average_correlation: f64) -> PeriodAnalysis {
    let volumes = period_volumes(event, period);
    let mut total_volume: f64 = volumes.iter().sum();
    // Events without per-market breakdowns still report aggregates
    if total_volume <= 0.0 {
        total_volume = event.period_volumes.get(period).max(0.0);
    }

    let average_volume = if volumes.is_empty() {
        total_volume
    } else {
        total_volume / volumes.len() as f64
    };

    PeriodAnalysis {
        period,
        total_volume,
        average_volume,
        dominant_market_volume: volumes.iter().copied().fold(0.0, f64::max),
        gini: gini(&volumes),
        average_correlation,
    }
}

/// Majority vote over consecutive changes in daily-normalised volume,
/// walking from the longest window to the shortest.
fn classify_trend(periods: &[PeriodAnalysis]) -> Trend {
    let daily: Vec<f64> = Period::ALL
        .iter()
        .rev()
        .filter_map(|p| periods.iter().find(|a| a.period == *p))
        .map(|a| a.total_volume / a.period.days())
        .collect();

    let (mut up, mut down) = (0, 0);
    for pair in daily.windows(2) {
        let delta = pair[1] - pair[0];
        let scale = pair[0].abs().max(pair[1].abs()).max(1.0);
        if delta > TREND_EPSILON * scale {
            up += 1;
        } else if delta < -TREND_EPSILON * scale {
            down += 1;
        }
    }

    if up >= 2 {
        Trend::Increasing
    } else if down >= 2 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Recent volume against weekly and monthly daily averages.
///
/// Each ratio is capped, their sum is normalised into [0, 1]. With only one
/// usable ratio that ratio alone is normalised; with none the result is 0.5.
fn momentum(day: f64, week: f64, month: f64, cap: f64) -> f64 {
    let weekly_avg = week / Period::Week.days();
    let monthly_avg = month / Period::Month.days();

    let ratios: Vec<f64> = [weekly_avg, monthly_avg]
        .iter()
        .filter(|avg| **avg > 0.0)
        .map(|avg| (day / avg).min(cap))
        .collect();

    if ratios.is_empty() {
        return 0.5;
    }
    (ratios.iter().sum::<f64>() / (cap * ratios.len() as f64)).clamp(0.0, 1.0)
}

/// Analyse the look-back windows of an event
pub fn analyze_periods(
    event: &Event,
    average_correlation: f64,
    config: &RankingConfig,
) -> MultiPeriodAnalysis {
    let periods: Vec<PeriodAnalysis> = Period::ALL
        .iter()
        .map(|p| analyze_period(event, *p, average_correlation))
        .collect();

    let totals: Vec<f64> = periods.iter().map(|p| p.total_volume).collect();
    let total = |period: Period| {
        periods
            .iter()
            .find(|p| p.period == period)
            .map(|p| p.total_volume)
            .unwrap_or(0.0)
    };

    let momentum = momentum(
        total(Period::Day),
        total(Period::Week),
        total(Period::Month),
        config.momentum_cap,
    );
    let growth = (linear_slope(&totals) / config.growth_divisor).clamp(-1.0, 1.0);

    MultiPeriodAnalysis {
        trend: classify_trend(&periods),
        momentum,
        consistency: consistency(&totals),
        growth,
        periods,
    }
}
