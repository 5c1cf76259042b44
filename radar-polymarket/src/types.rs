//! Polymarket Gamma API response types
//!
//! These types mirror the Gamma API responses and are converted
//! to radar-core types once validated.

use chrono::{DateTime, Utc};
use radar_core::{Event, Market, PeriodVolumes};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Base URL for Polymarket Gamma API
pub const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

/// Numbers arrive as JSON numbers, numeric strings, or null depending on endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
    Flag(bool),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Lenient> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Lenient::Number(n)) if n.is_finite() => Some(n),
        Some(Lenient::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Lenient> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Lenient::Number(n)) => Some(format!("{}", n as i64)),
        Some(Lenient::Text(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Lenient> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Lenient::Flag(b)) => Some(b),
        Some(Lenient::Text(s)) => s.trim().parse::<bool>().ok(),
        _ => None,
    })
}

/// A missing or null list is empty
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Dates arrive as RFC 3339 or bare `YYYY-MM-DD`
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|s| parse_date(&s)))
}

pub(crate) fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Outcome lists arrive either as JSON arrays or as JSON-encoded strings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<Value>),
    Text(String),
}

impl ListField {
    /// Numeric entries, `None` if any entry is not a number
    pub fn numbers(&self) -> Option<Vec<f64>> {
        match self {
            Self::Text(raw) => parse_number_list(raw),
            Self::Items(items) => items
                .iter()
                .map(|item| match item {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                })
                .collect(),
        }
    }

    pub fn labels(&self) -> Option<Vec<String>> {
        match self {
            Self::Text(raw) => parse_label_list(raw),
            Self::Items(items) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
        }
    }
}

/// A Polymarket market from the Gamma API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    /// Unique identifier
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    /// Market question
    #[serde(default)]
    pub question: Option<String>,

    /// URL slug
    #[serde(default)]
    pub slug: Option<String>,

    /// Condition ID (used for CLOB)
    #[serde(default)]
    pub condition_id: Option<String>,

    /// Total volume as a string
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,

    /// Numeric volume (some responses have this)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume_num: Option<f64>,

    /// Total liquidity as a string
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity: Option<f64>,

    /// Numeric liquidity
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity_num: Option<f64>,

    #[serde(default, rename = "volume24hr", deserialize_with = "lenient_f64")]
    pub volume_24hr: Option<f64>,

    #[serde(default, rename = "volume1wk", deserialize_with = "lenient_f64")]
    pub volume_1wk: Option<f64>,

    #[serde(default, rename = "volume1mo", deserialize_with = "lenient_f64")]
    pub volume_1mo: Option<f64>,

    #[serde(default, rename = "volume1yr", deserialize_with = "lenient_f64")]
    pub volume_1yr: Option<f64>,

    /// Competitiveness score (0-1)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub competitive: Option<f64>,

    /// Outcomes, e.g. "[\"Yes\", \"No\"]" or ["Yes", "No"]
    #[serde(default)]
    pub outcomes: Option<ListField>,

    /// Outcome prices, e.g. "[0.65, 0.35]" or ["0.65", "0.35"]
    #[serde(default)]
    pub outcome_prices: Option<ListField>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: Option<bool>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub closed: Option<bool>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<DateTime<Utc>>,

    /// Resolution source - describes how the market will be resolved
    #[serde(default)]
    pub resolution_source: Option<String>,
}

/// A tag from the Polymarket API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaTag {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    /// Human-readable label (e.g., "Politics", "Crypto", "AI")
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub slug: Option<String>,
}

/// A Polymarket event (contains multiple markets)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaEvent {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,

    /// Some responses only carry `creationDate`
    #[serde(default, deserialize_with = "lenient_date")]
    pub creation_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: Option<bool>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub closed: Option<bool>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,

    #[serde(default, rename = "volume24hr", deserialize_with = "lenient_f64")]
    pub volume_24hr: Option<f64>,

    #[serde(default, rename = "volume1wk", deserialize_with = "lenient_f64")]
    pub volume_1wk: Option<f64>,

    #[serde(default, rename = "volume1mo", deserialize_with = "lenient_f64")]
    pub volume_1mo: Option<f64>,

    #[serde(default, rename = "volume1yr", deserialize_with = "lenient_f64")]
    pub volume_1yr: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub competitive: Option<f64>,

    /// Associated markets, kept raw so each one is parsed on its own
    #[serde(default, deserialize_with = "lenient_list")]
    pub markets: Vec<Value>,

    #[serde(default)]
    pub resolution_source: Option<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<Value>,
}

/// Parse a JSON-encoded list of numbers.
///
/// The API returns prices in various formats:
/// - JSON array of strings: "[\"0.0115\", \"0.9885\"]"
/// - JSON array of numbers: "[0.0115, 0.9885]"
/// - Comma-separated: "0.0115, 0.9885"
pub fn parse_number_list(raw: &str) -> Option<Vec<f64>> {
    if let Ok(values) = serde_json::from_str::<Vec<String>>(raw) {
        return values
            .iter()
            .map(|v| v.trim().parse::<f64>().ok())
            .collect();
    }

    if let Ok(values) = serde_json::from_str::<Vec<f64>>(raw) {
        return Some(values);
    }

    let trimmed = raw.trim().trim_matches(|c| c == '[' || c == ']');
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split(',')
        .map(|part| part.trim().trim_matches('"').parse::<f64>().ok())
        .collect()
}

/// Parse a JSON-encoded list of labels, e.g. "[\"Yes\", \"No\"]"
pub fn parse_label_list(raw: &str) -> Option<Vec<String>> {
    if let Ok(values) = serde_json::from_str::<Vec<String>>(raw) {
        return Some(values);
    }
    let trimmed = raw.trim().trim_matches(|c| c == '[' || c == ']');
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .split(',')
            .map(|part| part.trim().trim_matches('"').to_string())
            .collect(),
    )
}

impl GammaMarket {
    /// Convert to a radar-core Market.
    ///
    /// Returns `Err` with a reason when the market cannot be used at all;
    /// recoverable oddities are pushed onto `warnings`.
    pub fn into_market(self, warnings: &mut Vec<String>) -> Result<Market, String> {
        let id = self
            .id
            .ok_or_else(|| "market without id".to_string())?;

        let outcome_prices = match &self.outcome_prices {
            Some(raw) => raw.numbers().unwrap_or_else(|| {
                warnings.push(format!("market {}: unparsable outcomePrices {:?}", id, raw));
                Vec::new()
            }),
            None => Vec::new(),
        };

        let outcomes = self
            .outcomes
            .as_ref()
            .and_then(ListField::labels)
            .unwrap_or_default();

        Ok(Market {
            question: self.question.unwrap_or_default(),
            slug: self.slug,
            condition_id: self.condition_id,
            volume: self.volume_num.or(self.volume).unwrap_or(0.0).max(0.0),
            liquidity: self.liquidity_num.or(self.liquidity).unwrap_or(0.0).max(0.0),
            competitive: self.competitive,
            outcomes,
            outcome_prices,
            active: self.active.unwrap_or(true),
            closed: self.closed.unwrap_or(false),
            created_at: self.created_at,
            end_date: self.end_date,
            period_volumes: PeriodVolumes {
                volume_24h: self.volume_24hr.unwrap_or(0.0),
                volume_1wk: self.volume_1wk.unwrap_or(0.0),
                volume_1mo: self.volume_1mo.unwrap_or(0.0),
                volume_1yr: self.volume_1yr.unwrap_or(0.0),
            },
            resolution_source: self.resolution_source.filter(|s| !s.trim().is_empty()),
            id,
        })
    }
}

impl GammaEvent {
    /// Convert to a radar-core Event, dropping markets that cannot be used
    pub fn into_event(self, warnings: &mut Vec<String>) -> Result<Event, String> {
        let id = self.id.ok_or_else(|| "event without id".to_string())?;

        let mut markets = Vec::with_capacity(self.markets.len());
        for (index, raw) in self.markets.into_iter().enumerate() {
            let parsed = serde_json::from_value::<GammaMarket>(raw)
                .map_err(|e| format!("malformed market at index {}: {}", index, e))
                .and_then(|market| market.into_market(warnings));
            match parsed {
                Ok(m) => markets.push(m),
                Err(reason) => warnings.push(format!("event {}: dropped {}", id, reason)),
            }
        }

        let tags = self
            .tags
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<GammaTag>(raw).ok())
            .filter_map(|t| t.label.or(t.slug))
            .collect();

        Ok(Event {
            title: self.title.unwrap_or_default(),
            slug: self.slug,
            description: self.description,
            tags,
            markets,
            created_at: self.created_at.or(self.creation_date),
            start_date: self.start_date,
            end_date: self.end_date,
            active: self.active.unwrap_or(true),
            closed: self.closed.unwrap_or(false),
            volume: self.volume.unwrap_or(0.0).max(0.0),
            liquidity: self.liquidity.unwrap_or(0.0).max(0.0),
            period_volumes: PeriodVolumes {
                volume_24h: self.volume_24hr.unwrap_or(0.0),
                volume_1wk: self.volume_1wk.unwrap_or(0.0),
                volume_1mo: self.volume_1mo.unwrap_or(0.0),
                volume_1yr: self.volume_1yr.unwrap_or(0.0),
            },
            competitive: self.competitive,
            resolution_source: self.resolution_source.filter(|s| !s.trim().is_empty()),
            id,
        })
    }
}
