//! Event and market data structures for prediction markets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Volume look-back windows reported by the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "1wk")]
    Week,
    #[serde(rename = "1mo")]
    Month,
    #[serde(rename = "1yr")]
    Year,
}

impl Period {
    /// All periods, shortest first
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    /// Length of the window in days (used to normalise to a daily rate)
    pub fn days(&self) -> f64 {
        match self {
            Period::Day => 1.0,
            Period::Week => 7.0,
            Period::Month => 30.0,
            Period::Year => 365.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "24h",
            Period::Week => "1wk",
            Period::Month => "1mo",
            Period::Year => "1yr",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-period traded volume
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodVolumes {
    pub volume_24h: f64,
    pub volume_1wk: f64,
    pub volume_1mo: f64,
    pub volume_1yr: f64,
}

impl PeriodVolumes {
    pub fn get(&self, period: Period) -> f64 {
        match period {
            Period::Day => self.volume_24h,
            Period::Week => self.volume_1wk,
            Period::Month => self.volume_1mo,
            Period::Year => self.volume_1yr,
        }
    }
}

/// A single market (one question with its outcomes) inside an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Unique identifier on the platform
    pub id: String,

    /// Market question
    pub question: String,

    /// URL slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Condition ID (used by the order book API)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_id: Option<String>,

    /// Lifetime traded volume
    pub volume: f64,

    /// Currently available liquidity
    pub liquidity: f64,

    /// Upstream competitiveness score (0-1), not reported for every market
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive: Option<f64>,

    /// Outcome labels (typically "Yes" and "No")
    #[serde(default)]
    pub outcomes: Vec<String>,

    /// Outcome prices, aligned with `outcomes`
    #[serde(default)]
    pub outcome_prices: Vec<f64>,

    /// Whether the market is open for trading
    pub active: bool,

    /// Whether the market is closed
    pub closed: bool,

    /// When the market was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the market ends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    /// Look-back volumes
    #[serde(default)]
    pub period_volumes: PeriodVolumes,

    /// Describes how the market will be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_source: Option<String>,
}

impl Market {
    /// Price of the first outcome (the "Yes" side for binary markets)
    pub fn first_outcome_price(&self) -> Option<f64> {
        self.outcome_prices.first().copied()
    }
}

/// A prediction-market event grouping related markets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: String,

    /// Event title
    pub title: String,

    /// URL slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tag labels (e.g., "Politics", "Crypto", "AI")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Markets owned by this event
    #[serde(default)]
    pub markets: Vec<Market>,

    /// When the event was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Start date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    /// End date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    /// Whether the event is active
    pub active: bool,

    /// Whether the event is closed
    pub closed: bool,

    /// Aggregate volume as reported by the API
    pub volume: f64,

    /// Aggregate liquidity as reported by the API
    pub liquidity: f64,

    /// Aggregate look-back volumes as reported by the API
    #[serde(default)]
    pub period_volumes: PeriodVolumes,

    /// Upstream competitiveness score for the whole event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive: Option<f64>,

    /// Describes how the event will be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_source: Option<String>,
}

impl Event {
    /// Best known creation time (falls back to the start date)
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.start_date)
    }

    /// Resolution text for the event, falling back to the first market that has one
    pub fn resolution_text(&self) -> Option<&str> {
        self.resolution_source
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.markets
                    .iter()
                    .filter_map(|m| m.resolution_source.as_deref())
                    .find(|s| !s.trim().is_empty())
            })
    }
}
