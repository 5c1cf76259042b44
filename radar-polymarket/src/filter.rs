//! Event discovery filters
//!
//! `EventFilter` is translated into Gamma `/events` query parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum page size accepted by the Gamma API
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort keys supported by the `/events` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventOrder {
    Volume,
    #[serde(rename = "volume24hr")]
    Volume24hr,
    Liquidity,
    StartDate,
    EndDate,
    CreatedAt,
    Competitive,
}

impl EventOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOrder::Volume => "volume",
            EventOrder::Volume24hr => "volume24hr",
            EventOrder::Liquidity => "liquidity",
            EventOrder::StartDate => "startDate",
            EventOrder::EndDate => "endDate",
            EventOrder::CreatedAt => "createdAt",
            EventOrder::Competitive => "competitive",
        }
    }
}

impl std::str::FromStr for EventOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "volume" => Ok(EventOrder::Volume),
            "volume24hr" | "volume_24hr" => Ok(EventOrder::Volume24hr),
            "liquidity" => Ok(EventOrder::Liquidity),
            "startdate" | "start_date" => Ok(EventOrder::StartDate),
            "enddate" | "end_date" => Ok(EventOrder::EndDate),
            "createdat" | "created_at" => Ok(EventOrder::CreatedAt),
            "competitive" => Ok(EventOrder::Competitive),
            _ => Err(format!("Unknown order: {}", s)),
        }
    }
}

/// Options for discovering events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    /// Page size (capped at 100)
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub active: Option<bool>,
    pub closed: Option<bool>,
    pub archived: Option<bool>,
    /// Polymarket tag id (e.g. 21 = crypto)
    pub tag_id: Option<u32>,
    pub tag_slug: Option<String>,
    pub order: Option<EventOrder>,
    pub ascending: bool,
    pub liquidity_min: Option<f64>,
    pub volume_min: Option<f64>,
    pub start_date_min: Option<DateTime<Utc>>,
    pub end_date_max: Option<DateTime<Utc>>,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            limit: Some(50),
            offset: None,
            active: Some(true),
            closed: Some(false),
            archived: None,
            tag_id: None,
            tag_slug: None,
            order: Some(EventOrder::Volume),
            ascending: false,
            liquidity_min: None,
            volume_min: None,
            start_date_min: None,
            end_date_max: None,
        }
    }
}

impl EventFilter {
    /// Copy of this filter positioned at another page
    pub fn page(&self, limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..self.clone()
        }
    }

    /// Build query params for the `/events` endpoint
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(l) = self.limit {
            params.push(("limit".to_string(), l.min(MAX_PAGE_SIZE).to_string()));
        }
        if let Some(o) = self.offset {
            params.push(("offset".to_string(), o.to_string()));
        }
        if let Some(active) = self.active {
            params.push(("active".to_string(), active.to_string()));
        }
        if let Some(closed) = self.closed {
            params.push(("closed".to_string(), closed.to_string()));
        }
        if let Some(archived) = self.archived {
            params.push(("archived".to_string(), archived.to_string()));
        }
        if let Some(tag_id) = self.tag_id {
            params.push(("tag_id".to_string(), tag_id.to_string()));
        }
        if let Some(slug) = &self.tag_slug {
            params.push(("tag_slug".to_string(), slug.clone()));
        }
        if let Some(order) = self.order {
            params.push(("order".to_string(), order.as_str().to_string()));
            params.push(("ascending".to_string(), self.ascending.to_string()));
        }
        if let Some(min) = self.liquidity_min {
            params.push(("liquidity_min".to_string(), min.to_string()));
        }
        if let Some(min) = self.volume_min {
            params.push(("volume_min".to_string(), min.to_string()));
        }
        if let Some(start) = self.start_date_min {
            params.push(("start_date_min".to_string(), start.to_rfc3339()));
        }
        if let Some(end) = self.end_date_max {
            params.push(("end_date_max".to_string(), end.to_rfc3339()));
        }
        params
    }

    /// Stable cache key for this filter
    pub fn cache_key(&self) -> String {
        let query = self
            .to_query()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("events?{}", query)
    }
}

/// Event filter presets for the frontend tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPreset {
    /// All events (default - sorted by volume)
    All,
    /// Trending events (highest 24h volume)
    Trending,
    /// Events ending soon (sorted by end date ascending)
    Expiring,
    /// Newest events (sorted by creation date descending)
    New,
    /// Crypto events (tag_id = 21)
    Crypto,
    /// Politics events (tag_id = 2)
    Politics,
    /// Sports events (tag_id = 1)
    Sports,
}

impl EventPreset {
    /// Get the Polymarket tag ID for category presets
    pub fn tag_id(&self) -> Option<u32> {
        match self {
            EventPreset::Crypto => Some(21),
            EventPreset::Politics => Some(2),
            EventPreset::Sports => Some(1),
            _ => None,
        }
    }

    /// Build the filter for this preset
    pub fn filter(&self, limit: u32) -> EventFilter {
        let (order, ascending) = match self {
            EventPreset::Trending => (EventOrder::Volume24hr, false),
            EventPreset::Expiring => (EventOrder::EndDate, true),
            EventPreset::New => (EventOrder::CreatedAt, false),
            _ => (EventOrder::Volume, false),
        };
        EventFilter {
            limit: Some(limit),
            tag_id: self.tag_id(),
            order: Some(order),
            ascending,
            end_date_max: None,
            start_date_min: None,
            ..EventFilter::default()
        }
    }
}

impl std::str::FromStr for EventPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(EventPreset::All),
            "trending" => Ok(EventPreset::Trending),
            "expiring" => Ok(EventPreset::Expiring),
            "new" => Ok(EventPreset::New),
            "crypto" => Ok(EventPreset::Crypto),
            "politics" => Ok(EventPreset::Politics),
            "sports" => Ok(EventPreset::Sports),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}

impl std::fmt::Display for EventPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventPreset::All => write!(f, "all"),
            EventPreset::Trending => write!(f, "trending"),
            EventPreset::Expiring => write!(f, "expiring"),
            EventPreset::New => write!(f, "new"),
            EventPreset::Crypto => write!(f, "crypto"),
            EventPreset::Politics => write!(f, "politics"),
            EventPreset::Sports => write!(f, "sports"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_filter_query() {
        let params = EventFilter::default().to_query();
        assert_eq!(value(&params, "limit"), Some("50"));
        assert_eq!(value(&params, "active"), Some("true"));
        assert_eq!(value(&params, "closed"), Some("false"));
        assert_eq!(value(&params, "order"), Some("volume"));
        assert_eq!(value(&params, "ascending"), Some("false"));
        assert_eq!(value(&params, "offset"), None);
    }

    #[test]
    fn test_limit_is_capped() {
        let filter = EventFilter::default().page(500, 200);
        let params = filter.to_query();
        assert_eq!(value(&params, "limit"), Some("100"));
        assert_eq!(value(&params, "offset"), Some("200"));
    }

    #[test]
    fn test_preset_parsing_and_tags() {
        let preset: EventPreset = "Crypto".parse().unwrap();
        assert_eq!(preset, EventPreset::Crypto);
        assert_eq!(preset.filter(10).tag_id, Some(21));
        assert_eq!(EventPreset::Expiring.filter(10).order, Some(EventOrder::EndDate));
        assert!(EventPreset::Expiring.filter(10).ascending);
        assert!("unknown".parse::<EventPreset>().is_err());
        assert_eq!(EventPreset::Politics.to_string(), "politics");
    }

    #[test]
    fn test_cache_key_distinguishes_pages() {
        let base = EventFilter::default();
        assert_ne!(base.page(100, 0).cache_key(), base.page(100, 100).cache_key());
        assert_eq!(base.cache_key(), base.clone().cache_key());
    }
}
