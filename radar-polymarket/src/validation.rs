//! Validation boundary between raw Gamma payloads and domain types
//!
//! Nothing reaches the ranking engine without passing through here.

use radar_core::{Event, RadarError, RadarResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::types::GammaEvent;

/// Outcome of validating one payload.
///
/// Recoverable problems (a dropped market, unparsable prices) are collected
/// in `warnings` while the rest of the payload is still accepted.
#[derive(Debug)]
pub struct Validation<T> {
    pub outcome: RadarResult<T>,
    pub warnings: Vec<String>,
}

impl<T> Validation<T> {
    fn ok(data: T, warnings: Vec<String>) -> Self {
        Self {
            outcome: Ok(data),
            warnings,
        }
    }

    fn fail(error: RadarError, warnings: Vec<String>) -> Self {
        Self {
            outcome: Err(error),
            warnings,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn data(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// Log warnings and hand back the typed result
    pub fn into_result(self) -> RadarResult<T> {
        for warning in &self.warnings {
            warn!("Payload warning: {}", warning);
        }
        self.outcome
    }
}

fn convert_event(raw: Value, warnings: &mut Vec<String>) -> RadarResult<Event> {
    let gamma: GammaEvent = serde_json::from_value(raw)
        .map_err(|e| RadarError::validation(format!("Malformed event: {}", e)))?;
    gamma.into_event(warnings).map_err(RadarError::validation)
}

/// One validated `/events` page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    /// Entries the upstream returned, including ones validation skipped
    pub upstream_count: usize,
}

/// Validate an `/events` listing.
///
/// The payload must be a JSON array. Entries that are not usable events are
/// skipped with a warning instead of failing the whole page.
pub fn validate_events(raw: Value) -> Validation<Vec<Event>> {
    let Validation { outcome, warnings } = validate_event_page(raw);
    Validation {
        outcome: outcome.map(|page| page.events),
        warnings,
    }
}

/// Like [`validate_events`] but keeps the upstream entry count for paging
pub fn validate_event_page(raw: Value) -> Validation<EventPage> {
    let mut warnings = Vec::new();
    let items = match raw {
        Value::Array(items) => items,
        other => {
            return Validation::fail(
                RadarError::validation(format!(
                    "Expected an array of events, got {}",
                    json_type(&other)
                )),
                warnings,
            )
        }
    };

    let upstream_count = items.len();
    let mut events = Vec::with_capacity(upstream_count);
    for (index, item) in items.into_iter().enumerate() {
        match convert_event(item, &mut warnings) {
            Ok(event) => events.push(event),
            Err(e) => warnings.push(format!("skipped event at index {}: {}", index, e)),
        }
    }
    Validation::ok(
        EventPage {
            events,
            upstream_count,
        },
        warnings,
    )
}

/// Validate a single event payload.
///
/// Accepts either the object returned by `/events/{id}` or a listing filtered
/// by id; an empty listing means the event does not exist.
pub fn validate_event(raw: Value) -> Validation<Event> {
    let mut warnings = Vec::new();
    let item = match raw {
        Value::Object(_) => raw,
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => first,
            None => return Validation::fail(RadarError::not_found("event"), warnings),
        },
        other => {
            return Validation::fail(
                RadarError::validation(format!("Expected an event object, got {}", json_type(&other))),
                warnings,
            )
        }
    };

    match convert_event(item, &mut warnings) {
        Ok(event) => Validation::ok(event, warnings),
        Err(e) => Validation::fail(e, warnings),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
