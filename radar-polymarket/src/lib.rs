//! Polymarket integration for the prediction radar
//!
//! This crate provides a read-only client for the Polymarket Gamma API,
//! the wire types it returns, and the validation step that turns raw
//! payloads into `radar-core` events.

pub mod client;
pub mod filter;
pub mod source;
pub mod types;
pub mod validation;

pub use client::{GammaClient, DEFAULT_TIMEOUT};
pub use filter::{EventFilter, EventOrder, EventPreset, MAX_PAGE_SIZE};
pub use source::EventSource;
pub use types::{GammaEvent, GammaMarket, GammaTag, ListField, GAMMA_API_BASE};
pub use validation::{validate_event, validate_event_page, validate_events, EventPage, Validation};
