//! Core types for the Prediction Radar
//!
//! This crate defines the shared data structures used across the radar,
//! including event and market representations and the error taxonomy.

pub mod error;
pub mod market;

pub use error::{is_transient_message, CircuitState, ErrorKind, RadarError, RadarResult};
pub use market::{Event, Market, Period, PeriodVolumes};
