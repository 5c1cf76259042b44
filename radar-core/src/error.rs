//! Error types for the radar

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// HTTP status codes that indicate a transient upstream condition
const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Message fragments that mark an otherwise untyped error as transient
const TRANSIENT_PATTERNS: [&str; 10] = [
    "network",
    "timeout",
    "timed out",
    "connection reset",
    "econnreset",
    "econnrefused",
    "enotfound",
    "dns",
    "socket hang up",
    "connection refused",
];

/// State of a circuit breaker, carried by [`RadarError::CircuitOpen`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation, calls pass through
    Closed,
    /// Calls are rejected until the reset timeout elapses
    Open,
    /// A limited number of probe calls are let through
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`RadarError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failures, timeouts, 5xx and 429 responses
    TransientNetwork,
    /// 4xx responses other than 429
    Client,
    /// Malformed upstream payload
    Validation,
    /// Circuit breaker is rejecting calls
    CircuitOpen,
    /// Both the primary call and the fallback failed
    FallbackExhausted,
    /// Anything else (config, not found, internal)
    Other,
}

/// Radar-wide error type
#[derive(Error, Debug, Clone)]
pub enum RadarError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Circuit breaker is {state} (fallback attempted: {fallback_attempted})")]
    CircuitOpen {
        state: CircuitState,
        fallback_attempted: bool,
    },

    #[error("Primary call failed ({primary}) and fallback failed ({fallback})")]
    FallbackExhausted {
        primary: Box<RadarError>,
        fallback: Box<RadarError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RadarError {
    pub fn network(msg: impl Into<String>) -> Self {
        RadarError::Network(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        RadarError::Timeout(msg.into())
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        RadarError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        RadarError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        RadarError::NotFound(msg.into())
    }

    pub fn circuit_open(state: CircuitState, fallback_attempted: bool) -> Self {
        RadarError::CircuitOpen {
            state,
            fallback_attempted,
        }
    }

    pub fn fallback_exhausted(primary: RadarError, fallback: RadarError) -> Self {
        RadarError::FallbackExhausted {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        RadarError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        RadarError::Internal(msg.into())
    }

    /// Whether a retry of the same call may succeed.
    ///
    /// Network failures, timeouts and HTTP 429/500/502/503/504 are retryable.
    /// Other 4xx responses and malformed payloads are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            RadarError::Network(_) | RadarError::Timeout(_) => true,
            RadarError::Http { status, .. } => RETRYABLE_STATUS.contains(status),
            RadarError::Internal(msg) => is_transient_message(msg),
            _ => false,
        }
    }

    /// Map onto the coarse error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            RadarError::Network(_) | RadarError::Timeout(_) => ErrorKind::TransientNetwork,
            RadarError::Http { status, .. } if RETRYABLE_STATUS.contains(status) => {
                ErrorKind::TransientNetwork
            }
            RadarError::Http { status, .. } if (400..500).contains(status) => ErrorKind::Client,
            RadarError::Validation(_) => ErrorKind::Validation,
            RadarError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            RadarError::FallbackExhausted { .. } => ErrorKind::FallbackExhausted,
            RadarError::Internal(msg) if is_transient_message(msg) => ErrorKind::TransientNetwork,
            _ => ErrorKind::Other,
        }
    }
}

/// Check a free-form error message against known transient failure patterns
pub fn is_transient_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    if TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }
    RETRYABLE_STATUS
        .iter()
        .any(|status| lower.contains(&status.to_string()))
}

/// Result type alias for radar operations
pub type RadarResult<T> = Result<T, RadarError>;
