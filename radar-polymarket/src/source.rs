//! Raw event source abstraction
//!
//! The services layer only needs "fetch this path, give me JSON back".
//! `GammaClient` implements it over HTTP; tests script it in memory.

use async_trait::async_trait;
use radar_core::RadarResult;
use serde_json::Value;

/// Anything that can return raw Gamma-shaped JSON for a path and query
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the payload at `path` (e.g. `/events` or `/events/903`).
    ///
    /// Transport failures map to `Network`/`Timeout`, non-2xx responses to `Http`.
    async fn fetch_raw(&self, path: &str, query: &[(String, String)]) -> RadarResult<Value>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "source"
    }
}
