//! Polymarket Gamma API client
//!
//! Read-only access to the public Gamma API. No authentication is needed
//! for event and market data.

use std::time::Duration;

use async_trait::async_trait;
use radar_core::{RadarError, RadarResult};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::source::EventSource;
use crate::types::GAMMA_API_BASE;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gamma API client
#[derive(Clone)]
pub struct GammaClient {
    client: Client,
    base_url: Url,
}

impl GammaClient {
    /// Create a client against the public Gamma API with the default timeout
    pub fn new() -> RadarResult<Self> {
        Self::with_config(GAMMA_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Create a client against a custom base URL (e.g. a local mock)
    pub fn with_config(base_url: &str, timeout: Duration) -> RadarResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RadarError::config(format!("Invalid Gamma base URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RadarError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str, query: &[(String, String)]) -> RadarResult<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RadarError::validation(format!("Invalid request path {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

fn map_transport_error(context: &str, e: reqwest::Error) -> RadarError {
    if e.is_timeout() {
        RadarError::timeout(format!("{} timed out: {}", context, e))
    } else {
        RadarError::network(format!("{} failed: {}", context, e))
    }
}

#[async_trait]
impl EventSource for GammaClient {
    #[instrument(skip(self, query), fields(params = query.len()))]
    async fn fetch_raw(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> RadarResult<Value> {
        let url = self.endpoint(path, query)?;
        debug!("Fetching Gamma payload from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| map_transport_error("Gamma request", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RadarError::http(
                status.as_u16(),
                format!("Polymarket API error ({}): {}", url.path(), body),
            ));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                RadarError::validation(format!("Response from {} is not JSON: {}", url.path(), e))
            } else {
                map_transport_error("Reading Gamma response", e)
            }
        })
    }

    fn name(&self) -> &str {
        "gamma"
    }
}
