//! Fallback cache of last-known-good results
//!
//! Payloads are stored as JSON so one cache can hold every result type the
//! service produces. Only the orchestrator's fallback path reads from it.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use radar_core::{RadarError, RadarResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) <= self.ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub fresh: usize,
    pub stale: usize,
}

/// TTL-keyed store; expired entries are dropped on read and on every write
#[derive(Debug)]
pub struct FallbackCache {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl FallbackCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Raw JSON payload for `key`, `None` if missing or expired
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.is_fresh(now) {
            return Some(entry.payload.clone());
        }
        entries.remove(key);
        debug!(key, "Fallback cache entry expired");
        None
    }

    /// Typed payload for `key`.
    ///
    /// An entry that no longer deserializes as `T` counts as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "Fallback cache entry has unexpected shape: {}", e);
                None
            }
        }
    }

    pub fn set_raw(&self, key: &str, payload: Value, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.is_fresh(now));
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                stored_at: now,
                ttl,
            },
        );
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> RadarResult<()> {
        let payload = serde_json::to_value(value)
            .map_err(|e| RadarError::internal(format!("Failed to serialize cache entry {}: {}", key, e)))?;
        self.set_raw(key, payload, ttl);
        Ok(())
    }

    /// Store with the default TTL
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> RadarResult<()> {
        self.set(key, value, self.default_ttl)
    }

    /// Drop every expired entry, returning how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        debug!(count, "Fallback cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock();
        let fresh = entries.values().filter(|e| e.is_fresh(now)).count();
        CacheStats {
            entries: entries.len(),
            fresh,
            stale: entries.len() - fresh,
        }
    }
}
