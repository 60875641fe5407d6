//! Two-tier TTL cache for normalized forecasts.
//!
//! The memory tier lives for the process; the durable tier is a
//! [`KeyValueStore`] under the `weatherCache:` prefix. Lookups check memory
//! first, then storage (promoting hits into memory). Storage failures are
//! logged and read as misses.

pub mod clock;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{cache::clock::Clock, data::storage::KeyValueStore, domain::forecast::ForecastResult};

pub const STORAGE_PREFIX: &str = "weatherCache:";
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Coords,
    City,
}

impl KeyKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Coords => "coords",
            Self::City => "city",
        }
    }
}

/// `"<kind>:<value>"`, case-folded so `Paris` and `PARIS` share an entry.
#[must_use]
pub fn cache_key(kind: KeyKind, value: &str) -> String {
    format!("{}:{}", kind.prefix(), value.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Memory,
    Storage,
    Network,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
    pub ttl_ms: u64,
    pub data: ForecastResult,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age_ms = (now - self.fetched_at).num_milliseconds();
        age_ms < i64::try_from(self.ttl_ms).unwrap_or(i64::MAX)
    }
}

/// A cache answer tagged with the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedForecast {
    pub entry: CacheEntry,
    pub source: CacheSource,
}

impl CachedForecast {
    pub fn data(&self) -> &ForecastResult {
        &self.entry.data
    }
}

#[derive(Debug)]
pub struct ForecastCache {
    memory: Mutex<HashMap<String, CacheEntry>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl ForecastCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            store,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn get(&self, key: &str) -> Option<CachedForecast> {
        let now = self.clock.now();
        {
            let memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = memory.get(key)
                && entry.is_fresh(now)
            {
                tracing::debug!(key, "cache hit (memory)");
                return Some(CachedForecast {
                    entry: entry.clone(),
                    source: CacheSource::Memory,
                });
            }
        }

        let entry = self.read_persisted(key, now)?;
        tracing::debug!(key, "cache hit (storage)");
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry.clone());
        Some(CachedForecast {
            entry,
            source: CacheSource::Storage,
        })
    }

    pub fn put(&self, key: &str, data: ForecastResult, ttl: Duration) -> CachedForecast {
        let entry = CacheEntry {
            fetched_at: self.clock.now(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            data,
        };
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry.clone());
        self.write_persisted(key, &entry);
        CachedForecast {
            entry,
            source: CacheSource::Network,
        }
    }

    /// Drops every entry from both tiers.
    pub fn clear(&self) {
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        match self.store.keys() {
            Ok(keys) => {
                for key in keys.iter().filter(|k| k.starts_with(STORAGE_PREFIX)) {
                    if let Err(err) = self.store.remove(key) {
                        tracing::warn!(key = %key, error = %err, "failed to drop cached entry");
                    }
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to list cached entries"),
        }
    }

    pub fn memory_keys(&self) -> Vec<String> {
        let memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = memory.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn read_persisted(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let raw = match self.store.get(&storage_key(key)) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::debug!(key, error = %err, "durable cache unreadable");
                return None;
            }
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if entry.is_fresh(now) => Some(entry),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(key, error = %err, "durable cache entry is corrupt");
                None
            }
        }
    }

    fn write_persisted(&self, key: &str, entry: &CacheEntry) {
        let payload = match serde_json::to_string(entry) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to serialize cache entry");
                return;
            }
        };
        if let Err(err) = self.store.set(&storage_key(key), &payload) {
            tracing::warn!(key, error = %err, "failed to persist cache entry");
        }
    }
}

fn storage_key(key: &str) -> String {
    format!("{STORAGE_PREFIX}{key}")
}
