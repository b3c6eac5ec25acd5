//! In-memory fragment storage with TTL expiry and LRU eviction.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::repos::{CacheError, FragmentCache};

use super::clock::Clock;
use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_CACHE_HIT: &str = "site_counts_cache_hit_total";
const METRIC_CACHE_MISS: &str = "site_counts_cache_miss_total";
const METRIC_CACHE_EXPIRED: &str = "site_counts_cache_expired_total";
const METRIC_CACHE_EVICT: &str = "site_counts_cache_evict_total";

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: OffsetDateTime,
}

impl CacheEntry {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}

/// Rendered fragment cache.
///
/// An entry is live until the clock reaches its `expires_at`; after that it
/// is treated as absent and dropped on the next lookup.
pub struct FragmentStore {
    entries: RwLock<LruCache<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl FragmentStore {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            clock,
        }
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "lookup");

        let Some(entry) = entries.get(key) else {
            counter!(METRIC_CACHE_MISS).increment(1);
            return None;
        };

        if entry.is_live(now) {
            counter!(METRIC_CACHE_HIT).increment(1);
            return Some(entry.value.clone());
        }

        entries.pop(key);
        counter!(METRIC_CACHE_EXPIRED).increment(1);
        counter!(METRIC_CACHE_MISS).increment(1);
        debug!(target = SOURCE, key, "Dropped expired fragment");
        None
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// A zero TTL stores nothing.
    pub fn store(&self, key: &str, value: String, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let ttl = time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX);
        let expires_at = self.clock.now().saturating_add(ttl);
        let entry = CacheEntry { value, expires_at };

        let evicted = rw_write(&self.entries, SOURCE, "store").push(key.to_string(), entry);
        match evicted {
            Some((evicted_key, _)) if evicted_key != key => {
                counter!(METRIC_CACHE_EVICT).increment(1);
                debug!(target = SOURCE, key = %evicted_key, "Evicted fragment at capacity");
            }
            _ => {}
        }
    }

    pub fn invalidate(&self, key: &str) {
        rw_write(&self.entries, SOURCE, "invalidate").pop(key);
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.entries, SOURCE, "invalidate_all").clear();
    }

    /// Number of stored entries, expired ones included until looked up.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FragmentCache for FragmentStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.store(key, value, ttl);
        Ok(())
    }
}

/// Cache that never holds anything; every render recomputes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl FragmentCache for DisabledCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}
