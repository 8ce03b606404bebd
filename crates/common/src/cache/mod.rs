//! In-memory read-through cache
//!
//! Provides:
//! - Generic get/set keyed by string
//! - Read-through loading with hit/miss metrics and counters
//! - Oldest-entry eviction at capacity
//! - Explicit invalidation
//!
//! Values are stored behind `Arc` so readers never clone the payload.
//! Callers are responsible for building keys that capture the full identity
//! of what was computed (see [`keys`]).

use crate::metrics;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// In-memory cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries kept before the oldest is evicted
    pub max_entries: usize,
    /// Key prefix for namespacing
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 64,
            key_prefix: "coachtree".to_string(),
        }
    }
}

/// Hit and miss counters since the cache was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct Entry<T> {
    value: Arc<T>,
    inserted_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: Arc<T>) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }
}

/// Read-through memo table
pub struct MemoryCache<T> {
    entries: DashMap<String, Entry<T>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> MemoryCache<T> {
    /// Create a new cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }

    /// Get a value from cache
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let full_key = self.key(key);
        let value = self.entries.get(&full_key).map(|entry| entry.value.clone());
        debug!(key = %full_key, hit = value.is_some(), "Cache lookup");
        value
    }

    /// Store a value, returning the shared handle
    pub fn set(&self, key: &str, value: T) -> Arc<T> {
        let full_key = self.key(key);
        let value = Arc::new(value);
        self.make_room(&full_key);
        self.entries.insert(full_key.clone(), Entry::new(value.clone()));
        debug!(key = %full_key, "Cache set");
        value
    }

    /// Delete a key from cache
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(&self.key(key)).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Get or compute with a loader function.
    ///
    /// Concurrent callers missing on the same key run the loader once; the
    /// others wait on the shard lock and receive the stored value.
    pub fn get_or_load<F>(&self, key: &str, loader: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        let full_key = self.key(key);
        if let Some(entry) = self.entries.get(&full_key) {
            return self.record(true, entry.value.clone());
        }

        self.make_room(&full_key);

        let mut loaded = false;
        let value = self
            .entries
            .entry(full_key)
            .or_insert_with(|| {
                loaded = true;
                Entry::new(Arc::new(loader()))
            })
            .value
            .clone();

        self.record(!loaded, value)
    }

    fn record(&self, hit: bool, value: Arc<T>) -> Arc<T> {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache(hit, &self.config.key_prefix);
        value
    }

    /// Evict the oldest entry when inserting `full_key` would exceed capacity.
    /// Must not be called while holding a reference into `entries`.
    fn make_room(&self, full_key: &str) {
        if self.entries.len() < self.config.max_entries || self.entries.contains_key(full_key) {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().inserted_at)
            .map(|entry| entry.key().clone());

        if let Some(oldest) = oldest {
            self.entries.remove(&oldest);
            debug!(key = %oldest, "Cache full, evicted oldest entry");
        }
    }
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Cache key builder helpers
pub mod keys {
    /// Build a score table cache key
    pub fn scores(population_fingerprint: &str, current_year: i32) -> String {
        format!("scores:{}:{}", current_year, population_fingerprint)
    }
}
