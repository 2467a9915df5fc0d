//! Result caching for fetched bodies
//!
//! A process-memory TTL cache keyed by fetch URL. Every operation takes the
//! same exclusive lock, so concurrent lookups and inserts cannot race an
//! eviction.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A cached body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub url: String,
    pub body: String,
    pub stored_at: Instant,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    /// Entries currently held, expired ones included
    pub entries: usize,
    /// Held entries that have outlived the TTL
    pub expired: usize,
    /// Maximum number of entries
    pub capacity: usize,
    pub ttl: Duration,
}

/// Body cache with TTL expiry and oldest-first capacity eviction
#[derive(Debug)]
pub struct TtlCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl TtlCache {
    /// Create a new cache
    ///
    /// # Arguments
    /// * `ttl` - Time-to-live for cached entries
    /// * `capacity` - Maximum number of entries (at least 1)
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) <= self.ttl
    }

    /// Get a cached body if it has not expired
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, url: &str) -> Option<String> {
        let mut entries = self.lock();
        let now = Instant::now();

        let fresh = entries.get(url).map(|entry| self.is_fresh(entry, now));
        match fresh {
            Some(true) => entries.get(url).map(|entry| entry.body.clone()),
            Some(false) => {
                entries.remove(url);
                tracing::debug!("Cache entry for {} expired", url);
                None
            }
            None => None,
        }
    }

    /// Insert a body, evicting the oldest entry if the cache is full
    pub fn set(&self, url: &str, body: String) {
        let mut entries = self.lock();

        if !entries.contains_key(url) && entries.len() >= self.capacity {
            Self::evict_oldest(&mut entries);
        }

        entries.insert(
            url.to_string(),
            CacheEntry {
                url: url.to_string(),
                body,
                stored_at: Instant::now(),
            },
        );
    }

    /// Returns true if a fresh entry exists for the URL
    pub fn contains(&self, url: &str) -> bool {
        let entries = self.lock();
        entries
            .get(url)
            .is_some_and(|entry| self.is_fresh(entry, Instant::now()))
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Get cache statistics
    pub fn info(&self) -> CacheInfo {
        let entries = self.lock();
        let now = Instant::now();
        CacheInfo {
            entries: entries.len(),
            expired: entries
                .values()
                .filter(|entry| !self.is_fresh(entry, now))
                .count(),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }

    fn evict_oldest(entries: &mut HashMap<String, CacheEntry>) {
        if let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.stored_at)
            .map(|(key, _)| key.clone())
        {
            tracing::debug!("Cache full, evicting {}", oldest_key);
            entries.remove(&oldest_key);
        }
    }
}
