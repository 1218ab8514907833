//! TTL- and size-bounded cache of fetch results
//!
//! Keys are normalized URLs compared literally. Expiry is logical: stale
//! entries are ignored on read but only leave the map when overwritten or
//! evicted for capacity.

use crate::types::FetchResult;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for cached results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached results
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

#[derive(Debug)]
struct CacheEntry {
    result: FetchResult,
    stored_at: Instant,
}

/// Thread-safe result cache shared by concurrent requests
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}

impl ResultCache {
    /// Create an empty cache
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a copy of the stored result if it is younger than the TTL.
    pub fn get(&self, url: &str) -> Option<FetchResult> {
        let entries = self.lock();
        entries
            .get(url)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.result.clone())
    }

    /// Store a result, evicting the single oldest entry if over capacity.
    pub fn put(&self, url: impl Into<String>, result: FetchResult) {
        let mut entries = self.lock();
        entries.insert(
            url.into(),
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );

        if entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                tracing::debug!(url = %key, "Evicting oldest cache entry");
                entries.remove(&key);
            }
        }
    }

    /// Number of stored entries, including stale ones
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
