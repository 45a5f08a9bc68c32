//! TTL cache of final orchestration responses.
//!
//! Thread-safe via `DashMap`. Lazy eviction on `get()`: an expired entry is
//! removed when it is read, and behaves exactly like a miss. A TTL of
//! `Duration::ZERO` disables caching entirely.
//!
//! An optional [`CacheStore`] backs the in-memory map. Entries are reloaded
//! from it at construction and written through on every `put()`. Store
//! failures are logged and counted, never returned: the cache is an
//! optimisation, not a source of truth.

use chrono::Utc;
use cityguide_types::cache::{CacheStore, CachedResponse};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Normalise message text for fingerprinting: trim, lowercase, and collapse
/// whitespace runs to a single space.
pub fn normalize(message: &str) -> String {
    message
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Stable cache key for a message: hex SHA-256 of the normalised text.
pub fn fingerprint(message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(message).as_bytes());
    hex::encode(hasher.finalize())
}

/// Counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub write_failures: u64,
    pub entries: usize,
}

/// Fingerprint → response cache with optional persistence.
pub struct ResponseCache {
    entries: DashMap<String, CachedResponse>,
    ttl: Duration,
    store: Option<Arc<dyn CacheStore>>,
    hits: AtomicU64,
    misses: AtomicU64,
    write_failures: AtomicU64,
}

impl ResponseCache {
    /// Memory-only cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            store: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Cache backed by `store`, preloaded with its unexpired entries.
    ///
    /// An unreadable store leaves the cache empty. Expired rows are dropped
    /// from the store as they are found.
    pub fn with_store(ttl: Duration, store: Arc<dyn CacheStore>) -> Self {
        let mut cache = Self::new(ttl);
        cache.reload(store.as_ref());
        cache.store = Some(store);
        cache
    }

    fn reload(&mut self, store: &dyn CacheStore) {
        if self.is_disabled() {
            return;
        }
        let rows = match store.load_all() {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Failed to load response cache, starting empty");
                return;
            }
        };
        let now = Utc::now();
        let mut expired = 0usize;
        for (key, entry) in rows {
            if entry.is_expired(self.ttl, now) {
                expired += 1;
                if let Err(e) = store.remove(&key) {
                    debug!(fingerprint = %key, error = %e, "Failed to drop expired cache row");
                }
                continue;
            }
            self.entries.insert(key, entry);
        }
        info!(
            loaded = self.entries.len(),
            expired, "Response cache reloaded from storage"
        );
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether caching is turned off (zero TTL).
    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    /// Look up an unexpired entry. An expired entry is evicted and reported
    /// as a miss.
    pub fn get(&self, fingerprint: &str) -> Option<CachedResponse> {
        if self.is_disabled() {
            return None;
        }
        let now = Utc::now();
        let ttl = self.ttl;
        let evicted = self
            .entries
            .remove_if(fingerprint, |_, entry| entry.is_expired(ttl, now));
        if evicted.is_some() {
            debug!(fingerprint = %fingerprint, "Evicted expired cache entry");
            self.remove_from_store(fingerprint);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        match self.entries.get(fingerprint) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `entry`, overwriting any previous entry for the fingerprint,
    /// then write it through to storage. No-op if the TTL is zero.
    pub fn put(&self, fingerprint: String, entry: CachedResponse) {
        if self.is_disabled() {
            return;
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&fingerprint, &entry) {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!(fingerprint = %fingerprint, error = %e, "Failed to persist cache entry");
            }
        }
        self.entries.insert(fingerprint, entry);
    }

    /// Re-save every live entry to storage. Returns how many were written.
    pub fn flush(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        let now = Utc::now();
        let mut written = 0;
        for item in self.entries.iter() {
            if item.value().is_expired(self.ttl, now) {
                continue;
            }
            match store.save(item.key(), item.value()) {
                Ok(()) => written += 1,
                Err(e) => {
                    self.write_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(fingerprint = %item.key(), error = %e, "Failed to flush cache entry");
                }
            }
        }
        debug!(written, "Flushed response cache");
        written
    }

    /// Remove all expired entries from memory and storage.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let ttl = self.ttl;
        let mut evicted = Vec::new();
        self.entries.retain(|key, entry| {
            let expired = entry.is_expired(ttl, now);
            if expired {
                evicted.push(key.clone());
            }
            !expired
        });
        for key in &evicted {
            self.remove_from_store(key);
        }
        evicted.len()
    }

    /// Number of entries in memory (including possibly expired).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    fn remove_from_store(&self, fingerprint: &str) {
        if let Some(store) = &self.store {
            if let Err(e) = store.remove(fingerprint) {
                debug!(fingerprint = %fingerprint, error = %e, "Failed to remove cache row");
            }
        }
    }
}
