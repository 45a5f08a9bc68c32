//! Response cache entry and storage contract.

use crate::error::CityGuideResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A previously computed final response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// The terminal response text.
    pub response: String,
    /// Agent that produced the response.
    pub terminal_agent: String,
    /// When the response was computed.
    pub created_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Create an entry stamped with the current time.
    pub fn new(response: impl Into<String>, terminal_agent: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            terminal_agent: terminal_agent.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether the entry is older than `ttl` at `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.created_at) > ttl,
            // A TTL too large to represent never expires.
            Err(_) => false,
        }
    }
}

/// Persistent key→entry storage behind the response cache.
///
/// Implementations are synchronous; callers treat every error as best-effort.
pub trait CacheStore: Send + Sync {
    /// Read every stored entry.
    fn load_all(&self) -> CityGuideResult<Vec<(String, CachedResponse)>>;

    /// Insert or overwrite the entry for `fingerprint`.
    fn save(&self, fingerprint: &str, entry: &CachedResponse) -> CityGuideResult<()>;

    /// Delete the entry for `fingerprint`, if any.
    fn remove(&self, fingerprint: &str) -> CityGuideResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_not_expired() {
        let entry = CachedResponse::new("hello", "City Explorer");
        assert!(!entry.is_expired(Duration::from_secs(3600), Utc::now()));
    }

    #[test]
    fn test_old_entry_expired() {
        let mut entry = CachedResponse::new("hello", "City Explorer");
        entry.created_at = Utc::now() - chrono::Duration::hours(2);
        assert!(entry.is_expired(Duration::from_secs(3600), Utc::now()));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let mut entry = CachedResponse::new("hello", "City Explorer");
        entry.created_at = Utc::now() - chrono::Duration::days(365);
        assert!(!entry.is_expired(Duration::MAX, Utc::now()));
    }
}
