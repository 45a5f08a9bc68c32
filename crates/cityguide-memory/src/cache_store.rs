//! SQLite-backed storage for response cache entries.

use crate::migration::run_migrations;
use chrono::{DateTime, Utc};
use cityguide_types::cache::{CacheStore, CachedResponse};
use cityguide_types::error::{CityGuideError, CityGuideResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Response cache store backed by SQLite.
#[derive(Clone)]
pub struct SqliteCacheStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCacheStore {
    /// Open (or create) the database at `path` and bring its schema up to date.
    ///
    /// Fails when the file cannot be opened or is not a usable database; the
    /// caller decides whether to continue without persistence.
    pub fn open(path: &Path) -> CityGuideResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(|e| CityGuideError::Storage(e.to_string()))?;
        let store = Self::migrated(conn)?;
        debug!(path = %path.display(), "Opened response cache store");
        Ok(store)
    }

    fn migrated(conn: Connection) -> CityGuideResult<Self> {
        run_migrations(&conn).map_err(|e| CityGuideError::Storage(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> CityGuideResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CityGuideError::Internal(e.to_string()))
    }
}

impl CacheStore for SqliteCacheStore {
    fn load_all(&self) -> CityGuideResult<Vec<(String, CachedResponse)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT fingerprint, response, terminal_agent, created_at FROM response_cache")
            .map_err(|e| CityGuideError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| CityGuideError::Storage(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (fingerprint, response, terminal_agent, created_at) =
                row.map_err(|e| CityGuideError::Storage(e.to_string()))?;
            // A bad timestamp only loses that row.
            let created_at = match DateTime::parse_from_rfc3339(&created_at) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(e) => {
                    warn!(fingerprint = %fingerprint, error = %e, "Skipping cache row with invalid timestamp");
                    continue;
                }
            };
            entries.push((
                fingerprint,
                CachedResponse {
                    response,
                    terminal_agent,
                    created_at,
                },
            ));
        }
        Ok(entries)
    }

    fn save(&self, fingerprint: &str, entry: &CachedResponse) -> CityGuideResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO response_cache (fingerprint, response, terminal_agent, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(fingerprint) DO UPDATE SET response = ?2, terminal_agent = ?3, created_at = ?4",
            rusqlite::params![
                fingerprint,
                entry.response,
                entry.terminal_agent,
                entry.created_at.to_rfc3339()
            ],
        )
        .map_err(|e| CityGuideError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, fingerprint: &str) -> CityGuideResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM response_cache WHERE fingerprint = ?1",
            rusqlite::params![fingerprint],
        )
        .map_err(|e| CityGuideError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqliteCacheStore {
        SqliteCacheStore::migrated(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let store = setup();
        let entry = CachedResponse::new("Three bakeries near Lake Merritt", "City Explorer");
        store.save("abc", &entry).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "abc");
        assert_eq!(loaded[0].1.response, entry.response);
        assert_eq!(loaded[0].1.terminal_agent, "City Explorer");
    }

    #[test]
    fn test_save_overwrites() {
        let store = setup();
        store.save("k", &CachedResponse::new("v1", "A")).unwrap();
        store.save("k", &CachedResponse::new("v2", "B")).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].1.response, "v2");
        assert_eq!(loaded[0].1.terminal_agent, "B");
    }

    #[test]
    fn test_remove() {
        let store = setup();
        store.save("a", &CachedResponse::new("1", "A")).unwrap();
        store.save("b", &CachedResponse::new("2", "A")).unwrap();
        store.remove("a").unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "b");
        store.remove("missing").unwrap();
    }

    #[test]
    fn test_invalid_timestamp_row_skipped() {
        let store = setup();
        store.save("good", &CachedResponse::new("ok", "A")).unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO response_cache VALUES ('bad', 'x', 'A', 'yesterday')",
                [],
            )
            .unwrap();
        }
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "good");
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");
        {
            let store = SqliteCacheStore::open(&path).unwrap();
            store.save("k", &CachedResponse::new("kept", "A")).unwrap();
        }
        let reopened = SqliteCacheStore::open(&path).unwrap();
        let loaded = reopened.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].1.response, "kept");
    }

    #[test]
    fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        std::fs::write(&path, "this is not a sqlite database ".repeat(64)).unwrap();
        assert!(matches!(
            SqliteCacheStore::open(&path),
            Err(CityGuideError::Storage(_))
        ));
    }
}
