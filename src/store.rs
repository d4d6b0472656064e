// src/store.rs
// =============================================================================
// Optional persistence of scan results.
//
// The crawler only knows the ScanStore trait. The SQLite implementation keeps
// one row per scanned page:
//
//   scans(id INTEGER PK, site TEXT, url TEXT, issues_json TEXT, ts INTEGER)
//
// Saving is best effort: the crawler logs a failed save and moves on, so a
// broken database never changes scan results.
// =============================================================================

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::analyzers::Issue;
use crate::error::StoreError;

/// Sink for per-page scan results.
///
/// Implementations are called from blocking worker threads, one page at a time.
pub trait ScanStore: Send + Sync {
    fn save(&self, site: &str, url: &str, issues: &[Issue]) -> Result<(), StoreError>;
}

/// One persisted page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredScan {
    pub site: String,
    pub url: String,
    pub issues: Vec<Issue>,
    pub scanned_at: DateTime<Utc>,
}

/// SQLite-backed ScanStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS scans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site TEXT NOT NULL,
                url TEXT NOT NULL,
                issues_json TEXT,
                ts INTEGER
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // Reads stored pages, newest first.
    //
    // Parameters:
    //   site: restrict to one site, or None for every site
    pub fn results(&self, site: Option<&str>) -> Result<Vec<StoredScan>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT site, url, issues_json, ts FROM scans
             WHERE ?1 IS NULL OR site = ?1
             ORDER BY ts DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![site], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?;

        let mut scans = Vec::new();
        for row in rows {
            let (site, url, issues_json, ts) = row?;
            let issues = match issues_json {
                Some(json) => serde_json::from_str(&json)?,
                None => Vec::new(),
            };
            scans.push(StoredScan {
                site,
                url,
                issues,
                scanned_at: DateTime::from_timestamp(ts.unwrap_or(0), 0).unwrap_or_default(),
            });
        }
        Ok(scans)
    }
}

impl ScanStore for SqliteStore {
    fn save(&self, site: &str, url: &str, issues: &[Issue]) -> Result<(), StoreError> {
        let issues_json = serde_json::to_string(issues)?;
        self.conn.lock().execute(
            "INSERT INTO scans (site, url, issues_json, ts) VALUES (?1, ?2, ?3, ?4)",
            params![site, url, issues_json, Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_read_back() {
        let store = SqliteStore::in_memory().unwrap();
        let issues = vec![Issue::new("alt_text", "IMG_MISSING_ALT", "missing alt", "<img>")];
        store.save("example.com", "https://example.com/", &issues).unwrap();
        store.save("other.org", "https://other.org/", &[]).unwrap();

        let all = store.results(None).unwrap();
        assert_eq!(all.len(), 2);

        let site = store.results(Some("example.com")).unwrap();
        assert_eq!(site.len(), 1);
        assert_eq!(site[0].url, "https://example.com/");
        assert_eq!(site[0].issues, issues);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scans.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.save("s", "https://s/", &[]).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.results(Some("s")).unwrap().len(), 1);
    }
}
