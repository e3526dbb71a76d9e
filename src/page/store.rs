//! Persistent page overrides.
//!
//! One table, `templates`, maps a normalized filename to its HTML. Every
//! operation is a single statement on a pooled connection; there is no
//! cross-operation locking, so concurrent upserts to one key are
//! last-write-wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use thiserror::Error;

use super::PageKey;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS templates (
    filename TEXT PRIMARY KEY,
    content TEXT NOT NULL
)";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("cannot create database directory `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Upsert-by-key page persistence.
pub trait PageStore: Send + Sync {
    /// Look up a page. A missing row is `Ok(None)`, not an error.
    fn get(&self, key: &PageKey) -> Result<Option<String>, StoreError>;

    /// Insert or replace a page. Empty content is rejected before any query runs.
    fn upsert(&self, key: &PageKey, content: &str) -> Result<(), StoreError>;

    /// Delete one page. Returns whether a row existed.
    fn remove(&self, key: &PageKey) -> Result<bool, StoreError>;

    /// Delete every page. Returns the number of rows removed.
    fn clear(&self) -> Result<usize, StoreError>;

    /// All stored keys, sorted.
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// SQLite-backed store with an r2d2 connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path, pool_size: u32) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(parent.to_path_buf(), e))?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")
        });
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        pool.get()?.execute_batch(SCHEMA)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl PageStore for SqliteStore {
    fn get(&self, key: &PageKey) -> Result<Option<String>, StoreError> {
        let content = self
            .conn()?
            .query_row(
                "SELECT content FROM templates WHERE filename = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    fn upsert(&self, key: &PageKey, content: &str) -> Result<(), StoreError> {
        if key.as_str().is_empty() || content.is_empty() {
            return Err(StoreError::Validation("Filename and content are required"));
        }

        self.conn()?.execute(
            "INSERT INTO templates (filename, content) VALUES (?1, ?2)
             ON CONFLICT(filename) DO UPDATE SET content = excluded.content",
            params![key.as_str(), content],
        )?;
        Ok(())
    }

    fn remove(&self, key: &PageKey) -> Result<bool, StoreError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM templates WHERE filename = ?1", params![key.as_str()])?;
        Ok(removed > 0)
    }

    fn clear(&self) -> Result<usize, StoreError> {
        Ok(self.conn()?.execute("DELETE FROM templates", [])?)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT filename FROM templates ORDER BY filename")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
pub(crate) fn test_store(dir: &Path) -> SqliteStore {
    SqliteStore::open(&dir.join("pages.db"), 2).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(raw: &str) -> PageKey {
        PageKey::new(raw).unwrap()
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = test_store(dir.path());
        assert_eq!(store.get(&key("nope")).unwrap(), None);
    }

    #[test]
    fn test_upsert_then_get() {
        let dir = TempDir::new().unwrap();
        let store = test_store(dir.path());

        store.upsert(&key("about"), "<h1>Hi</h1>").unwrap();
        assert_eq!(
            store.get(&key("about.html")).unwrap().as_deref(),
            Some("<h1>Hi</h1>")
        );
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = test_store(dir.path());

        store.upsert(&key("about"), "first").unwrap();
        store.upsert(&key("about"), "second").unwrap();

        assert_eq!(store.get(&key("about")).unwrap().as_deref(), Some("second"));
        assert_eq!(store.list().unwrap(), vec!["about.html".to_string()]);
    }

    #[test]
    fn test_upsert_rejects_empty_content() {
        let dir = TempDir::new().unwrap();
        let store = test_store(dir.path());

        let err = store.upsert(&key("about"), "").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.get(&key("about")).unwrap(), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        let store = test_store(dir.path());

        store.upsert(&key("a"), "1").unwrap();
        store.upsert(&key("b"), "2").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert_eq!(store.get(&key("a")).unwrap(), None);
        assert_eq!(store.get(&key("b")).unwrap(), None);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_remove_single_page() {
        let dir = TempDir::new().unwrap();
        let store = test_store(dir.path());

        store.upsert(&key("a"), "1").unwrap();
        store.upsert(&key("b"), "2").unwrap();

        assert!(store.remove(&key("a")).unwrap());
        assert!(!store.remove(&key("a")).unwrap());
        assert_eq!(store.list().unwrap(), vec!["b.html".to_string()]);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        test_store(dir.path()).upsert(&key("kept"), "yes").unwrap();

        let reopened = test_store(dir.path());
        assert_eq!(reopened.get(&key("kept")).unwrap().as_deref(), Some("yes"));
    }
}
