//! SQLite-backed namespaced key-value store.
//!
//! Every stateful engine persists itself here as a handful of named JSON
//! values. Reads fall back to a caller-supplied default and writes are
//! best-effort: the single-user, single-process model means last write wins
//! and a failed write is logged rather than surfaced.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{data_dir, migrations, Config, StorageConfig};
use crate::error::{DatabaseError, Result};

/// Namespaced key -> JSON value mapping.
pub struct Store {
    conn: Connection,
    namespace: String,
}

impl Store {
    /// Open (or create) the store at `path`, scoping all keys to `namespace`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path, namespace: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, namespace)
    }

    /// Open the database file named by `storage` inside `dir`, creating the
    /// directory first.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::Io`] if `dir` cannot be created, or a
    /// database error if the file cannot be opened.
    pub fn open_in(dir: &Path, storage: &StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&storage.database_file);
        tracing::debug!(path = %path.display(), namespace = %storage.namespace, "opening store");
        Self::open(&path, &storage.namespace)
    }

    /// Open the store in the data directory described by `config`.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::Config`] if the data directory cannot be
    /// resolved.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open_in(&data_dir()?, &config.storage)
    }

    /// Open an in-memory store. Used by tests and dry runs.
    pub fn open_memory(namespace: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, namespace)
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // ── Raw access ───────────────────────────────────────────────────

    /// Get the raw JSON text stored under `key`.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM kv WHERE namespace = ?1 AND key = ?2")?;
        let result = stmt.query_row(params![self.namespace, key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store raw JSON text under `key`.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (namespace, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![self.namespace, key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<bool, rusqlite::Error> {
        let n = self.conn.execute(
            "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
            params![self.namespace, key],
        )?;
        Ok(n > 0)
    }

    /// All keys present in this namespace, sorted.
    pub fn keys(&self) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE namespace = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![self.namespace], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    /// Delete every key in this namespace except those in `keep`.
    ///
    /// Returns the number of removed keys.
    pub fn retain_only(&self, keep: &[&str]) -> Result<usize, rusqlite::Error> {
        let mut removed = 0;
        for key in self.keys()? {
            if !keep.contains(&key.as_str()) && self.kv_remove(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ── Typed, best-effort access ────────────────────────────────────

    /// Load `key` as `T`, falling back to `default` when the key is missing
    /// or its stored value cannot be read or parsed.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.kv_get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "stored value unreadable, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "store read failed, using default");
                default
            }
        }
    }

    /// Persist `value` under `key`. Failures are logged and swallowed.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_save(key, value) {
            tracing::warn!(key, error = %e, "store write failed");
        }
    }

    /// Persist `value` under `key`, reporting failures.
    pub fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv_set(key, &json).map_err(DatabaseError::from)?;
        Ok(())
    }
}
