//! Key/value persistence gateway.
//!
//! # Responsibility
//! - Define the backend contract for opaque string keys and JSON values.
//! - Provide an in-memory backend (test fake) and a SQLite backend.
//! - Wrap any backend so callers never see storage failures as errors.
//!
//! # Invariants
//! - `PersistenceGateway::get` returns the caller's default on any failure.
//! - `set`/`remove`/`clear`/`commit` report failure as `false`, after
//!   logging it.
//! - A committed `WriteBatch` lands completely or not at all.
//! - Log lines carry keys and error text only, never stored values.

use crate::db::{open_db, open_db_in_memory, DbError};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {requested} bytes requested, {quota} allowed")]
    QuotaExceeded { requested: usize, quota: usize },
    #[error("failed to serialize value for `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize value for `{key}`: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("storage backend lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Raw string key/value backend.
pub trait KeyValueBackend: Send + Sync {
    fn read(&self, key: &str) -> StorageResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.write_all(&[(key, value)])
    }
    /// Writes every entry, or none of them.
    fn write_all(&self, entries: &[(&str, &str)]) -> StorageResult<()>;
    fn delete(&self, key: &str) -> StorageResult<()>;
    fn clear(&self) -> StorageResult<()>;
}

/// In-memory backend with an optional byte quota over keys plus values.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueBackend for MemoryStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write_all(&self, batch: &[(&str, &str)]) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let mut next = entries.clone();
        for (key, value) in batch {
            next.insert((*key).to_string(), (*value).to_string());
        }
        if let Some(quota) = self.quota_bytes {
            let requested: usize = next.iter().map(|(k, v)| k.len() + v.len()).sum();
            if requested > quota {
                return Err(StorageError::QuotaExceeded { requested, quota });
            }
        }
        *entries = next;
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.clear();
        Ok(())
    }
}

/// SQLite-backed backend over the `kv_entries` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Opens the file at `path`, or a private in-memory database when unset.
    pub fn open_configured(path: Option<&Path>) -> StorageResult<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Self::open_in_memory(),
        }
    }

    /// Wraps a connection that already went through `open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl KeyValueBackend for SqliteStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_all(&self, batch: &[(&str, &str)]) -> StorageResult<()> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let tx = conn.transaction()?;
        {
            let mut upsert = tx.prepare_cached(
                "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
            )?;
            for (key, value) in batch {
                upsert.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        conn.execute("DELETE FROM kv_entries;", [])?;
        Ok(())
    }
}

/// Values staged for one atomic [`PersistenceGateway::commit`].
#[derive(Debug, Default)]
pub struct WriteBatch {
    entries: Vec<(String, String)>,
    failure: Option<StorageError>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `value` under `key`; a serialization failure poisons the
    /// whole batch.
    pub fn set<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        if self.failure.is_some() {
            return self;
        }
        match serde_json::to_string(value) {
            Ok(raw) => self.entries.push((key.to_string(), raw)),
            Err(source) => {
                self.failure = Some(StorageError::Serialize {
                    key: key.to_string(),
                    source,
                })
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.failure.is_none()
    }

    fn keys(&self) -> String {
        self.entries
            .iter()
            .map(|(key, _)| key.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Failure-absorbing facade over a [`KeyValueBackend`].
pub struct PersistenceGateway<B: KeyValueBackend> {
    backend: B,
}

impl<B: KeyValueBackend> PersistenceGateway<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads and decodes `key`, falling back to `default` when the key is
    /// absent, unreadable or undecodable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(err) => {
                warn!("event=kv_get module=storage status=error key={key} error={err}");
                default
            }
        }
    }

    /// Typed read that surfaces the failure instead of absorbing it.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(raw) = self.backend.read(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.backend.read(key), Ok(Some(_)))
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(|source| StorageError::Serialize {
                key: key.to_string(),
                source,
            })
            .and_then(|raw| self.backend.write(key, &raw));
        self.report("kv_set", key, result)
    }

    /// Writes every staged value atomically.
    pub fn commit(&self, batch: WriteBatch) -> bool {
        let keys = batch.keys();
        let result = match batch.failure {
            Some(err) => Err(err),
            None => {
                let entries: Vec<(&str, &str)> = batch
                    .entries
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str()))
                    .collect();
                self.backend.write_all(&entries)
            }
        };
        self.report("kv_commit", &keys, result)
    }

    pub fn remove(&self, key: &str) -> bool {
        let result = self.backend.delete(key);
        self.report("kv_remove", key, result)
    }

    pub fn clear(&self) -> bool {
        let result = self.backend.clear();
        self.report("kv_clear", "*", result)
    }

    fn report(&self, event: &str, key: &str, result: StorageResult<()>) -> bool {
        match result {
            Ok(()) => {
                debug!("event={event} module=storage status=ok key={key}");
                true
            }
            Err(err) => {
                warn!("event={event} module=storage status=error key={key} error={err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueBackend, MemoryStore, PersistenceGateway, StorageError};

    #[test]
    fn quota_counts_replaced_value_once() {
        let store = MemoryStore::with_quota(16);
        store.write("k", "1234567890").unwrap();
        store.write("k", "0987654321").unwrap();
        let err = store.write("k2", "1234567890").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }

    #[test]
    fn get_falls_back_on_undecodable_value() {
        let gateway = PersistenceGateway::new(MemoryStore::new());
        gateway.backend().write("count", "not json").unwrap();
        assert_eq!(gateway.get("count", 7_u32), 7);
        assert!(gateway.try_get::<u32>("count").is_err());
    }
}
