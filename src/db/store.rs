use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use rusqlite::{named_params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::db::DbPool;
use crate::error::AppResult;

/// Collection keys used by the services. Each holds a JSON array.
pub const KEY_TASKS: &str = "tasks";
pub const KEY_RECURRING_TEMPLATES: &str = "recurring_templates";
pub const KEY_RECURRING_INSTANCES: &str = "recurring_instances";
pub const KEY_RECURRING_EXCEPTIONS: &str = "recurring_exceptions";
pub const KEY_TASK_TEMPLATES: &str = "task_templates";

/// Opaque key-value storage boundary. Values are JSON strings.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Loads a JSON-array collection; a missing key reads as an empty collection.
pub fn load_collection<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> AppResult<Vec<T>> {
    match store.get(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

pub fn save_collection<T: Serialize>(store: &dyn KvStore, key: &str, items: &[T]) -> AppResult<()> {
    let raw = serde_json::to_string(items)?;
    store.set(key, &raw)
}

/// SQLite-backed store over the shared `kv` table.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> AppResult<Self> {
        Ok(Self {
            pool: DbPool::new(path)?,
        })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.pool.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
            let value = stmt.query_row([key], |row| row.get(0)).optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.pool.with_connection(|conn| {
            conn.execute(
                r#"
                    INSERT INTO kv (key, value)
                    VALUES (:key, :value)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                "#,
                named_params! {":key": key, ":value": value},
            )?;
            debug!(target: "app::db", key, "kv entry written");
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.pool.with_connection(|conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

/// In-memory store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| crate::error::AppError::other("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| crate::error::AppError::other("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| crate::error::AppError::other("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}
