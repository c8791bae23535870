use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

use markread_core::storage::{entry_size, Storage, StorageMap};
use markread_core::StorageError;

use crate::database::Database;
use crate::error::StoreError;

/// Persistent [`Storage`] backed by a single SQLite key/value table.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
    quota: Option<u64>,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self { db, quota: None }
    }

    /// Reject writes that would push total usage past `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn get_sync(&self, keys: &[String]) -> Result<StorageMap, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT value FROM items WHERE key = ?1")?;
            let mut out = StorageMap::new();
            for key in keys {
                let raw: Option<String> = stmt.query_row([key], |row| row.get(0)).optional()?;
                if let Some(raw) = raw {
                    out.insert(key.clone(), parse_value(key, &raw)?);
                }
            }
            Ok(out)
        })
    }

    fn get_all_sync(&self) -> Result<StorageMap, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM items")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(|(key, raw)| {
                    let value = parse_value(&key, &raw)?;
                    Ok((key, value))
                })
                .collect()
        })
    }

    fn set_sync(&self, items: StorageMap) -> Result<(), StoreError> {
        let quota = self.quota;
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;

            if let Some(quota) = quota {
                let replaced: u64 = sizes_of(&tx, items.keys())?;
                let added: u64 = items.iter().map(|(k, v)| entry_size(k, v)).sum();
                let needed = total_size(&tx)?.saturating_sub(replaced) + added;
                if needed > quota {
                    return Err(StoreError::QuotaExceeded { needed, quota });
                }
            }

            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO items (key, value, size) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, size = excluded.size",
                )?;
                for (key, value) in &items {
                    let size = entry_size(key, value) as i64;
                    stmt.execute(rusqlite::params![key, value.to_string(), size])?;
                }
            }

            tx.commit()?;
            Ok(())
        })
    }

    fn remove_sync(&self, keys: &[String]) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached("DELETE FROM items WHERE key = ?1")?;
                for key in keys {
                    stmt.execute([key])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn clear_sync(&self) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM items", [])?;
            Ok(())
        })
    }

    fn bytes_in_use_sync(&self, keys: Option<&[String]>) -> Result<u64, StoreError> {
        self.db.with_conn(|conn| match keys {
            None => total_size(conn),
            Some(keys) => sizes_of(conn, keys.iter()),
        })
    }
}

fn parse_value(key: &str, raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::CorruptRow {
        key: key.to_string(),
        detail: format!("invalid JSON: {e}"),
    })
}

fn total_size(conn: &Connection) -> Result<u64, StoreError> {
    let total: i64 = conn.query_row("SELECT COALESCE(SUM(size), 0) FROM items", [], |row| row.get(0))?;
    Ok(total.max(0) as u64)
}

fn sizes_of<'a>(conn: &Connection, keys: impl Iterator<Item = &'a String>) -> Result<u64, StoreError> {
    let mut stmt = conn.prepare_cached("SELECT size FROM items WHERE key = ?1")?;
    let mut total = 0u64;
    for key in keys {
        let size: Option<i64> = stmt.query_row([key], |row| row.get(0)).optional()?;
        total += size.unwrap_or(0).max(0) as u64;
    }
    Ok(total)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get(&self, keys: &[String]) -> Result<StorageMap, StorageError> {
        Ok(self.get_sync(keys)?)
    }

    async fn get_all(&self) -> Result<StorageMap, StorageError> {
        Ok(self.get_all_sync()?)
    }

    async fn set(&self, items: StorageMap) -> Result<(), StorageError> {
        if items.is_empty() {
            return Ok(());
        }
        Ok(self.set_sync(items)?)
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        Ok(self.remove_sync(keys)?)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Ok(self.clear_sync()?)
    }

    async fn bytes_in_use(&self, keys: Option<&[String]>) -> Result<u64, StorageError> {
        Ok(self.bytes_in_use_sync(keys)?)
    }
}
