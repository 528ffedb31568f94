//! Scoped JSON key-value store on top of SQLite.
//!
//! Values are serialized with `serde_json` and stored under a `(scope, key)`
//! pair, so that several accounts can share one database file without their
//! entries colliding.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

const TABLENAME: &str = "kvstore";
const SCOPE_FIELD: &str = "scope";
const KEY_FIELD: &str = "key";
const VALUE_FIELD: &str = "value";
const UPDATED_FIELD: &str = "updated_at";

#[derive(Error, Debug)]
pub enum KvError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KvError>;

pub struct KVDb(Connection);

impl KVDb {
    /// Open (or create) the database at `path`, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!("Opening key-value store at {}", path.display());
        let connection = Connection::open(path)?;
        Self::init(connection)
    }

    /// Purely in-memory store; contents are lost on drop.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(connection: Connection) -> Result<Self> {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS '{TABLENAME}' (
                {SCOPE_FIELD} TEXT NOT NULL,
                {KEY_FIELD} TEXT NOT NULL,
                {VALUE_FIELD} BLOB NOT NULL,
                {UPDATED_FIELD} INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY ({SCOPE_FIELD}, {KEY_FIELD})
                )"
            ),
            [],
        )?;
        Ok(KVDb(connection))
    }

    fn select(&self, scope: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.0
            .query_row(
                &format!(
                    "SELECT {VALUE_FIELD} FROM '{TABLENAME}' WHERE {SCOPE_FIELD} = ?1 AND {KEY_FIELD} = ?2"
                ),
                params![scope, key],
                |r| r.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        scope: impl AsRef<str>,
        key: impl AsRef<str>,
    ) -> Result<Option<T>> {
        self.select(scope.as_ref(), key.as_ref())?
            .map(|v| serde_json::from_slice::<T>(&v))
            .transpose()
            .map_err(Into::into)
    }

    pub fn set<V: Serialize>(
        &self,
        scope: impl AsRef<str>,
        key: impl AsRef<str>,
        value: V,
    ) -> Result<()> {
        let encoded = serde_json::to_vec(&value)?;
        let mut stmt = self.0.prepare(&format!(
            "INSERT INTO '{TABLENAME}' ({SCOPE_FIELD}, {KEY_FIELD}, {VALUE_FIELD}, {UPDATED_FIELD})
            VALUES (?1, ?2, ?3, strftime('%s', 'now'))
            ON CONFLICT({SCOPE_FIELD}, {KEY_FIELD})
            DO UPDATE SET {VALUE_FIELD} = ?3, {UPDATED_FIELD} = strftime('%s', 'now')",
        ))?;
        stmt.execute(params![scope.as_ref(), key.as_ref(), encoded])?;
        log::trace!("Stored {}/{}", scope.as_ref(), key.as_ref());
        Ok(())
    }

    /// Returns whether a value was present.
    pub fn remove(&self, scope: impl AsRef<str>, key: impl AsRef<str>) -> Result<bool> {
        let removed = self.0.execute(
            &format!("DELETE FROM '{TABLENAME}' WHERE {SCOPE_FIELD} = ?1 AND {KEY_FIELD} = ?2"),
            params![scope.as_ref(), key.as_ref()],
        )?;
        Ok(removed > 0)
    }

    /// Remove every key in `scope`, returning how many were dropped.
    pub fn clear_scope(&self, scope: impl AsRef<str>) -> Result<usize> {
        let removed = self.0.execute(
            &format!("DELETE FROM '{TABLENAME}' WHERE {SCOPE_FIELD} = ?1"),
            params![scope.as_ref()],
        )?;
        Ok(removed)
    }

    pub fn keys(&self, scope: impl AsRef<str>) -> Result<Vec<String>> {
        let mut stmt = self.0.prepare(&format!(
            "SELECT {KEY_FIELD} FROM '{TABLENAME}' WHERE {SCOPE_FIELD} = ?1 ORDER BY {KEY_FIELD}"
        ))?;
        let rows = stmt.query_map(params![scope.as_ref()], |r| r.get::<_, String>(0))?;
        let keys = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_do_not_collide() {
        let db = KVDb::in_memory().unwrap();
        db.set("alice", "token", "a").unwrap();
        db.set("bob", "token", "b").unwrap();

        assert_eq!(db.get::<String>("alice", "token").unwrap().as_deref(), Some("a"));
        assert_eq!(db.get::<String>("bob", "token").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let db = KVDb::in_memory().unwrap();
        db.set("s", "k", 1).unwrap();
        db.set("s", "k", 2).unwrap();
        assert_eq!(db.get::<u32>("s", "k").unwrap(), Some(2));
        assert_eq!(db.keys("s").unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn remove_and_clear() {
        let db = KVDb::in_memory().unwrap();
        db.set("s", "a", true).unwrap();
        db.set("s", "b", false).unwrap();
        db.set("t", "a", true).unwrap();

        assert!(db.remove("s", "a").unwrap());
        assert!(!db.remove("s", "a").unwrap());
        assert_eq!(db.clear_scope("s").unwrap(), 1);
        assert!(db.keys("s").unwrap().is_empty());
        assert_eq!(db.get::<bool>("t", "a").unwrap(), Some(true));
    }
}
