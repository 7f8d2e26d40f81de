#[cfg(test)]
use std::collections::HashMap;
use std::path::Path;

use rusqlite::backup::Backup;
use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

pub const DB_FILE: &str = "tally.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);
";

/// A durable string slot per key. The store keeps its whole collection in
/// one of these.
pub trait KeyValue {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Open (and create if needed) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValue for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |r| r.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            [key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryKv {
    slots: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryKv {
    pub fn with(key: &str, value: &str) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.to_string(), value.to_string());
        Self { slots }
    }
}

#[cfg(test)]
impl KeyValue for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Copy the live database to `dest` using SQLite's online backup.
pub fn backup_to(conn: &Connection, dest: &Path) -> Result<()> {
    let mut dest_conn = Connection::open(dest)?;
    let backup = Backup::new(conn, &mut dest_conn)?;
    backup.run_to_completion(100, std::time::Duration::from_millis(10), None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_kv() -> (tempfile::TempDir, SqliteKv) {
        let dir = tempfile::tempdir().unwrap();
        let kv = SqliteKv::open(&dir.path().join("test.db")).unwrap();
        (dir, kv)
    }

    #[test]
    fn test_init_db_creates_kv_table() {
        let (_dir, kv) = test_kv();
        let tables: Vec<String> = kv
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"kv".to_string()));
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, kv) = test_kv();
        init_db(kv.connection()).unwrap();
    }

    #[test]
    fn test_missing_key_reads_none() {
        let (_dir, kv) = test_kv();
        assert_eq!(kv.get("transactions").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites_existing_value() {
        let (_dir, mut kv) = test_kv();
        kv.set("transactions", "[]").unwrap();
        kv.set("transactions", "[1]").unwrap();
        assert_eq!(kv.get("transactions").unwrap().as_deref(), Some("[1]"));
        let rows: i64 = kv
            .connection()
            .query_row("SELECT count(*) FROM kv", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let mut kv = SqliteKv::open(&path).unwrap();
            kv.set("transactions", "[]").unwrap();
        }
        let kv = SqliteKv::open(&path).unwrap();
        assert_eq!(kv.get("transactions").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_backup_copies_slots() {
        let (dir, mut kv) = test_kv();
        kv.set("transactions", "[]").unwrap();
        let dest = dir.path().join("copy.db");
        backup_to(kv.connection(), &dest).unwrap();
        let copy = SqliteKv::open(&dest).unwrap();
        assert_eq!(copy.get("transactions").unwrap().as_deref(), Some("[]"));
    }
}
