use std::path::Path;
use std::sync::Mutex;

use futures::future::BoxFuture;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use switchyard_core::error::{Result, SwitchyardError};
use switchyard_core::traits::RecordStore;
use switchyard_core::types::{Record, Table};

use crate::ensure_id;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        tbl TEXT NOT NULL,
        id TEXT NOT NULL,
        body TEXT NOT NULL,
        UNIQUE(tbl, id)
    );

    CREATE INDEX IF NOT EXISTS idx_records_tbl ON records(tbl, seq);";

fn db_err(e: impl std::fmt::Display) -> SwitchyardError {
    SwitchyardError::Storage(e.to_string())
}

/// SQLite-backed record store. Every table shares one `records` table whose
/// `body` column holds the record as JSON.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| db_err(format!("Failed to create db directory: {}", e)))?;
        }

        let conn = Connection::open(path).map_err(db_err)?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!(path = %path.display(), "SQLite store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of records stored in `table`.
    pub fn count(&self, table: Table) -> Result<usize> {
        let conn = self.conn.lock().map_err(db_err)?;
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM records WHERE tbl = ?1",
                params![table.as_str()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(n as usize)
    }
}

fn parse_body(body: &str) -> Result<Record> {
    serde_json::from_str(body).map_err(|e| db_err(format!("Corrupt record body: {}", e)))
}

impl RecordStore for SqliteStore {
    fn lookup(&self, table: Table, key: &str) -> BoxFuture<'_, Result<Option<Record>>> {
        let key = key.to_string();

        Box::pin(async move {
            let conn = self.conn.lock().map_err(db_err)?;

            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM records WHERE tbl = ?1 AND id = ?2",
                    params![table.as_str(), key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?;

            body.as_deref().map(parse_body).transpose()
        })
    }

    fn insert(&self, table: Table, mut record: Record) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let id = ensure_id(table, &mut record);
            let body = serde_json::to_string(&record)?;

            let conn = self.conn.lock().map_err(db_err)?;
            conn.execute(
                "INSERT INTO records (tbl, id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(tbl, id) DO UPDATE SET body = excluded.body",
                params![table.as_str(), id, body],
            )
            .map_err(db_err)?;

            debug!(table = table.as_str(), id = %id, "Record stored");
            Ok(id)
        })
    }

    fn scan(&self, table: Table, limit: usize) -> BoxFuture<'_, Result<Vec<Record>>> {
        Box::pin(async move {
            let conn = self.conn.lock().map_err(db_err)?;

            let mut stmt = conn
                .prepare(
                    "SELECT body FROM records
                     WHERE tbl = ?1
                     ORDER BY seq DESC
                     LIMIT ?2",
                )
                .map_err(db_err)?;

            let rows = stmt
                .query_map(params![table.as_str(), limit as i64], |row| {
                    row.get::<_, String>(0)
                })
                .map_err(db_err)?;

            let mut records = Vec::new();
            for row in rows {
                records.push(parse_body(&row.map_err(db_err)?)?);
            }
            Ok(records)
        })
    }
}
