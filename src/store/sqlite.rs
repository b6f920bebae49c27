// 🗄️ SQLite Version Store
// Durable append-only ledger: transactions, key versions, events.
// WAL mode for crash recovery; every commit is one SQL transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::keys::KeyBuilder;
use crate::ledger::{
    BufferedHistory, CommitRecord, HistoryIterator, KeyModification, LedgerInfo, VersionStore,
};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn to_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn from_text(text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

pub fn setup_database(conn: &Connection) -> LedgerResult<()> {
    // Enable WAL mode for crash recovery (no-op for in-memory databases)
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Transactions (one row per committed transaction)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            tx_id TEXT UNIQUE NOT NULL,
            function TEXT NOT NULL,
            committed_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Key versions (append-only; keys are BLOBs since they carry NUL delimiters)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS key_versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key BLOB NOT NULL,
            tx_id TEXT NOT NULL REFERENCES transactions(tx_id),
            value BLOB NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events (polled by the gateway)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            tx_id TEXT NOT NULL,
            function TEXT NOT NULL,
            keys TEXT NOT NULL,
            committed_at TEXT NOT NULL
        )",
        [],
    )?;

    // Customers touched by each event, so filtered polls page over matches only
    conn.execute(
        "CREATE TABLE IF NOT EXISTS event_customers (
            seq INTEGER NOT NULL REFERENCES events(seq),
            customer TEXT NOT NULL,
            PRIMARY KEY (customer, seq)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_key_versions_key ON key_versions(key, id)",
        [],
    )?;

    Ok(())
}

impl SqliteStore {
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        tracing::info!(path = %path.display(), "ledger database opened");
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::storage("sqlite connection lock poisoned"))
    }
}

impl VersionStore for SqliteStore {
    fn latest(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM key_versions
                 WHERE key = ?1
                 ORDER BY id DESC
                 LIMIT 1",
                params![key.as_bytes()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn history(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT v.tx_id, t.committed_at, v.value
             FROM key_versions v
             JOIN transactions t ON t.tx_id = v.tx_id
             WHERE v.key = ?1
             ORDER BY v.id DESC",
        )?;

        let items = stmt
            .query_map(params![key.as_bytes()], |row| {
                let committed_at: String = row.get(1)?;
                Ok(KeyModification {
                    tx_id: row.get(0)?,
                    timestamp: from_text(&committed_at)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Box::new(BufferedHistory::new(items)))
    }

    fn commit(&self, record: &CommitRecord) -> LedgerResult<LedgerEvent> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let committed_at = to_text(record.timestamp);

        tx.execute(
            "INSERT INTO transactions (tx_id, function, committed_at) VALUES (?1, ?2, ?3)",
            params![record.tx_id, record.function, committed_at],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation => {
                LedgerError::storage(format!("duplicate transaction id {}", record.tx_id))
            }
            other => other.into(),
        })?;

        for (key, value) in &record.writes {
            tx.execute(
                "INSERT INTO key_versions (key, tx_id, value) VALUES (?1, ?2, ?3)",
                params![key.as_bytes(), record.tx_id, value],
            )?;
        }

        let keys: Vec<&str> = record.writes.iter().map(|(k, _)| k.as_str()).collect();
        let mut event = LedgerEvent::new(0, &record.tx_id, &record.function, &keys, record.timestamp);
        let keys_json =
            serde_json::to_string(&event.keys).map_err(|e| LedgerError::Encoding(e.to_string()))?;

        tx.execute(
            "INSERT INTO events (event_id, tx_id, function, keys, committed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event.event_id, event.tx_id, event.function, keys_json, committed_at],
        )?;
        event.sequence = tx.last_insert_rowid();

        for key in &keys {
            if let Some((_, customer)) = KeyBuilder::split(key) {
                tx.execute(
                    "INSERT OR IGNORE INTO event_customers (seq, customer) VALUES (?1, ?2)",
                    params![event.sequence, customer],
                )?;
            }
        }

        tx.commit()?;
        Ok(event)
    }

    fn info(&self) -> LedgerResult<LedgerInfo> {
        let conn = self.lock()?;

        let height: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        let key_count: i64 =
            conn.query_row("SELECT COUNT(DISTINCT key) FROM key_versions", [], |row| row.get(0))?;
        let last: Option<(String, String)> = conn
            .query_row(
                "SELECT tx_id, committed_at FROM transactions ORDER BY seq DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (current_tx_id, last_commit) = match last {
            Some((tx_id, at)) => (Some(tx_id), Some(from_text(&at)?)),
            None => (None, None),
        };

        Ok(LedgerInfo {
            height: height as u64,
            key_count: key_count as u64,
            current_tx_id,
            last_commit,
        })
    }

    fn events_after(
        &self,
        after: i64,
        customer: Option<&str>,
        limit: usize,
    ) -> LedgerResult<Vec<LedgerEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT seq, event_id, tx_id, function, keys, committed_at
             FROM events
             WHERE seq > ?1
               AND (?2 IS NULL OR seq IN (SELECT seq FROM event_customers WHERE customer = ?2))
             ORDER BY seq ASC
             LIMIT ?3",
        )?;

        let events = stmt
            .query_map(params![after, customer, limit as i64], |row| {
                let keys_json: String = row.get(4)?;
                let committed_at: String = row.get(5)?;
                Ok(LedgerEvent {
                    sequence: row.get(0)?,
                    event_id: row.get(1)?,
                    tx_id: row.get(2)?,
                    function: row.get(3)?,
                    keys: serde_json::from_str(&keys_json).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
                    })?,
                    committed_at: from_text(&committed_at)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }
}
