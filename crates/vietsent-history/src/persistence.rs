//! SQLite history repository
//!
//! A single connection behind a mutex serializes every operation, so an
//! append and its retention trim are never interleaved with another writer
//! and readers only ever see committed state.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};
use vietsent_core::{Error, HistoryRecord, Result, Sentiment};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sentiment_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    confidence REAL NOT NULL,
    created_at TEXT NOT NULL
);";

const TRIM_SQL: &str = "DELETE FROM sentiment_history
    WHERE id NOT IN (SELECT id FROM sentiment_history ORDER BY id DESC LIMIT ?1)";

/// Configuration for the history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// SQLite database file
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Records kept after each append; `<= 0` keeps everything
    #[serde(default = "default_retain")]
    pub retain: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            retain: default_retain(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("data/sentiment_history.sqlite3")
}

fn default_retain() -> i64 {
    50
}

fn storage(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::storage(format!("{context}: {e}"))
}

pub struct HistoryRepository {
    conn: Mutex<Connection>,
    retain: i64,
}

impl HistoryRepository {
    /// Open (creating if needed) the database at `config.path`
    pub fn open(config: &HistoryConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.path).map_err(|e| {
            Error::storage(format!(
                "failed to open sqlite database at {}: {e}",
                config.path.display()
            ))
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(storage("failed to configure sqlite pragmas"))?;

        info!(
            path = %config.path.display(),
            retain = config.retain,
            "Opened history database"
        );
        Self::init(conn, config.retain)
    }

    /// Private in-memory database
    pub fn open_in_memory(retain: i64) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage("failed to open in-memory database"))?;
        Self::init(conn, retain)
    }

    fn init(conn: Connection, retain: i64) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(storage("failed to create history schema"))?;
        Ok(Self {
            conn: Mutex::new(conn),
            retain,
        })
    }

    /// Retention bound, `<= 0` when disabled
    pub fn retain(&self) -> i64 {
        self.retain
    }

    /// Persist a classification and enforce retention.
    ///
    /// The insert and the trim commit together: a concurrent reader sees the
    /// log either before or after both.
    pub fn append(&self, text: &str, sentiment: Sentiment, confidence: f64) -> Result<HistoryRecord> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(Error::validation(format!(
                "confidence must be within [0, 1], got {confidence}"
            )));
        }

        let created_at = Utc::now().trunc_subsecs(6);

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(storage("failed to start history transaction"))?;

        tx.execute(
            "INSERT INTO sentiment_history (text, sentiment, confidence, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                text,
                sentiment.as_str(),
                confidence,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
            ],
        )
        .map_err(storage("failed to insert history record"))?;
        let id = tx.last_insert_rowid();

        if self.retain > 0 {
            let trimmed = tx
                .execute(TRIM_SQL, params![self.retain])
                .map_err(storage("failed to trim history"))?;
            if trimmed > 0 {
                debug!(trimmed, retain = self.retain, "Trimmed history");
                metrics::counter!("vietsent_history_trimmed_total").increment(trimmed as u64);
            }
        }

        tx.commit().map_err(storage("failed to commit history record"))?;

        Ok(HistoryRecord {
            id,
            text: text.to_string(),
            sentiment,
            confidence,
            created_at,
        })
    }

    /// Most recent records first, at most `limit` of them
    pub fn list_recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        if limit == 0 {
            return Err(Error::validation("limit must be a positive integer"));
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, text, sentiment, confidence, created_at
                 FROM sentiment_history ORDER BY id DESC LIMIT ?1",
            )
            .map_err(storage("failed to prepare history query"))?;

        let rows = stmt
            .query_map(params![limit], parse_record_row)
            .map_err(storage("failed to query history"))?;

        let records = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage("failed to read history row"))?;
        Ok(records)
    }

    /// Remove every record. Safe to call repeatedly.
    pub fn clear(&self) -> Result<()> {
        let removed = self
            .conn
            .lock()
            .execute("DELETE FROM sentiment_history", [])
            .map_err(storage("failed to clear history"))?;
        info!(removed, "Cleared history");
        Ok(())
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM sentiment_history", [], |row| row.get(0))
            .map_err(storage("failed to count history"))?;
        Ok(count as usize)
    }
}

fn parse_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRecord> {
    let sentiment_raw: String = row.get(2)?;
    let created_at_raw: String = row.get(4)?;

    let sentiment = sentiment_raw.parse::<Sentiment>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = parse_timestamp(&created_at_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(HistoryRecord {
        id: row.get(0)?,
        text: row.get(1)?,
        sentiment,
        confidence: row.get(3)?,
        created_at,
    })
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

impl std::fmt::Debug for HistoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryRepository")
            .field("retain", &self.retain)
            .finish_non_exhaustive()
    }
}
