//! Database module for checkup-bot
//!
//! Provides persistence for end-of-session summaries.

mod schema;

pub use schema::*;

use crate::report::SummaryRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid stored document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("Could not create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // ==================== Summary Operations ====================

    /// Store the record produced at the end of a session
    pub fn insert_summary(&self, session_id: &str, record: &SummaryRecord) -> DbResult<StoredSummary> {
        let conn = self.lock()?;
        let now = Utc::now();
        let document = record.to_document();
        let severity = record
            .severity()
            .and_then(crate::report::Severity::label)
            .map(String::from);

        conn.execute(
            "INSERT INTO summaries (session_id, username, severity, document, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                record.username(),
                severity,
                serde_json::to_string(&document)?,
                now.to_rfc3339()
            ],
        )?;

        Ok(StoredSummary {
            id: conn.last_insert_rowid(),
            session_id: session_id.to_string(),
            username: record.username().to_string(),
            severity,
            document,
            created_at: now,
        })
    }

    /// Page through a user's summaries, newest first
    pub fn list_summaries(&self, query: &SummaryQuery) -> DbResult<Vec<StoredSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, username, severity, document, created_at
             FROM summaries
             WHERE username = ?1 AND (?2 IS NULL OR severity = ?2)
             ORDER BY created_at DESC, id DESC
             LIMIT ?3 OFFSET ?4",
        )?;

        let rows = stmt.query_map(
            params![
                query.username,
                query.severity,
                i64::from(query.limit),
                i64::try_from(query.offset()).unwrap_or(i64::MAX)
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, session_id, username, severity, document, created_at) = row?;
            summaries.push(StoredSummary {
                id,
                session_id,
                username,
                severity,
                document: serde_json::from_str(&document)?,
                created_at: parse_datetime(&created_at),
            });
        }
        Ok(summaries)
    }

    /// Number of summaries matching the query's filters (paging ignored)
    pub fn count_summaries(&self, query: &SummaryQuery) -> DbResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM summaries WHERE username = ?1 AND (?2 IS NULL OR severity = ?2)",
            params![query.username, query.severity],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
