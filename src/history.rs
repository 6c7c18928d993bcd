use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use rusqlite::{params, types::Type, Connection, Row};
use serde::Serialize;
use tracing::debug;

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::session::CompletionReason;

/// Outcome of one finished practice session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub category: String,
    pub item: String,
    pub wpm: u32,
    pub accuracy: u32,
    /// Only present when flow tracking was enabled for the session
    pub flow: Option<u32>,
    pub elapsed_ms: u64,
    pub chars_typed: usize,
    pub completion: CompletionReason,
    pub finished_at: DateTime<Local>,
}

const SELECT_COLUMNS: &str = "category, item, wpm, accuracy, flow, elapsed_ms, chars_typed, completion, finished_at";

/// SQLite-backed store of completed session summaries
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database under the application state directory
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().ok_or(Error::NoStateDir)?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening history database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS session_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                item TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                flow INTEGER,
                elapsed_ms INTEGER NOT NULL,
                chars_typed INTEGER NOT NULL,
                completion TEXT NOT NULL,
                finished_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_session_history_item ON session_history(category, item)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record(&self, summary: &SessionSummary) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO session_history
            (category, item, wpm, accuracy, flow, elapsed_ms, chars_typed, completion, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                summary.category,
                summary.item,
                summary.wpm,
                summary.accuracy,
                summary.flow,
                summary.elapsed_ms,
                summary.chars_typed,
                summary.completion.to_string(),
                summary.finished_at.to_rfc3339(),
            ],
        )?;
        debug!(
            category = %summary.category,
            item = %summary.item,
            wpm = summary.wpm,
            "recorded session summary"
        );
        Ok(())
    }

    /// Most recent sessions first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM session_history ORDER BY id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map([limit as i64], summary_from_row)?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    /// Fastest session for an item, ties broken by accuracy then recency
    pub fn personal_best(&self, category: &str, item: &str) -> Result<Option<SessionSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM session_history
            WHERE category = ?1 AND item = ?2
            ORDER BY wpm DESC, accuracy DESC, id DESC
            LIMIT 1
            "#
        ))?;
        let mut rows = stmt.query_map([category, item], summary_from_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM session_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session_history", [])?;
        Ok(())
    }

    /// Write every stored session, oldest first, as CSV with a header row.
    /// Returns the number of data rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM session_history ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map([], summary_from_row)?;

        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut written = 0;
        for row in rows {
            csv_writer.serialize(row?)?;
            written += 1;
        }
        csv_writer.flush()?;

        debug!(rows = written, "exported session history");
        Ok(written)
    }
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<SessionSummary> {
    let completion_label: String = row.get(7)?;
    let completion = CompletionReason::from_label(&completion_label)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(7, "completion".to_string(), Type::Text))?;

    let finished_at_str: String = row.get(8)?;
    let finished_at = DateTime::parse_from_rfc3339(&finished_at_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?
        .with_timezone(&Local);

    Ok(SessionSummary {
        category: row.get(0)?,
        item: row.get(1)?,
        wpm: row.get(2)?,
        accuracy: row.get(3)?,
        flow: row.get(4)?,
        elapsed_ms: row.get(5)?,
        chars_typed: row.get(6)?,
        completion,
        finished_at,
    })
}
