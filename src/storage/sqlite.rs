//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::provenance::{ProvenanceRecord, SourceKind};
use crate::state::{CrawlSession, SessionState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::SessionRecord;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fmt;
use std::path::Path;

const SESSION_COLUMNS: &str =
    "id, seeds, started_at, finished_at, state, depth, config_hash, error, stop_reason";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the ledger at `path`
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory ledger, used by tests and `--dry-store` runs
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn grouped_counts(&self, sql: &str, session_id: &str) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![session_id], |row| {
            let key: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((key, count.max(0) as u64))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// A column value that does not decode into its Rust type
#[derive(Debug)]
struct InvalidColumn(String);

impl fmt::Display for InvalidColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidColumn {}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(InvalidColumn(message)))
}

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| invalid_column(index, format!("bad timestamp {:?}: {}", value, e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let seeds: String = row.get(1)?;
    let seeds: Vec<String> = serde_json::from_str(&seeds)
        .map_err(|e| invalid_column(1, format!("bad seed list: {}", e)))?;

    let started_at: String = row.get(2)?;
    let finished_at: Option<String> = row.get(3)?;
    let state: String = row.get(4)?;
    let state = SessionState::from_db_string(&state)
        .ok_or_else(|| invalid_column(4, format!("unknown session state {:?}", state)))?;

    Ok(SessionRecord {
        id: row.get(0)?,
        seeds,
        started_at: parse_timestamp(2, &started_at)?,
        finished_at: finished_at
            .as_deref()
            .map(|t| parse_timestamp(3, t))
            .transpose()?,
        state,
        depth: row.get(5)?,
        config_hash: row.get(6)?,
        error: row.get(7)?,
        stop_reason: row.get(8)?,
    })
}

fn provenance_from_row(row: &Row<'_>) -> rusqlite::Result<ProvenanceRecord> {
    let resource: String = row.get(0)?;
    let source: String = row.get(1)?;
    let source = SourceKind::parse(&source)
        .ok_or_else(|| invalid_column(1, format!("unknown source kind {:?}", source)))?;
    let triple_count: i64 = row.get(2)?;
    let recorded_at: String = row.get(7)?;

    let mut record = ProvenanceRecord::new(resource, source, triple_count.max(0) as usize, row.get(5)?)
        .with_format(row.get::<_, Option<String>>(3)?)
        .with_content_type(row.get::<_, Option<String>>(4)?)
        .with_recorded_at(parse_timestamp(7, &recorded_at)?);
    record.graph = row.get(6)?;
    Ok(record)
}

impl Storage for SqliteStorage {
    // ===== Session Management =====

    fn create_session(&mut self, session: &CrawlSession) -> StorageResult<()> {
        let seeds = serde_json::to_string(&session.seeds)?;
        self.conn.execute(
            "INSERT INTO sessions (id, seeds, started_at, finished_at, state, depth, config_hash, error, stop_reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.id,
                seeds,
                session.started_at.to_rfc3339(),
                session.finished_at.map(|t| t.to_rfc3339()),
                session.state.to_db_string(),
                session.depth,
                session.config_hash,
                session.error,
                session.stop_reason.map(|r| r.as_str()),
            ],
        )?;
        Ok(())
    }

    fn update_session(&mut self, session: &CrawlSession) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE sessions
             SET state = ?2, depth = ?3, finished_at = ?4, error = ?5, stop_reason = ?6
             WHERE id = ?1",
            params![
                session.id,
                session.state.to_db_string(),
                session.depth,
                session.finished_at.map(|t| t.to_rfc3339()),
                session.error,
                session.stop_reason.map(|r| r.as_str()),
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::SessionNotFound(session.id.clone()));
        }
        Ok(())
    }

    fn get_session(&self, id: &str) -> StorageResult<SessionRecord> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS);
        self.conn
            .query_row(&sql, params![id], session_from_row)
            .optional()?
            .ok_or_else(|| StorageError::SessionNotFound(id.to_string()))
    }

    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>> {
        let sql = format!(
            "SELECT {} FROM sessions ORDER BY started_at DESC, rowid DESC LIMIT 1",
            SESSION_COLUMNS
        );
        Ok(self.conn.query_row(&sql, [], session_from_row).optional()?)
    }

    fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>> {
        let sql = format!(
            "SELECT {} FROM sessions ORDER BY started_at DESC, rowid DESC",
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let sessions = stmt
            .query_map([], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    // ===== Visited URLs =====

    fn record_visit(&mut self, session_id: &str, url: &str, depth: u32) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO visited_urls (session_id, url, depth, visited_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, url, depth, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    fn load_visited(&self, session_id: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM visited_urls WHERE session_id = ?1 ORDER BY url")?;
        let urls = stmt
            .query_map(params![session_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn count_visited(&self, session_id: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM visited_urls WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    // ===== Provenance =====

    fn insert_provenance(
        &mut self,
        session_id: &str,
        record: &ProvenanceRecord,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO provenance_records
             (session_id, resource, source, triple_count, format, content_type, depth, graph, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session_id,
                record.resource,
                record.source.to_string(),
                i64::try_from(record.triple_count).unwrap_or(i64::MAX),
                record.format,
                record.content_type,
                record.depth,
                record.graph,
                record.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load_provenance(&self, session_id: &str) -> StorageResult<Vec<ProvenanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT resource, source, triple_count, format, content_type, depth, graph, recorded_at
             FROM provenance_records WHERE session_id = ?1 ORDER BY id",
        )?;
        let records = stmt
            .query_map(params![session_id], provenance_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_triples(&self, session_id: &str) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(triple_count), 0) FROM provenance_records WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    fn count_by_source(&self, session_id: &str) -> StorageResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT source, COUNT(*) AS n FROM provenance_records
             WHERE session_id = ?1 GROUP BY source ORDER BY n DESC, source",
            session_id,
        )
    }

    fn count_by_format(&self, session_id: &str) -> StorageResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT format, COUNT(*) AS n FROM provenance_records
             WHERE session_id = ?1 AND format IS NOT NULL GROUP BY format ORDER BY n DESC, format",
            session_id,
        )
    }

    // ===== Frontier =====

    fn save_frontier(&mut self, session_id: &str, urls: &[String]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM frontier WHERE session_id = ?1",
            params![session_id],
        )?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO frontier (session_id, position, url) VALUES (?1, ?2, ?3)")?;
            for (position, url) in urls.iter().enumerate() {
                stmt.execute(params![session_id, position as i64, url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_frontier(&self, session_id: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM frontier WHERE session_id = ?1 ORDER BY position")?;
        let urls = stmt
            .query_map(params![session_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }
}
