//! Database schema definitions for the session ledger
//!
//! The ledger keeps what a later `status`, `stats`, `continue` or
//! `export-provenance` invocation needs to know about a session.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawl session
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    seeds TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    state TEXT NOT NULL,
    depth INTEGER NOT NULL DEFAULT 0,
    config_hash TEXT NOT NULL,
    error TEXT,
    stop_reason TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_started ON sessions(started_at);

-- URLs processed by a session
CREATE TABLE IF NOT EXISTS visited_urls (
    session_id TEXT NOT NULL REFERENCES sessions(id),
    url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    visited_at TEXT NOT NULL,
    PRIMARY KEY (session_id, url)
);

-- Resources whose triples reached the graph store
CREATE TABLE IF NOT EXISTS provenance_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    resource TEXT NOT NULL,
    source TEXT NOT NULL,
    triple_count INTEGER NOT NULL,
    format TEXT,
    content_type TEXT,
    depth INTEGER NOT NULL,
    graph TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_provenance_session ON provenance_records(session_id);

-- Latest frontier of a session, kept for continuation
CREATE TABLE IF NOT EXISTS frontier (
    session_id TEXT NOT NULL REFERENCES sessions(id),
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    PRIMARY KEY (session_id, position)
);
"#;

/// Initializes the database schema
///
/// Safe to run against an existing ledger; every statement is `IF NOT EXISTS`.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
