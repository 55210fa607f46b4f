//! Storage module for persisting crawl data
//!
//! This module handles:
//! - The SQLite session ledger (sessions, visited URLs, provenance, frontier)
//! - The remote named-graph store reached over the SPARQL 1.1 protocol
//! - Reading graphs back for export, exploration and ad-hoc queries
//! - An in-memory graph store for tests and dry runs
//! - The retrying gateway the crawl engine writes through

mod gateway;
mod memory;
mod schema;
mod sparql;
mod sqlite;
mod traits;

pub use gateway::GraphStoreGateway;
pub use memory::MemoryGraphStore;
pub use sparql::SparqlGraphStore;
pub use sqlite::SqliteStorage;
pub use sparql::{query_form, QueryForm, QueryOutcome};
pub use traits::{
    GraphStore, GraphSummary, ResourceDescription, Storage, StorageError, StorageResult,
    StoreError,
};

use crate::state::{CrawlSession, SessionLimits, SessionState};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens the session ledger
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    SqliteStorage::new(path)
}

/// Represents a session in the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: String,
    pub seeds: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: SessionState,
    pub depth: u32,
    pub config_hash: String,
    pub error: Option<String>,
    pub stop_reason: Option<String>,
}

impl SessionRecord {
    /// Rebuilds a live session, running under `limits`
    pub fn into_session(self, limits: SessionLimits) -> CrawlSession {
        CrawlSession::restore(
            self.id,
            self.seeds,
            self.started_at,
            self.finished_at,
            self.depth,
            self.state,
            limits,
            self.config_hash,
            self.error,
        )
    }
}

impl From<&CrawlSession> for SessionRecord {
    fn from(session: &CrawlSession) -> Self {
        Self {
            id: session.id.clone(),
            seeds: session.seeds.clone(),
            started_at: session.started_at,
            finished_at: session.finished_at,
            state: session.state,
            depth: session.depth,
            config_hash: session.config_hash.clone(),
            error: session.error.clone(),
            stop_reason: session.stop_reason.map(|r| r.as_str().to_string()),
        }
    }
}
