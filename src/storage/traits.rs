//! Storage traits and error types
//!
//! Two backends live behind this module: the local SQLite session ledger
//! ([`Storage`]) and the remote named-graph store the harvested triples are
//! written to ([`GraphStore`]).

use crate::provenance::ProvenanceRecord;
use crate::rdf::RdfError;
use crate::state::CrawlSession;
use crate::storage::SessionRecord;
use async_trait::async_trait;
use oxrdf::{Graph, Quad, Triple, TripleRef};
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for ledger operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for session ledger implementations
pub trait Storage {
    // ===== Session Management =====

    /// Inserts a new session row
    fn create_session(&mut self, session: &CrawlSession) -> StorageResult<()>;

    /// Writes state, depth, finish time, error and stop reason back
    fn update_session(&mut self, session: &CrawlSession) -> StorageResult<()>;

    /// Gets a session by id
    fn get_session(&self, id: &str) -> StorageResult<SessionRecord>;

    /// Gets the most recently started session
    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>>;

    /// Lists every session, newest first
    fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>>;

    // ===== Visited URLs =====

    /// Records a processed URL; returns false if it was already recorded
    fn record_visit(&mut self, session_id: &str, url: &str, depth: u32) -> StorageResult<bool>;

    /// Loads every URL a session has processed
    fn load_visited(&self, session_id: &str) -> StorageResult<Vec<String>>;

    fn count_visited(&self, session_id: &str) -> StorageResult<u64>;

    // ===== Provenance =====

    /// Appends one provenance record
    fn insert_provenance(&mut self, session_id: &str, record: &ProvenanceRecord)
        -> StorageResult<()>;

    /// Loads a session's provenance records in insertion order
    fn load_provenance(&self, session_id: &str) -> StorageResult<Vec<ProvenanceRecord>>;

    /// Sum of triple counts over a session's provenance records
    fn count_triples(&self, session_id: &str) -> StorageResult<u64>;

    /// Record counts grouped by source kind label
    fn count_by_source(&self, session_id: &str) -> StorageResult<Vec<(String, u64)>>;

    /// Record counts grouped by format
    fn count_by_format(&self, session_id: &str) -> StorageResult<Vec<(String, u64)>>;

    // ===== Frontier =====

    /// Replaces the stored frontier of a session
    fn save_frontier(&mut self, session_id: &str, urls: &[String]) -> StorageResult<()>;

    /// Loads the stored frontier in selection order
    fn load_frontier(&self, session_id: &str) -> StorageResult<Vec<String>>;
}

/// Errors returned by a graph store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid endpoint response: {0}")]
    Response(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] RdfError),
}

/// A named graph and its size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub name: String,
    pub triples: u64,
}

/// Statements touching one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDescription {
    /// Statements with the resource as subject
    pub outbound: Vec<Triple>,

    /// Statements with the resource as object
    pub inbound: Vec<Triple>,
}

impl ResourceDescription {
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.inbound.is_empty()
    }

    /// Both directions as one triple set
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new();
        for triple in self.outbound.iter().chain(&self.inbound) {
            graph.insert(triple);
        }
        graph
    }
}

/// Named-graph store the harvested triples are written to
///
/// Writes are keyed by graph name and carry no blank nodes (remote stores
/// skolemize them), so retrying one is harmless: creating a graph that
/// already exists or merging triples already present leaves the store
/// unchanged.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Whether the named graph holds any triple
    async fn graph_exists(&self, graph: &str) -> Result<bool, StoreError>;

    /// Inserts a graph that does not exist yet
    async fn create_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError>;

    /// Adds triples to an existing graph, keeping what it already holds
    async fn merge_into_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError>;

    /// Total number of triples across all named graphs
    async fn count_triples(&self) -> Result<u64, StoreError>;

    /// Named graphs with their sizes, largest first
    async fn list_graphs(&self) -> Result<Vec<GraphSummary>, StoreError>;

    /// Quads of one named graph, or of every named graph when `graph` is `None`
    async fn quads(&self, graph: Option<&str>) -> Result<Vec<Quad>, StoreError>;

    /// Every triple of one named graph
    async fn graph_triples(&self, graph: &str) -> Result<Graph, StoreError> {
        let mut triples = Graph::new();
        for quad in self.quads(Some(graph)).await? {
            triples.insert(TripleRef::from(quad.as_ref()));
        }
        Ok(triples)
    }

    /// Statements about `resource` across all named graphs, at most `limit` each way
    async fn describe(&self, resource: &str, limit: usize) -> Result<ResourceDescription, StoreError>;

    /// Checks that the store answers at all
    async fn ping(&self) -> Result<(), StoreError>;
}
