//! Signpost-Harvest: a FAIR signposting linked-data harvester
//!
//! This crate follows typed links (HTTP `Link` headers and HTML `rel` markup)
//! from landing pages to their machine-readable counterparts, parses whatever
//! RDF it finds, scores it for relevance and ingests the worthwhile parts into
//! a remote graph store, keeping a provenance record of every ingestion.

pub mod config;
pub mod crawler;
pub mod output;
pub mod provenance;
pub mod rdf;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Signpost-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Graph store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("RDF error: {0}")]
    Rdf(#[from] rdf::RdfError),

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: state::SessionState,
        to: state::SessionState,
    },

    #[error("No seed URL supplied")]
    MissingSeed,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Crawl round failed: {0}")]
    Round(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Unfollowable reference: {0}")]
    Unfollowable(String),
}

/// Result type alias for Signpost-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlStatus};
pub use state::{CrawlSession, SessionState};
pub use url::{normalize_url, resolve_reference, split_seeds};
