use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Signpost-Harvest
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub output: OutputConfig,
}

/// Crawl budgets and traversal behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of depth levels to traverse from the seeds
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Frontier size cap for each depth level
    #[serde(rename = "max-resources-per-level")]
    pub max_resources_per_level: usize,

    /// Stop once more than this many URLs have been visited
    #[serde(rename = "max-resources")]
    pub max_resources: usize,

    /// Stop once more than this many triples have been ingested
    #[serde(rename = "max-triples")]
    pub max_triples: usize,

    /// Minimum relevance score required for ingestion
    #[serde(rename = "relevance-threshold")]
    pub relevance_threshold: f64,

    /// Wall-clock budget for one session, in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Fan a round out across a worker pool
    pub parallel: bool,

    /// Worker pool size when `parallel` is set
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Consecutive rounds without triple growth tolerated before stopping
    #[serde(rename = "stagnation-checks")]
    pub stagnation_checks: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_resources_per_level: 5,
            max_resources: 500,
            max_triples: 10_000,
            relevance_threshold: 0.5,
            timeout_secs: 300,
            parallel: false,
            max_workers: 5,
            stagnation_checks: 3,
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP client identification and per-call deadlines
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Deadline for header-only probes, in seconds
    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,

    /// Deadline for body fetches, in seconds
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            crawler_name: "FAIR-Signposting-Crawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "http://crawler.fair-signposting.org/".to_string(),
            probe_timeout_secs: 5,
            fetch_timeout_secs: 10,
        }
    }
}

impl HttpConfig {
    /// Formats the User-Agent header value
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{}; Mozilla Compatible)",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Remote graph store (SPARQL 1.1 protocol) settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the store server
    pub endpoint: String,

    /// Dataset name appended to the endpoint
    pub dataset: String,

    /// Write attempts before giving up on a graph
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Fixed delay between write attempts, in milliseconds
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Serialized payload size above which merges are chunked
    #[serde(rename = "chunk-threshold-bytes")]
    pub chunk_threshold_bytes: usize,

    /// Number of N-Triples lines per chunk
    #[serde(rename = "chunk-lines")]
    pub chunk_lines: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3030".to_string(),
            dataset: "knowledge_graph".to_string(),
            max_retries: 3,
            retry_delay_ms: 1000,
            chunk_threshold_bytes: 100_000,
            chunk_lines: 1000,
        }
    }
}

impl StoreConfig {
    /// SPARQL query service URL
    pub fn query_url(&self) -> String {
        format!("{}/{}/query", self.endpoint.trim_end_matches('/'), self.dataset)
    }

    /// SPARQL update service URL
    pub fn update_url(&self) -> String {
        format!("{}/{}/update", self.endpoint.trim_end_matches('/'), self.dataset)
    }

    /// Server health check URL
    pub fn ping_url(&self) -> String {
        format!("{}/$/ping", self.endpoint.trim_end_matches('/'))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite session ledger
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving exported provenance files
    #[serde(rename = "export-dir")]
    pub export_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./signpost-harvest.db".to_string(),
            export_dir: "./exports".to_string(),
        }
    }
}
