use crate::config::CrawlerConfig;
use crate::state::SessionState;
use crate::{HarvestError, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

/// Budgets a session runs under, fixed when it starts
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLimits {
    pub max_depth: u32,
    pub max_resources_per_level: usize,
    pub max_resources: usize,
    pub max_triples: usize,
    pub timeout: Duration,
    pub relevance_threshold: f64,
    pub parallel: bool,
    pub max_workers: usize,
    pub stagnation_checks: u32,
}

impl From<&CrawlerConfig> for SessionLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_resources_per_level: config.max_resources_per_level,
            max_resources: config.max_resources,
            max_triples: config.max_triples,
            timeout: config.timeout(),
            relevance_threshold: config.relevance_threshold,
            parallel: config.parallel,
            max_workers: config.max_workers,
            stagnation_checks: config.stagnation_checks,
        }
    }
}

/// Why the depth loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DepthLimit,
    Timeout,
    TripleLimit,
    ResourceLimit,
    Stagnation,
    EmptyFrontier,
    Cancelled,
    RoundFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepthLimit => "depth_limit",
            Self::Timeout => "timeout",
            Self::TripleLimit => "triple_limit",
            Self::ResourceLimit => "resource_limit",
            Self::Stagnation => "stagnation",
            Self::EmptyFrontier => "empty_frontier",
            Self::Cancelled => "cancelled",
            Self::RoundFailed => "round_failed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One crawl run
#[derive(Debug, Clone)]
pub struct CrawlSession {
    pub id: String,
    pub seeds: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub depth: u32,
    pub state: SessionState,
    pub limits: SessionLimits,
    pub config_hash: String,
    pub error: Option<String>,
    pub stop_reason: Option<StopReason>,

    /// Monotonic start of the current run, for the time budget
    clock: Instant,
}

impl CrawlSession {
    /// Creates an idle session for the given (already normalized) seeds
    pub fn new(seeds: Vec<String>, limits: SessionLimits, config_hash: String) -> Self {
        let started_at = Utc::now();
        let id = crawl_id(seeds.first().map(String::as_str).unwrap_or_default(), started_at);
        Self {
            id,
            seeds,
            started_at,
            finished_at: None,
            depth: 0,
            state: SessionState::Idle,
            limits,
            config_hash,
            error: None,
            stop_reason: None,
            clock: Instant::now(),
        }
    }

    /// Rebuilds a session loaded from the ledger
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: String,
        seeds: Vec<String>,
        started_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
        depth: u32,
        state: SessionState,
        limits: SessionLimits,
        config_hash: String,
        error: Option<String>,
    ) -> Self {
        Self {
            id,
            seeds,
            started_at,
            finished_at,
            depth,
            state,
            limits,
            config_hash,
            error,
            stop_reason: None,
            clock: Instant::now(),
        }
    }

    /// Moves the session to `next`, enforcing the lifecycle
    ///
    /// Entering `Running` restarts the time budget; entering a terminal
    /// state stamps `finished_at`.
    pub fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        } else if next == SessionState::Running {
            self.finished_at = None;
            self.clock = Instant::now();
        }
        Ok(())
    }

    /// Wall-clock time spent in the current run
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Progress estimate in percent
    ///
    /// Depth-based while running (capped at 99), 100 once terminal.
    pub fn progress(&self) -> u8 {
        if self.state.is_terminal() {
            return 100;
        }
        if self.limits.max_depth == 0 {
            return 0;
        }
        let estimate = u64::from(self.depth) * 80 / u64::from(self.limits.max_depth);
        estimate.min(99) as u8
    }
}

/// Builds a session id from the first seed's host and a UTC timestamp
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use signpost_harvest::state::crawl_id;
///
/// let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
/// assert_eq!(crawl_id("https://zenodo.org/records/1", at), "zenodo.org_20240501_093000");
/// ```
pub fn crawl_id(seed: &str, at: DateTime<Utc>) -> String {
    let host = Url::parse(seed)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "crawl".to_string());

    let host: String = host
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}_{}", host, at.format("%Y%m%d_%H%M%S"))
}

/// URLs already processed in a session
///
/// Check-and-mark is a single locked operation so concurrent workers never
/// process the same URL twice.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` visited; returns false if it already was
    pub fn try_mark(&self, url: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string())
    }

    /// Releases a mark, e.g. when the work it claimed did not complete
    pub fn unmark(&self, url: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds previously visited URLs, e.g. when resuming from the ledger
    pub fn extend<I: IntoIterator<Item = String>>(&self, urls: I) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(urls);
    }

    pub fn snapshot(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        urls.sort();
        urls
    }
}

/// Relevance scores computed during a session
#[derive(Debug, Default)]
pub struct ScoreCache {
    inner: Mutex<HashMap<String, f64>>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<f64> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
    }

    /// Caches `score` unless a score is already present; returns the cached value
    ///
    /// The first stored score wins, so every reader sees the same value.
    pub fn insert_if_absent(&self, url: &str, score: f64) -> f64 {
        *self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_insert(score)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Detects a plateau in cumulative triple ingestion
///
/// A check counts as unchanged when the total did not grow since the
/// previous check; any growth resets the count. The crawl should stop once
/// `limit` consecutive unchanged checks have been seen.
#[derive(Debug, Clone)]
pub struct StagnationTracker {
    limit: u32,
    last: Option<usize>,
    unchanged: u32,
}

impl StagnationTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            last: None,
            unchanged: 0,
        }
    }

    /// Records the current total; returns false once ingestion has stalled
    pub fn observe(&mut self, total: usize) -> bool {
        match self.last {
            Some(last) if total <= last => self.unchanged += 1,
            _ => self.unchanged = 0,
        }
        self.last = Some(total);
        self.unchanged < self.limit
    }

    pub fn unchanged_checks(&self) -> u32 {
        self.unchanged
    }
}
