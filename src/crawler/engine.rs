//! Crawl engine - depth-by-depth orchestration of one session
//!
//! This module drives a crawl session through its lifecycle:
//! - Processing every frontier URL of a round (sequentially or on a worker pool)
//! - Scoring and conditionally ingesting what each URL yields
//! - Selecting a domain-diverse frontier for the next depth
//! - Enforcing depth, time, volume and stagnation budgets
//! - Checkpointing and exporting provenance
//! - Mirroring session progress into the SQLite ledger when one is attached

use super::fetcher::{build_http_client, ResourceFetcher};
use super::frontier::{select_frontier, FrontierSelection};
use super::scorer::RelevanceScorer;
use super::signposting::{is_priority_relation, DiscoveryCounts, SignpostingResolver};
use crate::config::Config;
use crate::output::write_provenance_file;
use crate::provenance::{
    export_provenance_graph, final_provenance_graph_name, harvest_graph_name,
    interim_provenance_graph_name, provenance_graph_name, resource_provenance_graph,
    ProvenanceAccountant, ProvenanceRecord, SourceKind,
};
use crate::state::{
    CrawlSession, ScoreCache, SessionLimits, SessionState, StagnationTracker, StopReason,
    VisitedSet,
};
use crate::storage::{GraphStore, GraphStoreGateway, Storage, StorageResult};
use crate::url::{classify_url, normalize_url, resolve_reference};
use crate::{HarvestError, Result};
use chrono::Utc;
use oxrdf::Graph;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// Snapshot of a session, cheap to poll while a crawl runs
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatus {
    pub session_id: String,
    pub active: bool,
    pub progress: u8,
    pub depth: u32,
    pub max_depth: u32,
    pub resources_visited: usize,
    pub triples_collected: usize,
    pub state: SessionState,
    pub stop_reason: Option<StopReason>,
    pub error: Option<String>,
}

type Ledger = Box<dyn Storage + Send>;

/// Runs one crawl session
///
/// Cloning is cheap and every clone drives the same session, so a clone can
/// poll [`CrawlEngine::status`] or call [`CrawlEngine::cancel`] while another
/// runs the crawl on a background task.
#[derive(Clone)]
pub struct CrawlEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: Config,
    crawl_id: String,
    session: Mutex<CrawlSession>,
    visited: VisitedSet,
    /// Documents already stored, keyed without fragment
    ingested: VisitedSet,
    scores: ScoreCache,
    accountant: Mutex<ProvenanceAccountant>,
    stagnation: Mutex<StagnationTracker>,
    frontier: Mutex<Vec<String>>,
    fetcher: ResourceFetcher,
    resolver: SignpostingResolver,
    scorer: RelevanceScorer,
    gateway: GraphStoreGateway,
    ledger: Mutex<Option<Ledger>>,
    cancel: CancellationToken,
}

impl CrawlEngine {
    /// Creates an idle engine for the given seeds
    ///
    /// Seeds are normalized; seeds that fail normalization are dropped with
    /// a warning. At least one usable seed is required.
    pub fn new(
        config: Config,
        seeds: Vec<String>,
        store: Arc<dyn GraphStore>,
        config_hash: String,
    ) -> Result<Self> {
        let mut normalized: Vec<String> = Vec::with_capacity(seeds.len());
        for seed in &seeds {
            match normalize_url(seed) {
                Ok(url) if !normalized.contains(&url) => normalized.push(url),
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring seed {}: {}", seed, e),
            }
        }
        if normalized.is_empty() {
            return Err(HarvestError::MissingSeed);
        }

        let limits = SessionLimits::from(&config.crawler);
        let session = CrawlSession::new(normalized.clone(), limits, config_hash);
        let accountant =
            ProvenanceAccountant::new(session.id.clone(), normalized.clone(), session.started_at);

        Self::assemble(config, session, accountant, normalized, store)
    }

    /// Reloads a session from the ledger
    ///
    /// Visited URLs, provenance records and the saved frontier are restored.
    /// A session left running by an interrupted process is marked aborted so
    /// it can be continued.
    pub fn resume(
        config: Config,
        mut ledger: Ledger,
        session_id: &str,
        store: Arc<dyn GraphStore>,
    ) -> Result<Self> {
        let record = ledger.get_session(session_id)?;
        let mut session = record.into_session(SessionLimits::from(&config.crawler));

        if session.state == SessionState::Running {
            tracing::info!("Recovering interrupted session {}", session.id);
            session.error = Some("interrupted".to_string());
            session.transition(SessionState::Aborted)?;
            ledger.update_session(&session)?;
        }

        let mut accountant =
            ProvenanceAccountant::new(session.id.clone(), session.seeds.clone(), session.started_at);
        for record in ledger.load_provenance(session_id)? {
            accountant.record(record);
        }
        if let Some(finished_at) = session.finished_at {
            accountant.mark_finished(finished_at);
        }
        if let Some(error) = &session.error {
            accountant.mark_error(error.clone());
        }

        let visited = ledger.load_visited(session_id)?;
        let frontier = ledger.load_frontier(session_id)?;
        tracing::info!(
            "Resumed session {} at depth {} ({} visited, {} in frontier)",
            session.id,
            session.depth,
            visited.len(),
            frontier.len()
        );

        let ingested: Vec<String> = accountant
            .records()
            .iter()
            .map(|record| document_key(&record.resource).to_string())
            .collect();

        let engine = Self::assemble(config, session, accountant, frontier, store)?;
        engine.inner.visited.extend(visited);
        engine.inner.ingested.extend(ingested);
        *engine.inner.lock_ledger() = Some(ledger);
        Ok(engine)
    }

    fn assemble(
        config: Config,
        session: CrawlSession,
        accountant: ProvenanceAccountant,
        frontier: Vec<String>,
        store: Arc<dyn GraphStore>,
    ) -> Result<Self> {
        let client = build_http_client(&config.http)?;
        let fetcher = ResourceFetcher::new(client, &config.http);
        let gateway = GraphStoreGateway::from_config(store, &config.store);

        Ok(Self {
            inner: Arc::new(EngineInner {
                crawl_id: session.id.clone(),
                stagnation: Mutex::new(StagnationTracker::new(session.limits.stagnation_checks)),
                session: Mutex::new(session),
                visited: VisitedSet::new(),
                ingested: VisitedSet::new(),
                scores: ScoreCache::new(),
                accountant: Mutex::new(accountant),
                frontier: Mutex::new(frontier),
                resolver: SignpostingResolver::new(fetcher.clone()),
                scorer: RelevanceScorer::new(fetcher.clone()),
                fetcher,
                gateway,
                ledger: Mutex::new(None),
                cancel: CancellationToken::new(),
                config,
            }),
        })
    }

    /// Attaches a SQLite ledger and records the new session in it
    pub fn with_ledger(self, mut ledger: Ledger) -> Result<Self> {
        {
            let session = self.inner.lock_session().clone();
            ledger.create_session(&session)?;
            let frontier = self.inner.lock_frontier().clone();
            ledger.save_frontier(&session.id, &frontier)?;
        }
        *self.inner.lock_ledger() = Some(ledger);
        Ok(self)
    }

    pub fn session_id(&self) -> &str {
        &self.inner.crawl_id
    }

    pub fn status(&self) -> CrawlStatus {
        let session = self.inner.lock_session();
        let accountant = self.inner.lock_accountant();
        CrawlStatus {
            session_id: session.id.clone(),
            active: session.is_active(),
            progress: session.progress(),
            depth: session.depth,
            max_depth: session.limits.max_depth,
            resources_visited: self.inner.visited.len(),
            triples_collected: accountant.triples_collected(),
            state: session.state,
            stop_reason: session.stop_reason,
            error: session.error.clone(),
        }
    }

    /// Copy of the provenance ledger as it stands
    pub fn provenance(&self) -> ProvenanceAccountant {
        self.inner.lock_accountant().clone()
    }

    /// Session provenance as a PROV graph
    pub fn provenance_graph(&self) -> Graph {
        self.inner.provenance_graph()
    }

    /// URLs queued for the next round
    pub fn frontier(&self) -> Vec<String> {
        self.inner.lock_frontier().clone()
    }

    pub fn discovery_stats(&self) -> DiscoveryCounts {
        self.inner.resolver.stats()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.inner.visited.contains(url)
    }

    /// Stops the crawl at the next check and aborts in-flight workers
    pub fn cancel(&self) {
        tracing::info!("Cancelling crawl {}", self.inner.crawl_id);
        self.inner.cancel.cancel();
    }

    /// Runs the crawl on a background task
    pub fn spawn(&self) -> JoinHandle<Result<CrawlStatus>> {
        let engine = self.clone();
        tokio::spawn(async move { engine.run().await })
    }

    /// Runs the session from its seeds until a budget ends it
    ///
    /// A failed round does not surface as an error: the session is marked
    /// aborted, the error is recorded in provenance and the partial results
    /// stay queryable. Errors are returned only when the session cannot be
    /// started at all.
    pub async fn run(&self) -> Result<CrawlStatus> {
        self.inner.begin()?;
        tracing::info!("Starting crawl {}", self.inner.crawl_id);

        let outcome = self.depth_loop().await;
        self.inner.conclude(outcome).await;

        tracing::info!("Crawl {} finished", self.inner.crawl_id);
        Ok(self.status())
    }

    async fn depth_loop(&self) -> Result<StopReason> {
        loop {
            let frontier = self.inner.lock_frontier().clone();
            if frontier.is_empty() {
                tracing::info!("Stopping crawl: frontier is empty");
                return Ok(StopReason::EmptyFrontier);
            }
            if let Some(reason) = self.should_continue() {
                return Ok(reason);
            }

            let depth = self.inner.lock_session().depth;
            tracing::info!("Processing {} URLs at depth {}", frontier.len(), depth);

            let discovered = self.run_round(frontier, depth).await?;
            let selection = self.select_next(&discovered).await;
            tracing::info!(
                "Selected {} URLs for next level (depth {})",
                selection.len(),
                depth + 1
            );
            self.inner.advance(selection)?;

            if depth % 2 == 0 {
                self.inner.checkpoint(depth).await;
            }
        }
    }

    /// Checks every budget; `Some` names the first one exhausted
    ///
    /// Each call also feeds the stagnation tracker, so call it once per round.
    pub fn should_continue(&self) -> Option<StopReason> {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            tracing::info!("Stopping crawl: cancelled");
            return Some(StopReason::Cancelled);
        }

        let (depth, elapsed, limits) = {
            let session = inner.lock_session();
            (session.depth, session.elapsed(), session.limits.clone())
        };
        if depth >= limits.max_depth {
            tracing::info!("Stopping crawl: reached max depth {}", limits.max_depth);
            return Some(StopReason::DepthLimit);
        }
        if elapsed >= limits.timeout {
            tracing::info!("Stopping crawl: timeout after {:.1} seconds", elapsed.as_secs_f64());
            return Some(StopReason::Timeout);
        }

        let triples = inner.lock_accountant().triples_collected();
        if triples > limits.max_triples {
            tracing::info!(
                "Stopping crawl: collected sufficient triples (>{})",
                limits.max_triples
            );
            return Some(StopReason::TripleLimit);
        }

        let visited = inner.visited.len();
        if visited > limits.max_resources {
            tracing::info!(
                "Stopping crawl: visited maximum number of resources ({})",
                visited
            );
            return Some(StopReason::ResourceLimit);
        }

        let progressing = inner
            .stagnation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(triples);
        if !progressing {
            tracing::info!("Stopping crawl: no new triples collected in last few rounds");
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Processes one frontier and returns every link worth following
    async fn run_round(&self, frontier: Vec<String>, depth: u32) -> Result<Vec<String>> {
        let (parallel, workers) = {
            let session = self.inner.lock_session();
            (session.limits.parallel, session.limits.max_workers.max(1))
        };

        if !parallel || frontier.len() < 2 {
            let mut discovered = Vec::new();
            for url in frontier {
                if self.inner.cancel.is_cancelled() {
                    break;
                }
                discovered.extend(self.inner.crawl_resource(&url, depth).await);
            }
            return Ok(discovered);
        }

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        for url in frontier {
            let inner = Arc::clone(&self.inner);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Vec::new();
                };
                inner.crawl_resource(&url, depth).await
            });
        }

        let mut discovered = Vec::new();
        loop {
            tokio::select! {
                _ = self.inner.cancel.cancelled() => {
                    tracing::warn!("Aborting {} in-flight workers", tasks.len());
                    tasks.abort_all();
                    break;
                }
                next = tasks.join_next() => match next {
                    None => break,
                    Some(Ok(found)) => discovered.extend(found),
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => {
                        tasks.abort_all();
                        return Err(HarvestError::Round(format!("worker failed: {}", e)));
                    }
                },
            }
        }
        Ok(discovered)
    }

    /// Scores unvisited candidates and picks the next frontier
    pub async fn select_next(&self, candidates: &[String]) -> FrontierSelection {
        let inner = &self.inner;
        let mut scored: Vec<(String, f64)> = Vec::with_capacity(candidates.len());
        for url in candidates {
            if inner.visited.contains(url) || scored.iter().any(|(seen, _)| seen == url) {
                continue;
            }
            let score = match inner.scores.get(url) {
                Some(score) => score,
                None => {
                    let score = inner.scorer.score(url, None, &inner.visited).await;
                    inner.scores.insert_if_absent(url, score)
                }
            };
            scored.push((url.clone(), score));
        }

        let cap = inner.lock_session().limits.max_resources_per_level;
        let selection = select_frontier(&scored, cap);

        tracing::info!(
            "Selected {} URLs from {} domains",
            selection.len(),
            selection.per_domain.len()
        );
        for (domain, count) in &selection.per_domain {
            tracing::info!("  - {}: {} URLs", domain, count);
        }
        selection
    }

    /// Re-enters a finished session from a single resource
    ///
    /// The resource is crawled at the session's current depth, the best of
    /// what it links to is crawled one level deeper, and the session depth
    /// advances by one. Provenance is exported again afterwards.
    pub async fn continue_from(&self, resource: &str) -> Result<CrawlStatus> {
        let resource = normalize_url(resource)?;
        let depth = {
            let mut session = self.inner.lock_session();
            session.transition(SessionState::Running)?;
            session.error = None;
            session.stop_reason = None;
            session.depth
        };
        self.inner.lock_accountant().mark_resumed();
        self.inner.persist_session();
        tracing::info!(
            "Continuing crawl {} from {} at depth {}",
            self.inner.crawl_id,
            resource,
            depth
        );

        let outcome = self.continue_rounds(&resource, depth).await;
        self.inner.conclude(outcome).await;
        Ok(self.status())
    }

    async fn continue_rounds(&self, resource: &str, depth: u32) -> Result<StopReason> {
        let discovered = self.inner.crawl_resource(resource, depth).await;
        let selection = self.select_next(&discovered).await;
        self.inner.note_domains(&selection);

        let next_discovered = self.run_round(selection.urls, depth + 1).await?;
        let next = self.select_next(&next_discovered).await;
        self.inner.advance(next)?;

        if self.inner.cancel.is_cancelled() {
            Ok(StopReason::Cancelled)
        } else {
            Ok(StopReason::DepthLimit)
        }
    }
}

impl EngineInner {
    fn lock_session(&self) -> std::sync::MutexGuard<'_, CrawlSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_accountant(&self) -> std::sync::MutexGuard<'_, ProvenanceAccountant> {
        self.accountant.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_frontier(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.frontier.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_ledger(&self) -> std::sync::MutexGuard<'_, Option<Ledger>> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `op` against the ledger, if one is attached
    fn ledger_op<T>(
        &self,
        op: impl FnOnce(&mut (dyn Storage + Send)) -> StorageResult<T>,
    ) -> Option<StorageResult<T>> {
        self.lock_ledger().as_mut().map(|ledger| op(ledger.as_mut()))
    }

    fn persist_session(&self) {
        let session = self.lock_session().clone();
        if let Some(Err(e)) = self.ledger_op(|ledger| ledger.update_session(&session)) {
            tracing::warn!("Failed to persist session {}: {}", session.id, e);
        }
    }

    fn begin(&self) -> Result<()> {
        self.lock_session().transition(SessionState::Running)?;
        self.persist_session();
        Ok(())
    }

    /// Installs the next frontier and moves to the next depth
    fn advance(&self, selection: FrontierSelection) -> Result<()> {
        self.note_domains(&selection);
        let urls = selection.urls;
        if let Some(result) = self.ledger_op(|ledger| ledger.save_frontier(&self.crawl_id, &urls)) {
            result?;
        }
        *self.lock_frontier() = urls;
        self.lock_session().depth += 1;
        self.persist_session();
        Ok(())
    }

    fn note_domains(&self, selection: &FrontierSelection) {
        let mut accountant = self.lock_accountant();
        for domain in selection.per_domain.keys() {
            if !domain.is_empty() {
                accountant.note_domain(domain.clone());
            }
        }
    }

    /// Marks the session terminal and exports its provenance
    async fn conclude(&self, outcome: Result<StopReason>) {
        let (state, reason, error) = match outcome {
            Ok(StopReason::Cancelled) => (SessionState::Aborted, StopReason::Cancelled, None),
            Ok(reason) => (SessionState::Finished, reason, None),
            Err(e) => {
                tracing::error!("Error during crawl {}: {}", self.crawl_id, e);
                (SessionState::Aborted, StopReason::RoundFailed, Some(e.to_string()))
            }
        };

        {
            let mut session = self.lock_session();
            session.stop_reason = Some(reason);
            session.error = error.clone();
            if let Err(e) = session.transition(state) {
                tracing::warn!("Session {} not concluded: {}", session.id, e);
            }
        }
        {
            let mut accountant = self.lock_accountant();
            accountant.mark_finished(Utc::now());
            if let Some(error) = error {
                accountant.mark_error(error);
            }
        }
        self.persist_session();

        self.export_final().await;
    }

    fn provenance_graph(&self) -> Graph {
        let accountant = self.lock_accountant();
        export_provenance_graph(&accountant, &self.config.http.crawler_name)
    }

    /// Stores interim provenance; failures are logged only
    async fn checkpoint(&self, depth: u32) {
        let graph = self.provenance_graph();
        let name = interim_provenance_graph_name(&self.crawl_id);
        if self.gateway.store_graph(&name, &graph).await {
            tracing::info!("Saved interim provenance at depth {}", depth);
        } else {
            tracing::error!("Error saving interim provenance at depth {}", depth);
        }
    }

    async fn export_final(&self) {
        let graph = self.provenance_graph();
        let name = final_provenance_graph_name(&self.crawl_id);
        if !self.gateway.store_graph(&name, &graph).await {
            tracing::error!("Failed to store final provenance for {}", self.crawl_id);
        }

        let dir = Path::new(&self.config.output.export_dir);
        match write_provenance_file(dir, &self.crawl_id, &graph) {
            Ok(path) => tracing::info!("Saved provenance to file: {}", path.display()),
            Err(e) => tracing::error!("Error saving provenance to file: {}", e),
        }
    }

    /// Stores a resource's triples into `graph`, at most once per session
    ///
    /// Fragments name parts of one document, so `page` and `page#rdfa`
    /// count as the same resource.
    ///
    /// Returns false when the resource was already ingested or the store
    /// rejected the write.
    async fn ingest(&self, record: ProvenanceRecord, graph: &str, triples: &Graph) -> bool {
        let document = document_key(&record.resource).to_string();
        if !self.ingested.try_mark(&document) {
            tracing::debug!("Skipping already ingested resource: {}", record.resource);
            return false;
        }
        if !self.gateway.store_graph(graph, triples).await {
            self.ingested.unmark(&document);
            tracing::warn!("Failed to store RDF from {}", record.resource);
            return false;
        }
        self.record_ingestion(record).await;
        true
    }

    /// Records an ingestion that the store has accepted
    async fn record_ingestion(&self, record: ProvenanceRecord) {
        let resource_graph = resource_provenance_graph(&self.crawl_id, &record);

        if let Some(Err(e)) = self.ledger_op(|ledger| ledger.insert_provenance(&self.crawl_id, &record)) {
            tracing::warn!("Failed to persist provenance for {}: {}", record.resource, e);
        }
        self.lock_accountant().record(record);

        let name = provenance_graph_name(&self.crawl_id);
        if !self.gateway.store_graph(&name, &resource_graph).await {
            tracing::warn!("Failed to store resource provenance in {}", name);
        }
    }

    /// Processes a single URL and returns the links to consider next
    ///
    /// Failures are isolated: a URL that cannot be fetched, parsed or stored
    /// simply contributes fewer links.
    async fn crawl_resource(&self, url: &str, depth: u32) -> Vec<String> {
        let url = match normalize_url(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping malformed URL {}: {}", url, e);
                return Vec::new();
            }
        };
        if !self.visited.try_mark(&url) {
            tracing::debug!("Skipping already visited URL: {}", url);
            return Vec::new();
        }
        tracing::info!("Crawling resource at depth {}: {}", depth, url);
        if let Some(Err(e)) = self.ledger_op(|ledger| ledger.record_visit(&self.crawl_id, &url, depth)) {
            tracing::warn!("Failed to persist visit of {}: {}", url, e);
        }

        let threshold = self.config.crawler.relevance_threshold;

        let direct = self.fetcher.fetch_and_parse(&url).await;
        if direct.has_triples() {
            tracing::info!(
                "Found {} triples directly at {} using format {}",
                direct.triple_count(),
                url,
                direct.format.map_or("unknown", |f| f.as_str())
            );
            let relevance = self.scorer.score_resource(&url, Some(&direct.triples)).await;
            if relevance >= threshold {
                let record = ProvenanceRecord::new(
                    url.clone(),
                    SourceKind::DirectRdf,
                    direct.triple_count(),
                    depth,
                )
                .with_format(direct.format.map(|f| f.as_str()))
                .with_content_type(direct.content_type.clone())
                .with_graph(url.clone());
                if self.ingest(record, &url, &direct.triples).await {
                    tracing::info!("Stored direct RDF from {} into {}", url, url);
                }
            }
        } else if let Some(error) = direct.error() {
            tracing::debug!("No direct RDF at {}: {}", url, error);
        }

        let links = self.resolver.discover_links(&url).await;
        tracing::info!("Found {} links at {}", links.len(), url);

        let repository_boost = classify_url(&url).score_bonus();
        let mut discovered = Vec::new();

        for (relation, target) in links.iter() {
            let target = match resolve_reference(target, &url) {
                Ok(target) => target,
                Err(e) => {
                    tracing::debug!("Error resolving {} from {}: {}", target, url, e);
                    continue;
                }
            };
            if self.visited.contains(&target) {
                tracing::debug!("Skipping already visited linked URL: {}", target);
                continue;
            }

            let priority = is_priority_relation(relation);
            let parsed = self.fetcher.fetch_and_parse(&target).await;

            if !parsed.has_triples() {
                tracing::warn!(
                    "No triples found at linked resource {}. Error: {}",
                    target,
                    parsed.error().unwrap_or("none")
                );
                if priority {
                    tracing::info!("Following {} relation to {} despite no RDF found", relation, target);
                    discovered.push(target);
                }
                continue;
            }

            // Boosts belong to this link, so the score is never shared
            // with other sources of the same target
            let mut relevance = self
                .scorer
                .score(&target, Some(&parsed.triples), &self.visited)
                .await;
            if priority {
                relevance += 0.1;
            }
            relevance = (relevance + repository_boost).min(1.0);

            if relevance >= threshold {
                let graph = harvest_graph_name(&self.crawl_id, Utc::now());
                let record = ProvenanceRecord::new(
                    target.clone(),
                    links.source_kind(relation),
                    parsed.triple_count(),
                    depth,
                )
                .with_format(parsed.format.map(|f| f.as_str()))
                .with_content_type(parsed.content_type.clone())
                .with_graph(graph.clone());
                if self.ingest(record, &graph, &parsed.triples).await {
                    discovered.push(target.clone());
                }
            }

            tracing::info!(
                "Processed RDF from {}: {} triples, relevance {:.2}",
                target,
                parsed.triple_count(),
                relevance
            );
        }

        discovered
    }
}

/// The fetchable document a resource URL names
fn document_key(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}
