//! Signpost-Harvest main entry point
//!
//! This is the command-line interface for the FAIR signposting harvester.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use signpost_harvest::config::{load_or_default, validate, Config};
use signpost_harvest::crawler::{
    assess_fair, check_seed, discovery_tools, CrawlEngine, CrawlStatus,
};
use signpost_harvest::output::{
    graph_file_name, load_statistics, print_statistics, write_graph_export, write_provenance_file,
};
use signpost_harvest::provenance::{export_provenance_graph, provenance_to_turtle, ProvenanceAccountant};
use signpost_harvest::rdf::{to_turtle, RdfSerialization};
use signpost_harvest::storage::{
    open_storage, GraphStore, MemoryGraphStore, QueryOutcome, SparqlGraphStore, Storage,
};
use signpost_harvest::url::split_seeds;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Signpost-Harvest: a FAIR signposting linked-data harvester
///
/// Follows typed links from landing pages to their machine-readable
/// descriptions, ingests relevant RDF into a SPARQL graph store and records
/// the provenance of everything it ingests.
#[derive(Parser, Debug)]
#[command(name = "signpost-harvest")]
#[command(version)]
#[command(about = "A FAIR signposting linked-data harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new crawl from one or more seed URLs
    Crawl(CrawlArgs),

    /// Continue a finished session from a single resource
    Continue {
        /// Session id
        session: String,

        /// Resource to crawl from
        resource: String,

        /// Keep harvested triples in memory instead of the graph store
        #[arg(long)]
        dry_store: bool,
    },

    /// Show the state of a session (latest when omitted)
    Status { session: Option<String> },

    /// Show harvest statistics of a session (latest when omitted)
    Stats { session: Option<String> },

    /// Export a session's provenance as Turtle
    ExportProvenance {
        /// Session id
        session: String,

        /// Output file (defaults to the configured export directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check whether a URL looks like a promising seed
    CheckSeed { url: String },

    /// Run a read-only SPARQL query against the graph store
    Query {
        /// SELECT, ASK, CONSTRUCT or DESCRIBE query
        query: String,
    },

    /// Show the statements linking to and from a resource
    Explore {
        resource: String,

        /// Also show how the resource was ingested in this session
        #[arg(long)]
        session: Option<String>,

        /// Maximum statements shown per direction
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Export one named graph from the graph store
    ExportGraph {
        /// Named graph IRI
        graph: String,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export the whole knowledge graph (or one named graph of it)
    ExportKnowledgeGraph {
        /// Restrict the export to this named graph
        #[arg(long)]
        graph: Option<String>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Score a resource against the FAIR principles
    FairAssessment {
        url: String,

        /// Do not consult the graph store
        #[arg(long)]
        no_store: bool,
    },

    /// Check that the graph store is reachable
    CheckStore,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// turtle, rdf/xml, json-ld, n3, nt, nquads or trig
    #[arg(long, default_value = "turtle")]
    format: String,

    /// Output file (defaults to the configured export directory)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Seed URL, or a comma/newline-separated list of seed URLs
    seeds: String,

    /// Number of depth levels to traverse
    #[arg(long)]
    max_depth: Option<u32>,

    /// Frontier size cap per depth level
    #[arg(long)]
    per_level: Option<usize>,

    /// Stop after visiting more than this many URLs
    #[arg(long)]
    max_resources: Option<usize>,

    /// Stop after ingesting more than this many triples
    #[arg(long)]
    max_triples: Option<usize>,

    /// Minimum relevance score for ingestion
    #[arg(long)]
    threshold: Option<f64>,

    /// Session time budget in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Process each round on a worker pool
    #[arg(long)]
    parallel: bool,

    /// Worker pool size
    #[arg(long)]
    workers: Option<usize>,

    /// Keep harvested triples in memory instead of the graph store
    #[arg(long)]
    dry_store: bool,
}

impl CrawlArgs {
    fn apply(&self, config: &mut Config) {
        let crawler = &mut config.crawler;
        if let Some(max_depth) = self.max_depth {
            crawler.max_depth = max_depth;
        }
        if let Some(per_level) = self.per_level {
            crawler.max_resources_per_level = per_level;
        }
        if let Some(max_resources) = self.max_resources {
            crawler.max_resources = max_resources;
        }
        if let Some(max_triples) = self.max_triples {
            crawler.max_triples = max_triples;
        }
        if let Some(threshold) = self.threshold {
            crawler.relevance_threshold = threshold;
        }
        if let Some(timeout) = self.timeout {
            crawler.timeout_secs = timeout;
        }
        if self.parallel {
            crawler.parallel = true;
        }
        if let Some(workers) = self.workers {
            crawler.max_workers = workers;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(path) = &cli.config {
        tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            config_hash
        );
    }

    match cli.command {
        Command::Crawl(args) => {
            args.apply(&mut config);
            validate(&config).context("invalid crawl limits")?;
            handle_crawl(config, config_hash, &args).await
        }
        Command::Continue {
            session,
            resource,
            dry_store,
        } => handle_continue(config, &session, &resource, dry_store).await,
        Command::Status { session } => handle_status(&config, session.as_deref()),
        Command::Stats { session } => handle_stats(&config, session.as_deref()),
        Command::ExportProvenance { session, out } => {
            handle_export_provenance(&config, &session, out.as_deref())
        }
        Command::CheckSeed { url } => handle_check_seed(&config, &url).await,
        Command::Query { query } => handle_query(&config, &query).await,
        Command::Explore {
            resource,
            session,
            limit,
        } => handle_explore(&config, &resource, session.as_deref(), limit).await,
        Command::ExportGraph { graph, export } => {
            handle_export(&config, Some(graph.as_str()), &export).await
        }
        Command::ExportKnowledgeGraph { graph, export } => {
            handle_export(&config, graph.as_deref(), &export).await
        }
        Command::FairAssessment { url, no_store } => {
            handle_fair_assessment(&config, &url, no_store).await
        }
        Command::CheckStore => handle_check_store(&config).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("signpost_harvest=info,warn"),
            1 => EnvFilter::new("signpost_harvest=debug,info"),
            2 => EnvFilter::new("signpost_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn graph_store(config: &Config, dry_store: bool) -> anyhow::Result<Arc<dyn GraphStore>> {
    if dry_store {
        tracing::info!("Using in-memory graph store; harvested triples are not persisted");
        return Ok(Arc::new(MemoryGraphStore::new()));
    }
    let store = SparqlGraphStore::from_config(&config.store)
        .context("failed to build graph store client")?;
    tracing::info!("Using graph store at {}", config.store.query_url());
    Ok(Arc::new(store))
}

fn open_ledger(config: &Config) -> anyhow::Result<Box<dyn Storage + Send>> {
    let path = Path::new(&config.output.database_path);
    let storage = open_storage(path)
        .with_context(|| format!("failed to open ledger {}", path.display()))?;
    Ok(Box::new(storage))
}

/// Runs the engine in the background, cancelling it on Ctrl-C
async fn drive(engine: CrawlEngine, run: tokio::task::JoinHandle<signpost_harvest::Result<CrawlStatus>>) -> anyhow::Result<CrawlStatus> {
    let mut run = run;
    tokio::select! {
        result = &mut run => Ok(result.context("crawl task failed")??),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, stopping crawl");
            engine.cancel();
            Ok(run.await.context("crawl task failed")??)
        }
    }
}

fn print_status(status: &CrawlStatus) {
    println!("Session: {}", status.session_id);
    println!("  State: {}", status.state);
    println!("  Active: {}", status.active);
    println!("  Progress: {}%", status.progress);
    println!("  Depth: {} of {}", status.depth, status.max_depth);
    println!("  Resources visited: {}", status.resources_visited);
    println!("  Triples collected: {}", status.triples_collected);
    if let Some(reason) = status.stop_reason {
        println!("  Stop reason: {}", reason);
    }
    if let Some(error) = &status.error {
        println!("  Error: {}", error);
    }
}

/// Handles the crawl command
async fn handle_crawl(config: Config, config_hash: String, args: &CrawlArgs) -> anyhow::Result<()> {
    let seeds = split_seeds(&args.seeds);
    tracing::info!("Total seed URLs: {}", seeds.len());

    let store = graph_store(&config, args.dry_store)?;
    let ledger = open_ledger(&config)?;
    let engine = CrawlEngine::new(config, seeds, store, config_hash)?.with_ledger(ledger)?;
    tracing::info!("Created session {}", engine.session_id());

    let status = drive(engine.clone(), engine.spawn()).await?;
    print_status(&status);
    Ok(())
}

/// Handles the continue command
async fn handle_continue(
    config: Config,
    session_id: &str,
    resource: &str,
    dry_store: bool,
) -> anyhow::Result<()> {
    let store = graph_store(&config, dry_store)?;
    let ledger = open_ledger(&config)?;
    let engine = CrawlEngine::resume(config, ledger, session_id, store)?;

    let worker = engine.clone();
    let resource = resource.to_string();
    let run = tokio::spawn(async move { worker.continue_from(&resource).await });
    let status = drive(engine, run).await?;
    print_status(&status);
    Ok(())
}

/// Handles the status command
fn handle_status(config: &Config, session_id: Option<&str>) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let record = match session_id {
        Some(id) => ledger.get_session(id)?,
        None => match ledger.get_latest_session()? {
            Some(record) => record,
            None => {
                println!("No sessions recorded in {}", config.output.database_path);
                return Ok(());
            }
        },
    };

    let visited = ledger.count_visited(&record.id)?;
    let triples = ledger.count_triples(&record.id)?;
    let stop_reason = record.stop_reason.clone();
    let session = record.into_session((&config.crawler).into());

    println!("Session: {}", session.id);
    println!("  State: {}", session.state);
    println!("  Progress: {}%", session.progress());
    println!("  Depth: {} of {}", session.depth, session.limits.max_depth);
    println!("  Resources visited: {}", visited);
    println!("  Triples collected: {}", triples);
    if let Some(reason) = stop_reason {
        println!("  Stop reason: {}", reason);
    }
    if let Some(error) = &session.error {
        println!("  Error: {}", error);
    }
    Ok(())
}

/// Handles the stats command
fn handle_stats(config: &Config, session_id: Option<&str>) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);
    let ledger = open_ledger(config)?;
    let stats = load_statistics(ledger.as_ref(), session_id)?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the export-provenance command
fn handle_export_provenance(
    config: &Config,
    session_id: &str,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let record = ledger.get_session(session_id)?;

    let mut accountant =
        ProvenanceAccountant::new(record.id.clone(), record.seeds.clone(), record.started_at);
    for provenance in ledger.load_provenance(&record.id)? {
        accountant.record(provenance);
    }
    if let Some(finished_at) = record.finished_at {
        accountant.mark_finished(finished_at);
    }
    if let Some(error) = &record.error {
        accountant.mark_error(error.clone());
    }
    let graph = export_provenance_graph(&accountant, &config.http.crawler_name);

    let path = match out {
        Some(path) => {
            std::fs::write(path, provenance_to_turtle(&graph)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            path.to_path_buf()
        }
        None => write_provenance_file(Path::new(&config.output.export_dir), &record.id, &graph)?,
    };

    println!(
        "✓ Exported provenance of {} ({} resources, {} triples) to {}",
        record.id,
        accountant.resources_visited(),
        accountant.triples_collected(),
        path.display()
    );
    Ok(())
}

/// Handles the check-seed command
async fn handle_check_seed(config: &Config, url: &str) -> anyhow::Result<()> {
    let Some(url) = split_seeds(url).into_iter().next() else {
        bail!("no URL provided");
    };
    let url = signpost_harvest::normalize_url(&url)?;
    let (fetcher, resolver) = discovery_tools(&config.http)?;
    let report = check_seed(&fetcher, &resolver, &url).await;

    println!("Seed: {}", report.url);
    println!("  Score: {:.2}", report.score);
    println!("  Recommendation: {}", report.recommendation);
    println!(
        "  RDF found: {}{}",
        report.rdf_found,
        report
            .format
            .as_deref()
            .map(|f| format!(" ({} triples, {})", report.triple_count, f))
            .unwrap_or_default()
    );
    if let Some(content_type) = &report.content_type {
        println!("  Content-Type: {}", content_type);
    }
    println!("  Signposting found: {}", report.signposting_found);
    for relation in &report.relations {
        println!("    - {}", relation);
    }
    println!("  Known repository: {}", report.known_repository);
    Ok(())
}

fn sparql_store(config: &Config) -> anyhow::Result<SparqlGraphStore> {
    SparqlGraphStore::from_config(&config.store).context("failed to build graph store client")
}

/// Handles the query command
async fn handle_query(config: &Config, query: &str) -> anyhow::Result<()> {
    let store = sparql_store(config)?;
    let outcome = store
        .run_query(query)
        .await
        .with_context(|| format!("query failed against {}", config.store.query_url()))?;

    match outcome {
        QueryOutcome::Boolean(answer) => println!("{}", answer),
        QueryOutcome::Solutions { variables, rows } => {
            println!("{}", variables.join("\t"));
            for row in &rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| cell.as_ref().map(|t| t.to_string()).unwrap_or_default())
                    .collect();
                println!("{}", cells.join("\t"));
            }
            println!("\n{} solutions", rows.len());
        }
        QueryOutcome::Graph(graph) => print!("{}", to_turtle(&graph, &[])?),
    }
    Ok(())
}

/// Handles the explore command
async fn handle_explore(
    config: &Config,
    resource: &str,
    session_id: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let resource = signpost_harvest::normalize_url(resource)?;
    let store = sparql_store(config)?;
    let description = store.describe(&resource, limit).await?;

    println!("Resource: {}", resource);
    if let Some(session_id) = session_id {
        let ledger = open_ledger(config)?;
        let ingested = ledger
            .load_provenance(session_id)?
            .into_iter()
            .find(|record| record.resource == resource);
        match ingested {
            Some(record) => println!(
                "  Ingested via {} at depth {} ({} triples{})",
                record.source,
                record.depth,
                record.triple_count,
                record
                    .graph
                    .as_deref()
                    .map(|g| format!(", graph {}", g))
                    .unwrap_or_default()
            ),
            None => println!("  Not ingested in session {}", session_id),
        }
    }

    if description.is_empty() {
        println!("  No statements in the graph store");
        return Ok(());
    }
    println!("  Outbound ({}):", description.outbound.len());
    for triple in &description.outbound {
        println!("    {} {}", triple.predicate, triple.object);
    }
    println!("  Inbound ({}):", description.inbound.len());
    for triple in &description.inbound {
        println!("    {} {}", triple.subject, triple.predicate);
    }
    Ok(())
}

/// Handles the export-graph and export-knowledge-graph commands
async fn handle_export(
    config: &Config,
    graph: Option<&str>,
    args: &ExportArgs,
) -> anyhow::Result<()> {
    let Some(format) = RdfSerialization::from_name(&args.format) else {
        bail!("unknown export format '{}'", args.format);
    };
    let store = sparql_store(config)?;
    let quads = store
        .quads(graph)
        .await
        .with_context(|| format!("failed to read {}", graph.unwrap_or("the knowledge graph")))?;

    let path = match &args.out {
        Some(path) => path.clone(),
        None => Path::new(&config.output.export_dir).join(graph_file_name(graph, format)),
    };
    write_graph_export(&path, &quads, format)?;

    println!(
        "✓ Exported {} statements as {} to {}",
        quads.len(),
        format.media_type(),
        path.display()
    );
    if !format.supports_datasets() && graph.is_none() {
        println!("  Named graphs were merged; use nquads or trig to keep them");
    }
    Ok(())
}

/// Handles the fair-assessment command
async fn handle_fair_assessment(config: &Config, url: &str, no_store: bool) -> anyhow::Result<()> {
    let url = signpost_harvest::normalize_url(url)?;
    let (fetcher, _) = discovery_tools(&config.http)?;
    let store = if no_store { None } else { Some(sparql_store(config)?) };
    let assessment = assess_fair(
        &fetcher,
        store.as_ref().map(|s| s as &dyn GraphStore),
        &url,
    )
    .await;

    println!("FAIR assessment: {}", assessment.url);
    println!("  Assessed at: {}", assessment.assessed_at.to_rfc3339());
    println!(
        "  Description: {} ({} triples)",
        assessment.source, assessment.triple_count
    );
    for (label, category) in assessment.categories() {
        println!("  {}: {}/{}", label, category.score, category.max);
        for detail in &category.details {
            println!("    - {}", detail);
        }
    }
    println!(
        "  Overall: {}/{} ({}%)",
        assessment.total(),
        assessment.max(),
        assessment.percentage()
    );
    Ok(())
}

/// Handles the check-store command
async fn handle_check_store(config: &Config) -> anyhow::Result<()> {
    let store = sparql_store(config)?;
    if let Err(e) = store.ping().await {
        println!("✗ Graph store at {} is not reachable: {}", config.store.endpoint, e);
        bail!("graph store unavailable");
    }

    println!("✓ Graph store at {} is reachable", config.store.endpoint);
    match (store.count_triples().await, store.list_graphs().await) {
        (Ok(triples), Ok(graphs)) => {
            println!("  Dataset: {}", config.store.dataset);
            println!("  Named graphs: {}", graphs.len());
            println!("  Triples: {}", triples);
        }
        (Err(e), _) | (_, Err(e)) => {
            println!("  Dataset {} could not be queried: {}", config.store.dataset, e);
        }
    }
    Ok(())
}
