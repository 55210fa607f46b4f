//! Statistics generation from the session ledger
//!
//! This module provides functionality for extracting and displaying
//! per-session harvest statistics from the storage layer.

use crate::provenance::ProvenanceAccountant;
use crate::storage::{SessionRecord, Storage};
use crate::HarvestError;
use std::collections::{BTreeMap, BTreeSet};

/// Harvest statistics for one session
#[derive(Debug, Clone)]
pub struct SessionStatistics {
    /// The session as recorded in the ledger
    pub session: SessionRecord,

    /// Number of URLs processed
    pub resources_visited: u64,

    /// Number of resources whose triples were ingested
    pub resources_ingested: usize,

    /// Total triples ingested
    pub triples_collected: u64,

    /// Ingestion counts per source kind (`direct_rdf`, `signposting:{rel}`, ...)
    pub resources_by_source: Vec<(String, u64)>,

    /// Ingestion counts per parse format
    pub resources_by_format: Vec<(String, u64)>,

    /// Ingestion counts per base MIME type
    pub mime_types: BTreeMap<String, usize>,

    /// Ingestion counts per followed relation
    pub relation_types: BTreeMap<String, usize>,

    /// Domains ingested from
    pub domains: BTreeSet<String>,
}

/// Loads statistics for `session_id`, or for the latest session when `None`
///
/// # Returns
///
/// * `Ok(SessionStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Session missing or ledger query failed
pub fn load_statistics(
    storage: &dyn Storage,
    session_id: Option<&str>,
) -> Result<SessionStatistics, HarvestError> {
    let session = match session_id {
        Some(id) => storage.get_session(id)?,
        None => storage
            .get_latest_session()?
            .ok_or_else(|| HarvestError::SessionNotFound("no sessions in ledger".to_string()))?,
    };

    // Replay records to derive the per-type breakdowns
    let mut accountant =
        ProvenanceAccountant::new(session.id.clone(), session.seeds.clone(), session.started_at);
    for record in storage.load_provenance(&session.id)? {
        accountant.record(record);
    }

    Ok(SessionStatistics {
        resources_visited: storage.count_visited(&session.id)?,
        resources_ingested: accountant.resources_visited(),
        triples_collected: storage.count_triples(&session.id)?,
        resources_by_source: storage.count_by_source(&session.id)?,
        resources_by_format: storage.count_by_format(&session.id)?,
        mime_types: accountant.mime_types().clone(),
        relation_types: accountant.relation_types().clone(),
        domains: accountant.domains_visited().clone(),
        session,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &SessionStatistics) {
    let session = &stats.session;
    println!("=== Harvest Statistics: {} ===\n", session.id);

    println!("Session:");
    println!("  State: {}", session.state);
    println!("  Depth reached: {}", session.depth);
    println!("  Started: {}", session.started_at.to_rfc3339());
    if let Some(finished_at) = session.finished_at {
        let duration = finished_at - session.started_at;
        println!(
            "  Finished: {} ({}s)",
            finished_at.to_rfc3339(),
            duration.num_seconds()
        );
    }
    if let Some(reason) = &session.stop_reason {
        println!("  Stop reason: {}", reason);
    }
    if let Some(error) = &session.error {
        println!("  Error: {}", error);
    }
    println!("  Seeds:");
    for seed in &session.seeds {
        println!("    - {}", seed);
    }
    println!();

    println!("Overview:");
    println!("  Resources visited: {}", stats.resources_visited);
    println!("  Resources ingested: {}", stats.resources_ingested);
    println!("  Triples collected: {}", stats.triples_collected);
    println!("  Domains: {}", stats.domains.len());
    println!();

    if !stats.resources_by_source.is_empty() {
        println!("Resources by Source:");
        for (source, count) in &stats.resources_by_source {
            let percentage = if stats.resources_ingested > 0 {
                (*count as f64 / stats.resources_ingested as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", source, count, percentage);
        }
        println!();
    }

    if !stats.resources_by_format.is_empty() {
        println!("Formats:");
        for (format, count) in &stats.resources_by_format {
            println!("  {}: {}", format, count);
        }
        println!();
    }

    if !stats.mime_types.is_empty() {
        println!("MIME Types:");
        let mut counts: Vec<_> = stats.mime_types.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (mime, count) in counts {
            println!("  {}: {}", mime, count);
        }
        println!();
    }

    if !stats.relation_types.is_empty() {
        println!("Relations Followed:");
        let mut counts: Vec<_> = stats.relation_types.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (relation, count) in counts {
            println!("  {}: {}", relation, count);
        }
        println!();
    }

    if !stats.domains.is_empty() {
        println!("Domains ({}):", stats.domains.len());
        for domain in &stats.domains {
            println!("  - {}", domain);
        }
    }
}
