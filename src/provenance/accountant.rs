use super::record::{ProvenanceRecord, SourceKind};
use crate::rdf::base_media_type;
use crate::url::domain_of;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Append-only ledger of what a session ingested
///
/// Running totals are updated by `record` only, so the cumulative triple
/// count always equals the sum over the recorded resources.
#[derive(Debug, Clone)]
pub struct ProvenanceAccountant {
    crawl_id: String,
    seeds: Vec<String>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    records: Vec<ProvenanceRecord>,
    resources_visited: usize,
    triples_collected: usize,
    domains_visited: BTreeSet<String>,
    mime_types: BTreeMap<String, usize>,
    relation_types: BTreeMap<String, usize>,
    formats: BTreeMap<String, usize>,
    error: Option<String>,
}

impl ProvenanceAccountant {
    pub fn new(crawl_id: impl Into<String>, seeds: Vec<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            crawl_id: crawl_id.into(),
            seeds,
            started_at,
            finished_at: None,
            records: Vec::new(),
            resources_visited: 0,
            triples_collected: 0,
            domains_visited: BTreeSet::new(),
            mime_types: BTreeMap::new(),
            relation_types: BTreeMap::new(),
            formats: BTreeMap::new(),
            error: None,
        }
    }

    /// Appends a record and updates totals and statistics
    pub fn record(&mut self, record: ProvenanceRecord) -> &ProvenanceRecord {
        if let Some(content_type) = &record.content_type {
            let base = base_media_type(content_type);
            if !base.is_empty() {
                *self.mime_types.entry(base).or_insert(0) += 1;
            }
        }
        // Only signposted relations count; fallback labels are synthetic
        if let SourceKind::Signposting(rel) = &record.source {
            *self.relation_types.entry(rel.clone()).or_insert(0) += 1;
        }
        if let Some(format) = &record.format {
            *self.formats.entry(format.clone()).or_insert(0) += 1;
        }
        if let Some(domain) = domain_of(&record.resource) {
            self.domains_visited.insert(domain);
        }

        self.resources_visited += 1;
        self.triples_collected += record.triple_count;

        debug!(
            "Recorded {} ({} triples, {})",
            record.resource, record.triple_count, record.source
        );

        let index = self.records.len();
        self.records.push(record);
        &self.records[index]
    }

    /// Adds a domain selected for crawling
    pub fn note_domain(&mut self, domain: impl Into<String>) {
        self.domains_visited.insert(domain.into());
    }

    pub fn mark_finished(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
    }

    /// Reopens the ledger for a continued crawl
    pub fn mark_resumed(&mut self) {
        self.finished_at = None;
    }

    pub fn mark_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn crawl_id(&self) -> &str {
        &self.crawl_id
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn records(&self) -> &[ProvenanceRecord] {
        &self.records
    }

    pub fn resources_visited(&self) -> usize {
        self.resources_visited
    }

    pub fn triples_collected(&self) -> usize {
        self.triples_collected
    }

    pub fn domains_visited(&self) -> &BTreeSet<String> {
        &self.domains_visited
    }

    pub fn mime_types(&self) -> &BTreeMap<String, usize> {
        &self.mime_types
    }

    pub fn relation_types(&self) -> &BTreeMap<String, usize> {
        &self.relation_types
    }

    pub fn formats(&self) -> &BTreeMap<String, usize> {
        &self.formats
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
