//! Relevance scoring for candidate resources
//!
//! Scores are directional (higher means more worth ingesting) and always
//! fall in `[0, 1]`. They combine cheap URL signals, an optional HEAD probe
//! and, when the resource was already parsed, properties of its triples.

use super::fetcher::ResourceFetcher;
use crate::rdf::vocab;
use crate::state::VisitedSet;
use oxrdf::{Graph, TermRef};
use std::collections::BTreeSet;
use tracing::{debug, error};
use url::Url;

const BASE_SCORE: f64 = 0.3;

/// Returned when a URL cannot be analysed at all
pub const FALLBACK_SCORE: f64 = 0.4;

/// Path fragments suggesting linked data behind a URL
const PATH_KEYWORDS: &[&str] = &[
    "data", "metadata", "rdf", "resource", "catalog", "dataset", "fair", "sparql", "ontology",
    "vocab", "linked", "lod", "semantic", "graph", "json-ld", "jsonld", "turtle", "n3", "void",
    "concept", "term", "knowledge",
];

/// File extensions of RDF serializations
const RDF_EXTENSIONS: &[&str] = &[
    ".rdf", ".ttl", ".n3", ".jsonld", ".nt", ".nq", ".trig", ".trix",
];

/// Content-type fragments treated as RDF-typical by the probe bonus
const RDF_CONTENT_HINTS: &[&str] = &[
    "rdf", "turtle", "n3", "json-ld", "xml", "n-triples", "n-quads", "trig", "trix",
];

/// Vocabularies whose presence marks well-described data, keyed by label
const VOCABULARIES: &[(&str, &[&str])] = &[
    ("schema", &[vocab::SCHEMA, vocab::SCHEMA_HTTPS]),
    ("dcat", &[vocab::DCAT]),
    ("dcterms", &[vocab::DCTERMS]),
    ("dc", &[vocab::DC]),
    ("skos", &[vocab::SKOS]),
    ("foaf", &[vocab::FOAF]),
    ("prov", &[vocab::PROV]),
    ("void", &[vocab::VOID]),
    ("owl", &[vocab::OWL]),
    ("oa", &[vocab::OA]),
];

/// Classes and properties that make a resource useful to a catalogue
const USEFUL_TERMS: &[(&str, &str)] = &[
    (vocab::DCAT, "Dataset"),
    (vocab::SCHEMA, "Dataset"),
    (vocab::VOID, "Dataset"),
    (vocab::SCHEMA, "Person"),
    (vocab::FOAF, "Person"),
    (vocab::SCHEMA, "Organization"),
    (vocab::FOAF, "Organization"),
    (vocab::SCHEMA, "ScholarlyArticle"),
    (vocab::SCHEMA, "CreativeWork"),
    (vocab::DC, "title"),
    (vocab::SCHEMA, "name"),
    (vocab::SCHEMA, "description"),
    (vocab::DC, "description"),
    (vocab::DC, "creator"),
    (vocab::SCHEMA, "creator"),
    (vocab::SCHEMA, "author"),
];

fn is_rdf_hint(content_type: &str) -> bool {
    let content_type = content_type.to_lowercase();
    RDF_CONTENT_HINTS
        .iter()
        .any(|hint| content_type.contains(hint))
}

fn is_useful_term(iri: &str) -> bool {
    USEFUL_TERMS.iter().any(|(namespace, local)| {
        iri.strip_prefix(namespace)
            .map_or(false, |rest| rest == *local)
    })
}

/// Distinct well-known vocabularies used by the graph's predicates
fn vocabularies_used(triples: &Graph) -> BTreeSet<&'static str> {
    let mut found = BTreeSet::new();
    for triple in triples.iter() {
        let predicate = triple.predicate.as_str();
        for (label, namespaces) in VOCABULARIES {
            if namespaces.iter().any(|ns| predicate.starts_with(ns)) {
                found.insert(*label);
            }
        }
    }
    found
}

/// Number of triples whose predicate or object is a useful term, capped at `limit`
fn useful_triples(triples: &Graph, limit: usize) -> usize {
    triples
        .iter()
        .filter(|triple| {
            is_useful_term(triple.predicate.as_str())
                || matches!(triple.object, TermRef::NamedNode(node) if is_useful_term(node.as_str()))
        })
        .take(limit)
        .count()
}

fn triple_size_bonus(count: usize) -> f64 {
    if count > 100 {
        0.2
    } else if count > 50 {
        0.1
    } else if count > 10 {
        0.05
    } else {
        0.0
    }
}

fn vocabulary_bonus(distinct: usize) -> f64 {
    if distinct >= 3 {
        0.3
    } else {
        0.1 * distinct as f64
    }
}

/// Scores `url` from URL signals and optional triples
///
/// `probe_rdf` is the outcome of the content-type probe, taken separately
/// so the scoring itself stays free of I/O. Unparsable URLs get
/// [`FALLBACK_SCORE`].
///
/// # Example
///
/// ```
/// use signpost_harvest::crawler::assess;
///
/// let plain = assess("http://example.org/about-us", false, None);
/// let typed = assess("http://example.org/catalog/dataset.ttl", false, None);
/// assert!(typed > plain);
/// assert!((0.0..=1.0).contains(&typed));
/// ```
pub fn assess(url: &str, probe_rdf: bool, triples: Option<&Graph>) -> f64 {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Error calculating relevance for {}: {}", url, e);
            return FALLBACK_SCORE;
        }
    };

    let mut score = BASE_SCORE;
    if probe_rdf {
        score += 0.2;
    }

    let path = parsed.path().to_lowercase();
    if PATH_KEYWORDS.iter().any(|keyword| path.contains(keyword)) {
        score += 0.1;
    }
    if RDF_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        score += 0.3;
    }

    if let Some(triples) = triples {
        score += triple_size_bonus(triples.len());
        score += vocabulary_bonus(vocabularies_used(triples).len());
        if useful_triples(triples, 3) >= 3 {
            score += 0.2;
        }
    }

    score.clamp(0.0, 1.0)
}

/// Ranks candidate resources by expected usefulness
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    fetcher: ResourceFetcher,
}

impl RelevanceScorer {
    pub fn new(fetcher: ResourceFetcher) -> Self {
        Self { fetcher }
    }

    /// Scores a candidate, returning exactly 0.0 for visited URLs
    pub async fn score(&self, url: &str, triples: Option<&Graph>, visited: &VisitedSet) -> f64 {
        if visited.contains(url) {
            debug!("Scoring visited URL {} as 0.0", url);
            return 0.0;
        }
        self.score_resource(url, triples).await
    }

    /// Scores a resource regardless of whether it was visited
    ///
    /// Used for resources currently being processed, which are marked
    /// visited before they are parsed.
    pub async fn score_resource(&self, url: &str, triples: Option<&Graph>) -> f64 {
        let probe_rdf = self
            .fetcher
            .probe_content_type(url)
            .await
            .map_or(false, |content_type| is_rdf_hint(&content_type));
        let score = assess(url, probe_rdf, triples);
        debug!("Relevance of {}: {:.2}", url, score);
        score
    }
}
