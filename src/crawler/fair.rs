//! FAIR self-assessment of a single resource
//!
//! Awards points in four categories (Findable, Accessible, Interoperable,
//! Reusable), each capped at five. Evidence comes from the resource's HTTP
//! behavior and from its RDF description, read from the graph store when
//! the store knows the resource and fetched directly otherwise.

use super::fetcher::ResourceFetcher;
use super::parser::parse_link_header;
use crate::rdf::{FormatUsed, RDF_ACCEPT};
use crate::storage::GraphStore;
use chrono::{DateTime, Utc};
use oxrdf::{Graph, NamedNodeRef, Term};
use reqwest::header::{CONTENT_TYPE, LINK};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// Points available per category
pub const CATEGORY_MAX: u32 = 5;

const STORE_DESCRIBE_LIMIT: usize = 1000;

const NEGOTIATED_TYPES: [&str; 4] = [
    "application/rdf+xml",
    "text/turtle",
    "application/ld+json",
    "application/n-triples",
];

const PERSISTENT_ID_HOSTS: [&str; 6] = [
    "doi.org",
    "handle.net",
    "purl.org",
    "w3id.org",
    "identifiers.org",
    "orcid.org",
];

const METADATA_VOCABULARIES: [(&str, &str); 7] = [
    ("http://schema.org/", "Schema.org"),
    ("https://schema.org/", "Schema.org"),
    ("http://purl.org/dc/", "Dublin Core"),
    ("http://www.w3.org/ns/dcat", "DCAT"),
    ("http://xmlns.com/foaf/", "FOAF"),
    ("http://rdfs.org/ns/void", "VoID"),
    ("http://www.w3.org/2004/02/skos/", "SKOS"),
];

/// At most this many points come from vocabulary use
const VOCABULARY_POINTS: u32 = 3;

const LICENSE_PREDICATES: [&str; 4] = [
    "http://purl.org/dc/terms/license",
    "http://schema.org/license",
    "http://www.w3.org/1999/xhtml/vocab#license",
    "http://creativecommons.org/ns#license",
];

const PROVENANCE_PREDICATES: [&str; 4] = [
    "http://purl.org/dc/terms/provenance",
    "http://purl.org/dc/terms/source",
    "http://www.w3.org/ns/prov#wasGeneratedBy",
    "http://www.w3.org/ns/prov#wasDerivedFrom",
];

/// Score and evidence for one FAIR principle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FairCategory {
    pub score: u32,
    pub max: u32,
    pub details: Vec<String>,
}

impl Default for FairCategory {
    fn default() -> Self {
        Self {
            score: 0,
            max: CATEGORY_MAX,
            details: Vec::new(),
        }
    }
}

impl FairCategory {
    fn award(&mut self, points: u32, detail: impl Into<String>) {
        self.score += points;
        self.details.push(detail.into());
    }

    fn cap(&mut self) {
        self.score = self.score.min(self.max);
    }
}

/// Where the assessed description came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSource {
    Store,
    Direct(FormatUsed),
    None,
}

impl fmt::Display for DescriptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "graph store"),
            Self::Direct(format) => write!(f, "direct fetch ({})", format),
            Self::None => write!(f, "none"),
        }
    }
}

/// Outcome of a FAIR assessment
#[derive(Debug, Clone, PartialEq)]
pub struct FairAssessment {
    pub url: String,
    pub assessed_at: DateTime<Utc>,
    pub source: DescriptionSource,
    pub triple_count: usize,
    pub findable: FairCategory,
    pub accessible: FairCategory,
    pub interoperable: FairCategory,
    pub reusable: FairCategory,
}

impl FairAssessment {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            assessed_at: Utc::now(),
            source: DescriptionSource::None,
            triple_count: 0,
            findable: FairCategory::default(),
            accessible: FairCategory::default(),
            interoperable: FairCategory::default(),
            reusable: FairCategory::default(),
        }
    }

    /// Categories in F, A, I, R order with their labels
    pub fn categories(&self) -> [(&'static str, &FairCategory); 4] {
        [
            ("Findable", &self.findable),
            ("Accessible", &self.accessible),
            ("Interoperable", &self.interoperable),
            ("Reusable", &self.reusable),
        ]
    }

    /// Sum of the capped category scores
    pub fn total(&self) -> u32 {
        self.categories().iter().map(|(_, c)| c.score).sum()
    }

    pub fn max(&self) -> u32 {
        self.categories().iter().map(|(_, c)| c.max).sum()
    }

    /// Total as a rounded percentage of the maximum
    pub fn percentage(&self) -> u32 {
        let max = self.max();
        if max == 0 {
            return 0;
        }
        ((self.total() as f64 / max as f64) * 100.0).round() as u32
    }

    /// Awards points from the headers of a HEAD response
    fn assess_link_header(&mut self, values: &[String]) {
        if values.is_empty() {
            return;
        }
        self.findable
            .award(1, "Resource uses HTTP Link headers for Signposting");

        for (rel, _) in values.iter().flat_map(|v| parse_link_header(v)) {
            match rel.as_str() {
                "describedby" => self
                    .findable
                    .award(1, "Resource links to its metadata (describedby)"),
                "license" => self
                    .reusable
                    .award(1, "Resource links to license information"),
                "type" => self.interoperable.award(1, "Resource specifies its type"),
                "cite-as" => self
                    .reusable
                    .award(1, "Resource provides citation information"),
                _ => {}
            }
        }
    }

    /// Awards points from the content of the description
    fn assess_description(&mut self, graph: &Graph) {
        if let Some(host) = persistent_identifier(graph) {
            self.findable
                .award(1, format!("Uses persistent identifier: {}", host));
        }

        let vocabularies = vocabularies(graph);
        if !vocabularies.is_empty() {
            self.interoperable.score += (vocabularies.len() as u32).min(VOCABULARY_POINTS);
            for name in vocabularies {
                self.interoperable
                    .details
                    .push(format!("Uses standardized vocabulary: {}", name));
            }
        }

        let Ok(resource) = NamedNodeRef::new(&self.url) else {
            return;
        };
        if has_any_predicate(graph, resource, &LICENSE_PREDICATES) {
            self.reusable.award(1, "Contains license information in RDF");
        }
        if has_any_predicate(graph, resource, &PROVENANCE_PREDICATES) {
            self.reusable.award(1, "Contains provenance information");
        }

        if let DescriptionSource::Direct(FormatUsed::Serialization(format)) = self.source {
            self.interoperable.award(
                1,
                format!("Resource available in machine-readable format: {}", format),
            );
        }
    }

    fn cap(&mut self) {
        self.findable.cap();
        self.accessible.cap();
        self.interoperable.cap();
        self.reusable.cap();
    }
}

/// Host of the first persistent identifier IRI found anywhere in `graph`
fn persistent_identifier(graph: &Graph) -> Option<&'static str> {
    graph.iter().find_map(|triple| {
        let subject: Term = triple.subject.into_owned().into();
        let positions = [
            subject,
            triple.predicate.into_owned().into(),
            triple.object.into_owned(),
        ];
        positions.iter().find_map(|term| match term {
            Term::NamedNode(node) => PERSISTENT_ID_HOSTS
                .iter()
                .copied()
                .find(|host| node.as_str().contains(host)),
            _ => None,
        })
    })
}

/// Names of the well-known vocabularies used as predicates
fn vocabularies(graph: &Graph) -> BTreeSet<&'static str> {
    graph
        .iter()
        .flat_map(|triple| {
            let predicate = triple.predicate.as_str();
            METADATA_VOCABULARIES
                .iter()
                .filter(move |(namespace, _)| predicate.contains(namespace))
                .map(|(_, name)| *name)
        })
        .collect()
}

fn has_any_predicate(graph: &Graph, resource: NamedNodeRef<'_>, predicates: &[&str]) -> bool {
    predicates.iter().any(|predicate| {
        NamedNodeRef::new(predicate)
            .map(|p| graph.object_for_subject_predicate(resource, p).is_some())
            .unwrap_or(false)
    })
}

/// Loads the description from the store, falling back to a direct fetch
async fn load_description(
    fetcher: &ResourceFetcher,
    store: Option<&dyn GraphStore>,
    assessment: &mut FairAssessment,
) -> Graph {
    if let Some(store) = store {
        match store.describe(&assessment.url, STORE_DESCRIBE_LIMIT).await {
            Ok(description) if !description.is_empty() => {
                assessment.source = DescriptionSource::Store;
                assessment
                    .findable
                    .award(1, "Resource is indexed in RDF store");
                return description.to_graph();
            }
            Ok(_) => debug!("{} is not in the graph store", assessment.url),
            Err(e) => warn!("Graph store lookup failed for {}: {}", assessment.url, e),
        }
    }

    let parsed = fetcher.fetch_and_parse(&assessment.url).await;
    if let (true, Some(format)) = (parsed.has_triples(), parsed.format) {
        assessment.source = DescriptionSource::Direct(format);
    }
    parsed.triples
}

/// Scores the FAIRness of the resource at `url`
///
/// Scoring:
/// - Findable: store indexing, a `Link` header, a `describedby` link and a
///   persistent identifier each give a point
/// - Accessible: a point for content negotiation to an RDF type, otherwise
///   a point for plain HTTP access
/// - Interoperable: a `type` link, one point per well-known vocabulary (up
///   to three) and a directly served RDF serialization
/// - Reusable: `license` and `cite-as` links, license and provenance
///   statements about the resource
///
/// Categories are capped at [`CATEGORY_MAX`] before the total is taken.
pub async fn assess_fair(
    fetcher: &ResourceFetcher,
    store: Option<&dyn GraphStore>,
    url: &str,
) -> FairAssessment {
    let mut assessment = FairAssessment::new(url);

    let graph = load_description(fetcher, store, &mut assessment).await;
    assessment.triple_count = graph.len();

    let head = fetcher.head(url, RDF_ACCEPT).await;
    let head_ok = head.as_ref().map(|r| r.status().is_success()).unwrap_or(false);
    if let Some(response) = &head {
        let links: Vec<String> = response
            .headers()
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        assessment.assess_link_header(&links);
    }

    let mut negotiated = None;
    for media_type in NEGOTIATED_TYPES {
        let Some(response) = fetcher.head(url, media_type).await else {
            continue;
        };
        let served = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if response.status().is_success() && served.contains(media_type) {
            negotiated = Some(media_type);
            break;
        }
    }
    match negotiated {
        Some(media_type) => assessment.accessible.award(
            1,
            format!("Supports content negotiation for {}", media_type),
        ),
        None if head_ok => assessment
            .accessible
            .award(1, "Resource is accessible via HTTP"),
        None => {}
    }

    if !graph.is_empty() {
        assessment.assess_description(&graph);
    }

    assessment.cap();
    debug!(
        "FAIR assessment of {}: {}/{}",
        url,
        assessment.total(),
        assessment.max()
    );
    assessment
}
