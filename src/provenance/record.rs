use chrono::{DateTime, Utc};
use std::fmt;

/// How an ingested resource was reached
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The crawled URL itself parsed as RDF
    DirectRdf,

    /// Followed a signposting relation published by the source
    Signposting(String),

    /// Found by heuristic probing or embedded-data detection
    Fallback(String),
}

impl SourceKind {
    /// Relation type carried by the source kind, if any
    pub fn relation(&self) -> Option<&str> {
        match self {
            Self::DirectRdf => None,
            Self::Signposting(rel) | Self::Fallback(rel) => Some(rel),
        }
    }

    /// Parses the label produced by `Display`
    pub fn parse(label: &str) -> Option<Self> {
        if label == "direct_rdf" {
            return Some(Self::DirectRdf);
        }
        if let Some(rel) = label.strip_prefix("signposting:") {
            return Some(Self::Signposting(rel.to_string()));
        }
        label
            .strip_prefix("fallback:")
            .map(|rel| Self::Fallback(rel.to_string()))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectRdf => write!(f, "direct_rdf"),
            Self::Signposting(rel) => write!(f, "signposting:{}", rel),
            Self::Fallback(rel) => write!(f, "fallback:{}", rel),
        }
    }
}

/// One ingested resource
///
/// Created only after the triples were accepted by the graph store; never
/// mutated once handed to the accountant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceRecord {
    pub resource: String,
    pub source: SourceKind,
    pub triple_count: usize,
    pub format: Option<String>,
    pub content_type: Option<String>,
    pub depth: u32,
    pub recorded_at: DateTime<Utc>,

    /// Named graph the triples were stored in
    pub graph: Option<String>,
}

impl ProvenanceRecord {
    pub fn new(resource: impl Into<String>, source: SourceKind, triple_count: usize, depth: u32) -> Self {
        Self {
            resource: resource.into(),
            source,
            triple_count,
            format: None,
            content_type: None,
            depth,
            recorded_at: Utc::now(),
            graph: None,
        }
    }

    pub fn with_format(mut self, format: Option<impl Into<String>>) -> Self {
        self.format = format.map(Into::into);
        self
    }

    pub fn with_content_type(mut self, content_type: Option<impl Into<String>>) -> Self {
        self.content_type = content_type.map(Into::into);
        self
    }

    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    pub fn with_recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = at;
        self
    }
}
