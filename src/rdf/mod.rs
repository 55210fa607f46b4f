//! RDF handling module for Signpost-Harvest
//!
//! This module maps URL extensions and media types to RDF serializations,
//! parses bodies into triple sets, extracts data embedded in HTML (JSON-LD
//! scripts, RDFa and microdata) and holds the vocabulary namespaces the rest
//! of the crate refers to.

mod embedded;
mod formats;
mod skolem;
pub mod vocab;

use oxrdf::{BlankNode, NamedNode, Term, Triple};
use thiserror::Error;

pub use embedded::{
    extract_jsonld_scripts, extract_microdata, extract_rdfa, EmbeddedMarkers, JsonLdExtraction,
};
pub use formats::{
    base_media_type, has_rdf_extension, is_html_media_type, is_rdf_media_type,
    is_xml_or_html_media_type, looks_like_rdf_content_type, parse, serialize_quads, to_ntriples,
    to_turtle, FormatUsed, RdfSerialization, FALLBACK_ORDER, RDF_ACCEPT, RDF_MEDIA_TYPES,
};
pub use skolem::{skolem_base, skolemize, GENID_PATH};

/// Errors raised while parsing or serializing RDF
#[derive(Debug, Error)]
pub enum RdfError {
    #[error("Invalid IRI: {0}")]
    Iri(#[from] oxrdf::IriParseError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No parser available for {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] std::io::Error),
}

/// Subject position of a triple under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Iri(NamedNode),
    Blank(BlankNode),
}

impl Node {
    /// A fresh blank node
    pub(crate) fn blank() -> Self {
        Node::Blank(BlankNode::default())
    }

    pub(crate) fn iri(iri: impl Into<String>) -> Result<Self, RdfError> {
        Ok(Node::Iri(NamedNode::new(iri)?))
    }

    /// Builds a triple with this node as subject
    pub(crate) fn triple(&self, predicate: NamedNode, object: impl Into<Term>) -> Triple {
        match self {
            Node::Iri(node) => Triple::new(node.clone(), predicate, object),
            Node::Blank(node) => Triple::new(node.clone(), predicate, object),
        }
    }

    pub(crate) fn to_term(&self) -> Term {
        match self {
            Node::Iri(node) => node.clone().into(),
            Node::Blank(node) => node.clone().into(),
        }
    }
}
