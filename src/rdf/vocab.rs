//! Namespace IRIs used for scoring and provenance

use oxrdf::NamedNode;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SCHEMA: &str = "http://schema.org/";
pub const SCHEMA_HTTPS: &str = "https://schema.org/";
pub const DCAT: &str = "http://www.w3.org/ns/dcat#";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const PROV: &str = "http://www.w3.org/ns/prov#";
pub const VOID: &str = "http://rdfs.org/ns/void#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const OA: &str = "http://www.w3.org/ns/oa#";

/// Joins a namespace and a local name
///
/// Only called with the constant namespaces above and fixed local names.
pub fn iri(namespace: &str, local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{}{}", namespace, local))
}

/// `rdf:type`
pub fn rdf_type() -> NamedNode {
    iri(RDF, "type")
}
