//! PROV-O descriptions of a crawl
//!
//! The session graph describes the crawl activity, the agent that ran it,
//! each seed as a used entity and each ingested resource as an entity
//! generated by the activity and grouped into the harvested dataset.

use super::accountant::ProvenanceAccountant;
use super::record::ProvenanceRecord;
use crate::rdf::vocab::{self, iri, rdf_type};
use crate::rdf::{to_turtle, Node, RdfError};
use chrono::{DateTime, Utc};
use oxrdf::vocab::xsd;
use oxrdf::{Graph, Literal, NamedNode};
use tracing::debug;

/// Agent IRI the crawler describes itself with
pub const AGENT_IRI: &str = "http://crawler.fair-signposting.org/agent/FAIRSignpostingCrawler";

/// Prefixes declared in exported Turtle
pub const EXPORT_PREFIXES: &[(&str, &str)] = &[
    ("prov", vocab::PROV),
    ("dc", vocab::DC),
    ("dcterms", vocab::DCTERMS),
    ("dcat", vocab::DCAT),
    ("void", vocab::VOID),
    ("foaf", vocab::FOAF),
    ("schema", vocab::SCHEMA),
    ("rdfs", vocab::RDFS),
    ("xsd", vocab::XSD),
];

/// IRI of the crawl activity
pub fn crawl_iri(crawl_id: &str) -> String {
    format!("http://crawl.data/{}", crawl_id)
}

/// Named graph receiving per-resource provenance
pub fn provenance_graph_name(crawl_id: &str) -> String {
    format!("http://crawl.data/{}/provenance", crawl_id)
}

/// Named graph holding the final session provenance
pub fn final_provenance_graph_name(crawl_id: &str) -> String {
    format!("http://example.org/provenance/{}", crawl_id)
}

/// Named graph holding the checkpointed session provenance
pub fn interim_provenance_graph_name(crawl_id: &str) -> String {
    format!("http://example.org/provenance/{}/interim", crawl_id)
}

/// Fresh graph name for triples reached through a link
pub fn harvest_graph_name(crawl_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "http://crawl.data/{}/graph/{}",
        crawl_id,
        at.format("%Y%m%d%H%M%S%3f")
    )
}

fn timestamp(at: DateTime<Utc>) -> Literal {
    Literal::new_typed_literal(at.to_rfc3339(), xsd::DATE_TIME)
}

fn integer(value: usize) -> Literal {
    Literal::from(i64::try_from(value).unwrap_or(i64::MAX))
}

fn resource_node(url: &str) -> Option<(Node, NamedNode)> {
    match NamedNode::new(url) {
        Ok(node) => Some((Node::Iri(node.clone()), node)),
        Err(e) => {
            debug!("Skipping provenance for {}: {}", url, e);
            None
        }
    }
}

/// Small PROV graph for one ingested resource
pub fn resource_provenance_graph(crawl_id: &str, record: &ProvenanceRecord) -> Graph {
    let mut graph = Graph::new();
    let Some((subject, resource)) = resource_node(&record.resource) else {
        return graph;
    };
    let activity = NamedNode::new_unchecked(crawl_iri(crawl_id));

    graph.insert(&subject.triple(rdf_type(), iri(vocab::PROV, "Entity")));
    graph.insert(&subject.triple(iri(vocab::PROV, "wasGeneratedBy"), activity));
    graph.insert(&subject.triple(iri(vocab::DC, "source"), resource));
    graph.insert(&subject.triple(iri(vocab::DCTERMS, "created"), timestamp(record.recorded_at)));
    graph.insert(&subject.triple(iri(vocab::PROV, "value"), integer(record.triple_count)));
    graph.insert(&subject.triple(
        iri(vocab::PROV, "type"),
        Literal::new_simple_literal(record.source.to_string()),
    ));
    if let Some(format) = &record.format {
        graph.insert(&subject.triple(iri(vocab::DC, "format"), Literal::new_simple_literal(format)));
    }
    if let Some(content_type) = &record.content_type {
        graph.insert(&subject.triple(
            iri(vocab::SCHEMA, "encodingFormat"),
            Literal::new_simple_literal(content_type),
        ));
    }
    graph
}

/// Provenance graph for the whole session
pub fn export_provenance_graph(accountant: &ProvenanceAccountant, agent_name: &str) -> Graph {
    let mut graph = Graph::new();
    let crawl_id = accountant.crawl_id();

    let activity = Node::Iri(NamedNode::new_unchecked(crawl_iri(crawl_id)));
    let dataset = Node::Iri(NamedNode::new_unchecked(format!("{}/dataset", crawl_iri(crawl_id))));
    let agent = Node::Iri(NamedNode::new_unchecked(AGENT_IRI));

    // Activity and agent
    graph.insert(&activity.triple(rdf_type(), iri(vocab::PROV, "Activity")));
    graph.insert(&activity.triple(
        iri(vocab::PROV, "startedAtTime"),
        timestamp(accountant.started_at()),
    ));
    if let Some(finished_at) = accountant.finished_at() {
        graph.insert(&activity.triple(iri(vocab::PROV, "endedAtTime"), timestamp(finished_at)));
    }
    graph.insert(&activity.triple(iri(vocab::PROV, "wasAssociatedWith"), agent.to_term()));
    if let Some(error) = accountant.error() {
        graph.insert(&activity.triple(iri(vocab::RDFS, "comment"), Literal::new_simple_literal(error)));
    }

    graph.insert(&agent.triple(rdf_type(), iri(vocab::PROV, "SoftwareAgent")));
    graph.insert(&agent.triple(iri(vocab::FOAF, "name"), Literal::new_simple_literal(agent_name)));

    // Aggregate dataset
    graph.insert(&dataset.triple(rdf_type(), iri(vocab::VOID, "Dataset")));
    graph.insert(&dataset.triple(iri(vocab::PROV, "wasGeneratedBy"), activity.to_term()));
    graph.insert(&dataset.triple(
        iri(vocab::VOID, "triples"),
        integer(accountant.triples_collected()),
    ));

    for seed in accountant.seeds() {
        let Some((subject, seed_iri)) = resource_node(seed) else {
            continue;
        };
        graph.insert(&subject.triple(rdf_type(), iri(vocab::PROV, "Entity")));
        graph.insert(&subject.triple(rdf_type(), iri(vocab::VOID, "Dataset")));
        graph.insert(&subject.triple(iri(vocab::VOID, "rootResource"), seed_iri.clone()));
        graph.insert(&subject.triple(iri(vocab::DC, "source"), seed_iri));
        graph.insert(&activity.triple(iri(vocab::PROV, "used"), subject.to_term()));
        graph.insert(&dataset.triple(iri(vocab::VOID, "subset"), subject.to_term()));
    }

    for record in accountant.records() {
        let Some((subject, resource)) = resource_node(&record.resource) else {
            continue;
        };
        graph.insert(&subject.triple(rdf_type(), iri(vocab::PROV, "Entity")));
        graph.insert(&subject.triple(iri(vocab::DC, "source"), resource));
        graph.insert(&subject.triple(iri(vocab::PROV, "value"), integer(record.triple_count)));
        graph.insert(&subject.triple(iri(vocab::DCTERMS, "created"), timestamp(record.recorded_at)));
        graph.insert(&subject.triple(iri(vocab::PROV, "wasGeneratedBy"), activity.to_term()));
        graph.insert(&subject.triple(
            iri(vocab::DC, "type"),
            Literal::new_simple_literal(record.source.to_string()),
        ));
        graph.insert(&subject.triple(iri(vocab::SCHEMA, "position"), integer(record.depth as usize)));
        if let Some(format) = &record.format {
            graph.insert(&subject.triple(iri(vocab::DC, "format"), Literal::new_simple_literal(format)));
        }
        graph.insert(&dataset.triple(iri(vocab::VOID, "subset"), subject.to_term()));
    }

    graph
}

/// Serializes a provenance graph as Turtle with the export prefixes
pub fn provenance_to_turtle(graph: &Graph) -> Result<String, RdfError> {
    to_turtle(graph, EXPORT_PREFIXES)
}
