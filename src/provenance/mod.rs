//! Provenance accounting for crawl sessions
//!
//! Every resource whose triples reach the graph store gets a
//! [`ProvenanceRecord`]; the [`ProvenanceAccountant`] keeps the running
//! totals and statistics and the export functions turn both into PROV-O.

mod accountant;
mod export;
mod record;

pub use accountant::ProvenanceAccountant;
pub use export::{
    crawl_iri, export_provenance_graph, final_provenance_graph_name, harvest_graph_name,
    interim_provenance_graph_name, provenance_graph_name, provenance_to_turtle,
    resource_provenance_graph, AGENT_IRI, EXPORT_PREFIXES,
};
pub use record::{ProvenanceRecord, SourceKind};
