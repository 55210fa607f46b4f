//! Blank node skolemization
//!
//! Triples sent to a remote store in several requests, or sent again after a
//! failed attempt, must keep naming the same nodes. Blank nodes are replaced
//! by IRIs under `/.well-known/genid/` of the target graph's origin.

use super::Node;
use oxrdf::{Graph, NamedNode, Term};
use url::Url;

/// Path segment reserved for skolem IRIs
pub const GENID_PATH: &str = "/.well-known/genid/";

/// Namespace skolem IRIs are minted in for `graph`
///
/// Graph names without an HTTP(S) origin fall back to `urn:genid:`.
pub fn skolem_base(graph: &str) -> String {
    match Url::parse(graph) {
        Ok(url) if url.origin().is_tuple() => {
            format!("{}{}", url.origin().ascii_serialization(), GENID_PATH)
        }
        _ => "urn:genid:".to_string(),
    }
}

fn skolem_term(term: Term, base: &str) -> Term {
    match term {
        Term::BlankNode(node) => {
            NamedNode::new_unchecked(format!("{}{}", base, node.as_str())).into()
        }
        other => other,
    }
}

/// Copy of `triples` with every blank node replaced by a skolem IRI
///
/// The same blank node always maps to the same IRI, so repeated calls on one
/// graph produce identical output.
pub fn skolemize(triples: &Graph, graph: &str) -> Graph {
    let base = skolem_base(graph);
    let mut skolemized = Graph::new();

    for triple in triples.iter() {
        let subject = match skolem_term(triple.subject.into_owned().into(), &base) {
            Term::NamedNode(node) => Node::Iri(node),
            Term::BlankNode(node) => Node::Blank(node),
            _ => continue,
        };
        let object = skolem_term(triple.object.into_owned(), &base);
        skolemized.insert(&subject.triple(triple.predicate.into_owned(), object));
    }
    skolemized
}
