use crate::rdf::RdfError;
use crate::storage::traits::{GraphStore, GraphSummary, ResourceDescription, StoreError};
use async_trait::async_trait;
use oxrdf::{Graph, GraphNameRef, NamedNode, Quad, Triple};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Graph store held in process memory
///
/// Used by tests and `--dry-store` crawls. Graph names are not validated.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graphs: Mutex<BTreeMap<String, Graph>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of a stored graph
    pub fn graph(&self, name: &str) -> Option<Graph> {
        self.graphs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn graph_names(&self) -> Vec<String> {
        self.graphs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

fn extend(target: &mut Graph, triples: &Graph) {
    for triple in triples.iter() {
        target.insert(triple);
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn graph_exists(&self, graph: &str) -> Result<bool, StoreError> {
        Ok(self
            .graphs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(graph)
            .is_some_and(|g| !g.is_empty()))
    }

    async fn create_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError> {
        let mut graphs = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);
        extend(graphs.entry(graph.to_string()).or_default(), triples);
        Ok(())
    }

    async fn merge_into_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError> {
        let mut graphs = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);
        extend(graphs.entry(graph.to_string()).or_default(), triples);
        Ok(())
    }

    async fn count_triples(&self) -> Result<u64, StoreError> {
        Ok(self
            .graphs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|g| g.len() as u64)
            .sum())
    }

    async fn list_graphs(&self) -> Result<Vec<GraphSummary>, StoreError> {
        let mut graphs: Vec<GraphSummary> = self
            .graphs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, g)| !g.is_empty())
            .map(|(name, g)| GraphSummary {
                name: name.clone(),
                triples: g.len() as u64,
            })
            .collect();
        graphs.sort_by(|a, b| b.triples.cmp(&a.triples).then_with(|| a.name.cmp(&b.name)));
        Ok(graphs)
    }

    async fn quads(&self, graph: Option<&str>) -> Result<Vec<Quad>, StoreError> {
        let graphs = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut quads = Vec::new();
        for (name, triples) in graphs.iter() {
            if graph.is_some_and(|wanted| wanted != name) {
                continue;
            }
            let name = NamedNode::new(name.as_str()).map_err(RdfError::from)?;
            for triple in triples.iter() {
                quads.push(triple.in_graph(GraphNameRef::NamedNode(name.as_ref())).into_owned());
            }
        }
        Ok(quads)
    }

    async fn describe(&self, resource: &str, limit: usize) -> Result<ResourceDescription, StoreError> {
        let resource = NamedNode::new(resource).map_err(RdfError::from)?;
        let graphs = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);

        let mut description = ResourceDescription::default();
        for triples in graphs.values() {
            for triple in triples.triples_for_subject(resource.as_ref()) {
                push_distinct(&mut description.outbound, triple.into_owned(), limit);
            }
            for triple in triples.triples_for_object(resource.as_ref()) {
                push_distinct(&mut description.inbound, triple.into_owned(), limit);
            }
        }
        Ok(description)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn push_distinct(triples: &mut Vec<Triple>, triple: Triple, limit: usize) {
    if triples.len() < limit && !triples.contains(&triple) {
        triples.push(triple);
    }
}
