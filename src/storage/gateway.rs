use crate::config::StoreConfig;
use crate::storage::traits::{GraphStore, StoreError};
use oxrdf::Graph;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Retrying write path into a [`GraphStore`]
///
/// A write checks whether the target graph exists, then merges into it or
/// creates it. Failed attempts are retried with a fixed delay; once the
/// attempts are exhausted the caller gets `false` and nothing is raised.
#[derive(Clone)]
pub struct GraphStoreGateway {
    store: Arc<dyn GraphStore>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl GraphStoreGateway {
    pub fn new(store: Arc<dyn GraphStore>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(store: Arc<dyn GraphStore>, config: &StoreConfig) -> Self {
        Self::new(store, config.max_retries, config.retry_delay())
    }

    /// The underlying store, for read queries
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Stores `triples` in the named graph `graph`
    ///
    /// Returns true once the store accepted the triples. Empty input is
    /// never written and reports false.
    pub async fn store_graph(&self, graph: &str, triples: &Graph) -> bool {
        if triples.is_empty() {
            warn!("Attempted to store empty graph in {}, skipping", graph);
            return false;
        }

        for attempt in 1..=self.max_attempts {
            match self.write(graph, triples).await {
                Ok(()) => {
                    info!("Stored {} triples in named graph {}", triples.len(), graph);
                    return true;
                }
                Err(e) => {
                    warn!(
                        "Error storing graph {} (attempt {}/{}): {}",
                        graph, attempt, self.max_attempts, e
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        error!(
            "Failed to store graph {} after {} attempts",
            graph, self.max_attempts
        );
        false
    }

    async fn write(&self, graph: &str, triples: &Graph) -> Result<(), StoreError> {
        if self.store.graph_exists(graph).await? {
            info!("Graph {} already exists, merging new data", graph);
            self.store.merge_into_graph(graph, triples).await
        } else {
            self.store.create_graph(graph, triples).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::ResourceDescription;
    use crate::storage::{GraphSummary, MemoryGraphStore};
    use async_trait::async_trait;
    use oxrdf::{NamedNode, Quad, Triple};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            NamedNode::new_unchecked("http://example.org/s"),
            NamedNode::new_unchecked("http://example.org/p"),
            NamedNode::new_unchecked("http://example.org/o"),
        ));
        graph
    }

    /// Store failing a fixed number of existence checks before delegating
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
        inner: MemoryGraphStore,
    }

    #[async_trait]
    impl GraphStore for FlakyStore {
        async fn graph_exists(&self, graph: &str) -> Result<bool, StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(StoreError::Response("unavailable".to_string()));
            }
            self.inner.graph_exists(graph).await
        }

        async fn create_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError> {
            self.inner.create_graph(graph, triples).await
        }

        async fn merge_into_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError> {
            self.inner.merge_into_graph(graph, triples).await
        }

        async fn count_triples(&self) -> Result<u64, StoreError> {
            self.inner.count_triples().await
        }

        async fn list_graphs(&self) -> Result<Vec<GraphSummary>, StoreError> {
            self.inner.list_graphs().await
        }

        async fn quads(&self, graph: Option<&str>) -> Result<Vec<Quad>, StoreError> {
            self.inner.quads(graph).await
        }

        async fn describe(&self, resource: &str, limit: usize) -> Result<ResourceDescription, StoreError> {
            self.inner.describe(resource, limit).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
    }

    fn flaky(failures: u32) -> Arc<FlakyStore> {
        Arc::new(FlakyStore {
            failures,
            calls: AtomicU32::new(0),
            inner: MemoryGraphStore::new(),
        })
    }

    #[tokio::test]
    async fn test_empty_graph_is_rejected() {
        let gateway = GraphStoreGateway::new(Arc::new(MemoryGraphStore::new()), 3, Duration::ZERO);
        assert!(!gateway.store_graph("http://g", &Graph::new()).await);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let store = flaky(2);
        let gateway = GraphStoreGateway::new(store.clone(), 3, Duration::ZERO);

        assert!(gateway.store_graph("http://g", &sample_graph()).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.inner.graph("http://g").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = flaky(5);
        let gateway = GraphStoreGateway::new(store.clone(), 3, Duration::ZERO);

        assert!(!gateway.store_graph("http://g", &sample_graph()).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert!(store.inner.graph("http://g").is_none());
    }
}
