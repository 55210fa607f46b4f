//! Graph store backed by a SPARQL 1.1 endpoint
//!
//! Queries are posted to `{endpoint}/{dataset}/query` and updates to
//! `{endpoint}/{dataset}/update`, both form-encoded. Results are read as
//! `application/sparql-results+json`, graph results as N-Triples. Blank
//! nodes are skolemized before any write.

use crate::config::StoreConfig;
use crate::rdf::{parse, skolemize, to_ntriples, Node, RdfError, RdfSerialization};
use crate::storage::traits::{GraphStore, GraphSummary, ResourceDescription, StoreError};
use async_trait::async_trait;
use oxrdf::{BlankNode, Graph, GraphName, Literal, NamedNode, Quad, Term, Triple};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

const RESULTS_JSON: &str = "application/sparql-results+json";
const NTRIPLES: &str = "application/n-triples";

#[derive(Debug, Deserialize)]
struct AskResponse {
    boolean: bool,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    #[serde(default)]
    head: SelectHead,
    results: SelectResults,
}

#[derive(Debug, Default, Deserialize)]
struct SelectHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SelectResults {
    bindings: Vec<HashMap<String, BindingValue>>,
}

/// One bound value in `application/sparql-results+json`
#[derive(Debug, Deserialize)]
struct BindingValue {
    #[serde(rename = "type", default)]
    kind: String,
    value: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(rename = "xml:lang", default)]
    lang: Option<String>,
}

impl BindingValue {
    fn to_term(&self) -> Option<Term> {
        match self.kind.as_str() {
            "uri" => NamedNode::new(self.value.as_str()).ok().map(Term::from),
            "bnode" => BlankNode::new(self.value.as_str()).ok().map(Term::from),
            "literal" | "typed-literal" => {
                let literal = match (&self.lang, &self.datatype) {
                    (Some(lang), _) => {
                        Literal::new_language_tagged_literal(self.value.as_str(), lang.as_str()).ok()?
                    }
                    (None, Some(datatype)) => Literal::new_typed_literal(
                        self.value.as_str(),
                        NamedNode::new(datatype.as_str()).ok()?,
                    ),
                    (None, None) => Literal::new_simple_literal(self.value.as_str()),
                };
                Some(literal.into())
            }
            _ => None,
        }
    }
}

type Row = HashMap<String, BindingValue>;

fn row_subject(row: &Row, var: &str) -> Option<Node> {
    match row.get(var)?.to_term()? {
        Term::NamedNode(node) => Some(Node::Iri(node)),
        Term::BlankNode(node) => Some(Node::Blank(node)),
        _ => None,
    }
}

fn row_predicate(row: &Row, var: &str) -> Option<NamedNode> {
    match row.get(var)?.to_term()? {
        Term::NamedNode(node) => Some(node),
        _ => None,
    }
}

fn row_object(row: &Row, var: &str) -> Option<Term> {
    row.get(var)?.to_term()
}

/// The four SPARQL query forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryForm {
    Select,
    Ask,
    Construct,
    Describe,
}

/// Detects the form of a query from its first form keyword
///
/// IRIs and comments are skipped so prefixes such as `<http://a.org/ask/>`
/// do not count.
///
/// # Examples
///
/// ```
/// use signpost_harvest::storage::{query_form, QueryForm};
///
/// let query = "PREFIX s: <http://schema.org/select/> CONSTRUCT { ?a ?b ?c } WHERE { ?a ?b ?c }";
/// assert_eq!(query_form(query), Some(QueryForm::Construct));
/// assert_eq!(query_form("ask { ?s ?p ?o }"), Some(QueryForm::Ask));
/// assert_eq!(query_form("INSERT DATA { }"), None);
/// ```
pub fn query_form(query: &str) -> Option<QueryForm> {
    let mut text = String::with_capacity(query.len());
    let mut in_iri = false;
    for line in query.lines() {
        for c in line.chars() {
            match c {
                '<' if !in_iri => in_iri = true,
                '>' if in_iri => in_iri = false,
                '#' if !in_iri => break,
                _ if !in_iri => text.push(c),
                _ => {}
            }
        }
        text.push('\n');
    }

    text.split(|c: char| !c.is_ascii_alphabetic())
        .find_map(|word| match word.to_ascii_uppercase().as_str() {
            "SELECT" => Some(QueryForm::Select),
            "ASK" => Some(QueryForm::Ask),
            "CONSTRUCT" => Some(QueryForm::Construct),
            "DESCRIBE" => Some(QueryForm::Describe),
            _ => None,
        })
}

/// Result of an ad-hoc query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Boolean(bool),

    /// Variable names and one row per solution; unbound cells are `None`
    Solutions {
        variables: Vec<String>,
        rows: Vec<Vec<Option<Term>>>,
    },

    Graph(Graph),
}

/// Remote named-graph store
#[derive(Debug, Clone)]
pub struct SparqlGraphStore {
    client: Client,
    query_url: String,
    update_url: String,
    ping_url: String,
    chunk_threshold_bytes: usize,
    chunk_lines: usize,
}

impl SparqlGraphStore {
    /// Creates a store sharing an existing HTTP client
    pub fn new(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            query_url: config.query_url(),
            update_url: config.update_url(),
            ping_url: config.ping_url(),
            chunk_threshold_bytes: config.chunk_threshold_bytes,
            chunk_lines: config.chunk_lines.max(1),
        }
    }

    /// Creates a store with its own HTTP client
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::new(client, config))
    }

    async fn query(&self, sparql: &str) -> Result<String, StoreError> {
        self.query_as(sparql, RESULTS_JSON).await
    }

    async fn query_as(&self, sparql: &str, accept: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .post(&self.query_url)
            .header(ACCEPT, accept)
            .form(&[("query", sparql)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn select(&self, sparql: &str) -> Result<Vec<Row>, StoreError> {
        Ok(self.select_response(sparql).await?.results.bindings)
    }

    async fn select_response(&self, sparql: &str) -> Result<SelectResponse, StoreError> {
        let body = self.query(sparql).await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Response(e.to_string()))
    }

    /// Runs any read query and decodes its result by query form
    pub async fn run_query(&self, sparql: &str) -> Result<QueryOutcome, StoreError> {
        match query_form(sparql) {
            Some(QueryForm::Ask) => {
                let body = self.query(sparql).await?;
                let parsed: AskResponse =
                    serde_json::from_str(&body).map_err(|e| StoreError::Response(e.to_string()))?;
                Ok(QueryOutcome::Boolean(parsed.boolean))
            }
            Some(QueryForm::Construct) | Some(QueryForm::Describe) => {
                let body = self.query_as(sparql, NTRIPLES).await?;
                let graph = parse(body.as_bytes(), RdfSerialization::NTriples, &self.query_url)?;
                Ok(QueryOutcome::Graph(graph))
            }
            Some(QueryForm::Select) | None => {
                let response = self.select_response(sparql).await?;
                let variables = response.head.vars;
                let rows = response
                    .results
                    .bindings
                    .iter()
                    .map(|row| {
                        variables
                            .iter()
                            .map(|var| row.get(var).and_then(BindingValue::to_term))
                            .collect()
                    })
                    .collect();
                Ok(QueryOutcome::Solutions { variables, rows })
            }
        }
    }

    async fn update(&self, sparql: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.update_url)
            .form(&[("update", sparql)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

fn graph_iri(graph: &str) -> Result<NamedNode, StoreError> {
    NamedNode::new(graph).map_err(|e| StoreError::Serialization(RdfError::from(e)))
}

fn insert_data(graph: &NamedNode, ntriples: &str) -> String {
    format!("INSERT DATA {{ GRAPH {} {{\n{}}} }}", graph, ntriples)
}

/// Splits an N-Triples payload into chunks of at most `lines` statements
///
/// Payloads at or below `threshold` bytes stay whole.
fn chunk_payload(ntriples: &str, threshold: usize, lines: usize) -> Vec<String> {
    if ntriples.len() <= threshold {
        return vec![ntriples.to_string()];
    }

    let statements: Vec<&str> = ntriples.lines().filter(|l| !l.trim().is_empty()).collect();
    statements
        .chunks(lines.max(1))
        .map(|chunk| {
            let mut payload = chunk.join("\n");
            payload.push('\n');
            payload
        })
        .collect()
}

fn parse_count(value: &str) -> Result<u64, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Response(format!("not a count: {}", value)))
}

#[async_trait]
impl GraphStore for SparqlGraphStore {
    async fn graph_exists(&self, graph: &str) -> Result<bool, StoreError> {
        let graph = graph_iri(graph)?;
        let body = self
            .query(&format!("ASK WHERE {{ GRAPH {} {{ ?s ?p ?o }} }}", graph))
            .await?;
        let parsed: AskResponse =
            serde_json::from_str(&body).map_err(|e| StoreError::Response(e.to_string()))?;
        Ok(parsed.boolean)
    }

    async fn create_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError> {
        let triples = skolemize(triples, graph);
        let graph = graph_iri(graph)?;
        self.update(&insert_data(&graph, &to_ntriples(&triples))).await?;
        debug!("Created graph {} with {} triples", graph, triples.len());
        Ok(())
    }

    async fn merge_into_graph(&self, graph: &str, triples: &Graph) -> Result<(), StoreError> {
        let triples = skolemize(triples, graph);
        let graph = graph_iri(graph)?;
        let chunks = chunk_payload(
            &to_ntriples(&triples),
            self.chunk_threshold_bytes,
            self.chunk_lines,
        );
        let total = chunks.len();

        for (i, chunk) in chunks.iter().enumerate() {
            self.update(&insert_data(&graph, chunk)).await?;
            if total > 1 {
                info!("Stored chunk {}/{} in graph {}", i + 1, total, graph);
            }
        }
        Ok(())
    }

    async fn count_triples(&self) -> Result<u64, StoreError> {
        let bindings = self
            .select("SELECT (COUNT(*) AS ?count) WHERE { GRAPH ?g { ?s ?p ?o } }")
            .await?;
        match bindings.first().and_then(|row| row.get("count")) {
            Some(count) => parse_count(&count.value),
            None => Ok(0),
        }
    }

    async fn list_graphs(&self) -> Result<Vec<GraphSummary>, StoreError> {
        let bindings = self
            .select(
                "SELECT ?g (COUNT(*) AS ?count) WHERE { GRAPH ?g { ?s ?p ?o } } \
                 GROUP BY ?g ORDER BY DESC(?count)",
            )
            .await?;

        bindings
            .iter()
            .filter_map(|row| Some((row.get("g")?, row.get("count")?)))
            .map(|(g, count)| {
                Ok(GraphSummary {
                    name: g.value.clone(),
                    triples: parse_count(&count.value)?,
                })
            })
            .collect()
    }

    async fn quads(&self, graph: Option<&str>) -> Result<Vec<Quad>, StoreError> {
        let (query, fixed) = match graph {
            Some(graph) => {
                let graph = graph_iri(graph)?;
                (
                    format!("SELECT ?s ?p ?o WHERE {{ GRAPH {} {{ ?s ?p ?o }} }}", graph),
                    Some(graph),
                )
            }
            None => (
                "SELECT ?g ?s ?p ?o WHERE { GRAPH ?g { ?s ?p ?o } }".to_string(),
                None,
            ),
        };

        let bindings = self.select(&query).await?;
        let quads = bindings
            .iter()
            .filter_map(|row| {
                let graph_name = match &fixed {
                    Some(graph) => graph.clone(),
                    None => row_predicate(row, "g")?,
                };
                let triple = row_subject(row, "s")?
                    .triple(row_predicate(row, "p")?, row_object(row, "o")?);
                Some(triple.in_graph(GraphName::NamedNode(graph_name)))
            })
            .collect::<Vec<_>>();

        if quads.len() < bindings.len() {
            debug!("Skipped {} undecodable rows", bindings.len() - quads.len());
        }
        Ok(quads)
    }

    async fn describe(&self, resource: &str, limit: usize) -> Result<ResourceDescription, StoreError> {
        let node = graph_iri(resource)?;

        let outbound = self
            .select(&format!(
                "SELECT DISTINCT ?p ?o WHERE {{ GRAPH ?g {{ {} ?p ?o }} }} LIMIT {}",
                node, limit
            ))
            .await?
            .iter()
            .filter_map(|row| {
                Some(Triple::new(node.clone(), row_predicate(row, "p")?, row_object(row, "o")?))
            })
            .collect();

        let inbound = self
            .select(&format!(
                "SELECT DISTINCT ?s ?p WHERE {{ GRAPH ?g {{ ?s ?p {} }} }} LIMIT {}",
                node, limit
            ))
            .await?
            .iter()
            .filter_map(|row| {
                Some(row_subject(row, "s")?.triple(row_predicate(row, "p")?, node.clone()))
            })
            .collect();

        Ok(ResourceDescription { outbound, inbound })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(&self.ping_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_payload_is_not_chunked() {
        let payload = "<http://a> <http://b> <http://c> .\n";
        assert_eq!(chunk_payload(payload, 100, 1), vec![payload.to_string()]);
    }

    #[test]
    fn test_large_payload_is_chunked_by_lines() {
        let payload: String = (0..5)
            .map(|i| format!("<http://a/{}> <http://b> <http://c> .\n", i))
            .collect();
        let chunks = chunk_payload(&payload, 10, 2);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].lines().count(), 2);
        assert_eq!(chunks[2].lines().count(), 1);
        assert_eq!(chunks.concat(), payload);
    }

    #[test]
    fn test_insert_data_wraps_graph() {
        let graph = NamedNode::new("http://example.org/g").unwrap();
        let update = insert_data(&graph, "<http://a> <http://b> <http://c> .\n");
        assert!(update.starts_with("INSERT DATA { GRAPH <http://example.org/g> {"));
        assert!(update.contains("<http://a> <http://b> <http://c> ."));
    }

    #[test]
    fn test_binding_terms() {
        let binding = |json: &str| serde_json::from_str::<BindingValue>(json).unwrap().to_term();

        assert_eq!(
            binding(r#"{"type": "uri", "value": "http://example.org/a"}"#),
            Some(NamedNode::new_unchecked("http://example.org/a").into())
        );
        assert_eq!(
            binding(r#"{"type": "literal", "value": "Ada", "xml:lang": "en"}"#),
            Some(Literal::new_language_tagged_literal_unchecked("Ada", "en").into())
        );
        assert_eq!(
            binding(
                r#"{"type": "literal", "value": "3", "datatype": "http://www.w3.org/2001/XMLSchema#integer"}"#
            ),
            Some(Literal::new_typed_literal("3", NamedNode::new_unchecked("http://www.w3.org/2001/XMLSchema#integer")).into())
        );
        assert!(matches!(
            binding(r#"{"type": "bnode", "value": "b0"}"#),
            Some(Term::BlankNode(_))
        ));
        assert_eq!(binding(r#"{"type": "uri", "value": "not an iri"}"#), None);
    }

    #[test]
    fn test_query_form_skips_prologue() {
        let query = "# find everything\nPREFIX ask: <http://example.org/describe#>\nSELECT * WHERE { ?s ?p ?o }";
        assert_eq!(query_form(query), Some(QueryForm::Select));
        assert_eq!(query_form("DESCRIBE <http://example.org/x>"), Some(QueryForm::Describe));
    }

    #[test]
    fn test_invalid_graph_name() {
        assert!(graph_iri("not a graph").is_err());
    }

    #[test]
    fn test_urls_from_config() {
        let store = SparqlGraphStore::new(Client::new(), &StoreConfig::default());
        assert_eq!(store.query_url, "http://localhost:3030/knowledge_graph/query");
        assert_eq!(store.update_url, "http://localhost:3030/knowledge_graph/update");
        assert_eq!(store.ping_url, "http://localhost:3030/$/ping");
    }
}
