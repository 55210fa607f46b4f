//! Graph store protocol tests against a mock SPARQL endpoint

use oxrdf::{BlankNode, Graph, Literal, NamedNode, Term, Triple};
use signpost_harvest::config::StoreConfig;
use signpost_harvest::storage::{
    GraphStore, GraphStoreGateway, QueryOutcome, SparqlGraphStore, StoreError,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRAPH: &str = "http://crawl.data/example.org_20240101_000000/graph/1";

fn store_config(server: &MockServer) -> StoreConfig {
    StoreConfig {
        endpoint: server.uri(),
        dataset: "kg".to_string(),
        ..StoreConfig::default()
    }
}

fn sample_graph(size: usize) -> Graph {
    let mut graph = Graph::new();
    for i in 0..size {
        graph.insert(&Triple::new(
            NamedNode::new_unchecked(format!("http://example.org/item/{}", i)),
            NamedNode::new_unchecked("http://schema.org/name"),
            Literal::new_simple_literal(format!("Item {}", i)),
        ));
    }
    graph
}

async fn mount_ask(server: &MockServer, exists: bool) {
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("query=ASK"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(r#"{{"head": {{}}, "boolean": {}}}"#, exists)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_graph_exists_asks_the_endpoint() {
    let server = MockServer::start().await;
    mount_ask(&server, true).await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();
    assert!(store.graph_exists(GRAPH).await.unwrap());
}

#[tokio::test]
async fn test_create_graph_posts_one_insert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kg/update"))
        .and(body_string_contains("update=INSERT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();
    store.create_graph(GRAPH, &sample_graph(3)).await.unwrap();
}

#[tokio::test]
async fn test_merge_chunks_large_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kg/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let config = StoreConfig {
        chunk_threshold_bytes: 10,
        chunk_lines: 1,
        ..store_config(&server)
    };
    let store = SparqlGraphStore::from_config(&config).unwrap();
    store.merge_into_graph(GRAPH, &sample_graph(3)).await.unwrap();
}

#[tokio::test]
async fn test_update_failure_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kg/update"))
        .respond_with(ResponseTemplate::new(500).set_body_string("dataset is read-only"))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();
    let result = store.create_graph(GRAPH, &sample_graph(1)).await;
    match result {
        Err(StoreError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "dataset is read-only");
        }
        other => panic!("Expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_count_and_list_graphs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("GROUP+BY"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"head": {"vars": ["g", "count"]}, "results": {"bindings": [
                {"g": {"type": "uri", "value": "http://example.org/a"}, "count": {"type": "literal", "value": "12"}},
                {"g": {"type": "uri", "value": "http://example.org/b"}, "count": {"type": "literal", "value": "3"}}
            ]}}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("query=SELECT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"head": {"vars": ["count"]}, "results": {"bindings": [
                {"count": {"type": "literal", "value": "15"}}
            ]}}"#,
        ))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();

    let graphs = store.list_graphs().await.unwrap();
    assert_eq!(graphs.len(), 2);
    assert_eq!(graphs[0].name, "http://example.org/a");
    assert_eq!(graphs[0].triples, 12);

    assert_eq!(store.count_triples().await.unwrap(), 15);
}

#[tokio::test]
async fn test_gateway_creates_missing_graph() {
    let server = MockServer::start().await;
    mount_ask(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/kg/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();
    let gateway = GraphStoreGateway::new(Arc::new(store), 3, Duration::ZERO);
    assert!(gateway.store_graph(GRAPH, &sample_graph(2)).await);
}

#[tokio::test]
async fn test_gateway_gives_up_after_retries() {
    let server = MockServer::start().await;
    mount_ask(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/kg/update"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();
    let gateway = GraphStoreGateway::new(Arc::new(store), 3, Duration::ZERO);
    assert!(!gateway.store_graph(GRAPH, &sample_graph(2)).await);
}

fn update_bodies(requests: &[wiremock::Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|request| {
            url::form_urlencoded::parse(&request.body)
                .find(|(key, _)| key == "update")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}

#[tokio::test]
async fn test_chunked_writes_skolemize_blank_nodes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kg/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let creator = BlankNode::new_unchecked("creator1");
    let mut graph = Graph::new();
    graph.insert(&Triple::new(
        NamedNode::new_unchecked("http://example.org/ds"),
        NamedNode::new_unchecked("http://schema.org/creator"),
        creator.clone(),
    ));
    graph.insert(&Triple::new(
        creator,
        NamedNode::new_unchecked("http://schema.org/name"),
        Literal::new_simple_literal("Ada"),
    ));

    let config = StoreConfig {
        chunk_threshold_bytes: 10,
        chunk_lines: 1,
        ..store_config(&server)
    };
    let store = SparqlGraphStore::from_config(&config).unwrap();
    store.merge_into_graph(GRAPH, &graph).await.unwrap();

    let bodies = update_bodies(&server.received_requests().await.unwrap());
    assert_eq!(bodies.len(), 2);
    let skolem = "<http://crawl.data/.well-known/genid/creator1>";
    assert!(bodies.iter().all(|body| body.contains(skolem)));
    assert!(bodies.iter().all(|body| !body.contains("_:")));
}

#[tokio::test]
async fn test_run_query_by_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("query=CONSTRUCT"))
        .and(header("accept", "application/n-triples"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<http://example.org/a> <http://schema.org/name> \"A\" .\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("query=SELECT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"head": {"vars": ["s", "name"]}, "results": {"bindings": [
                {"s": {"type": "uri", "value": "http://example.org/a"}, "name": {"type": "literal", "value": "A"}},
                {"s": {"type": "uri", "value": "http://example.org/b"}}
            ]}}"#,
        ))
        .mount(&server)
        .await;
    mount_ask(&server, true).await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();

    match store
        .run_query("SELECT ?s ?name WHERE { ?s <http://schema.org/name> ?name }")
        .await
        .unwrap()
    {
        QueryOutcome::Solutions { variables, rows } => {
            assert_eq!(variables, vec!["s", "name"]);
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0][1], Some(Literal::new_simple_literal("A").into()));
            assert_eq!(rows[1][1], None);
        }
        other => panic!("Expected solutions, got {:?}", other),
    }

    assert_eq!(
        store.run_query("ASK { ?s ?p ?o }").await.unwrap(),
        QueryOutcome::Boolean(true)
    );

    match store
        .run_query("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }")
        .await
        .unwrap()
    {
        QueryOutcome::Graph(graph) => assert_eq!(graph.len(), 1),
        other => panic!("Expected a graph, got {:?}", other),
    }
}

#[tokio::test]
async fn test_describe_and_export_quads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("%3Fp+%3Fo"))
        .and(body_string_contains("DISTINCT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"head": {"vars": ["p", "o"]}, "results": {"bindings": [
                {"p": {"type": "uri", "value": "http://schema.org/name"}, "o": {"type": "literal", "value": "A", "xml:lang": "en"}}
            ]}}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("%3Fs+%3Fp"))
        .and(body_string_contains("DISTINCT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"head": {"vars": ["s", "p"]}, "results": {"bindings": [
                {"s": {"type": "uri", "value": "http://example.org/c"}, "p": {"type": "uri", "value": "http://schema.org/citation"}},
                {"s": {"type": "bnode", "value": "b1"}, "p": {"type": "uri", "value": "http://schema.org/about"}}
            ]}}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/kg/query"))
        .and(body_string_contains("%3Fg+%3Fs+%3Fp+%3Fo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"head": {"vars": ["g", "s", "p", "o"]}, "results": {"bindings": [
                {"g": {"type": "uri", "value": "http://example.org/g"}, "s": {"type": "uri", "value": "http://example.org/a"},
                 "p": {"type": "uri", "value": "http://schema.org/name"}, "o": {"type": "literal", "value": "A"}},
                {"g": {"type": "uri", "value": "http://example.org/g"}, "s": {"type": "uri", "value": "http://example.org/a"},
                 "p": {"type": "uri", "value": "http://schema.org/url"}, "o": {"type": "uri", "value": "http://example.org/a.html"}}
            ]}}"#,
        ))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();

    let description = store.describe("http://example.org/a", 100).await.unwrap();
    assert_eq!(description.outbound.len(), 1);
    assert_eq!(description.inbound.len(), 2);
    assert!(description.inbound[1].subject.to_string().starts_with("_:"));
    assert_eq!(
        description.inbound[0].object,
        Term::NamedNode(NamedNode::new_unchecked("http://example.org/a"))
    );

    let quads = store.quads(None).await.unwrap();
    assert_eq!(quads.len(), 2);
    assert!(quads.iter().all(|quad| quad.graph_name.to_string() == "<http://example.org/g>"));
}

#[tokio::test]
async fn test_ping_reports_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/$/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2024-01-01T00:00:00Z"))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::from_config(&store_config(&server)).unwrap();
    assert!(store.ping().await.is_ok());

    let down = MockServer::start().await;
    let store = SparqlGraphStore::from_config(&store_config(&down)).unwrap();
    assert!(matches!(
        store.ping().await,
        Err(StoreError::Status { status: 404, .. })
    ));
}
