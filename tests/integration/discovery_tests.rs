//! Signposting discovery, fetching and seed checks against mock publishers

use crate::{mount_landing_page, mount_turtle, DATASET_TURTLE};
use signpost_harvest::config::HttpConfig;
use oxrdf::{Graph, Literal, NamedNode, Triple};
use signpost_harvest::crawler::{
    assess_fair, check_seed, discovery_tools, DescriptionSource, DiscoveryPath, ParseOutcome,
    Recommendation,
};
use signpost_harvest::rdf::{FormatUsed, RdfSerialization};
use signpost_harvest::storage::{GraphStore, MemoryGraphStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_config() -> HttpConfig {
    HttpConfig {
        probe_timeout_secs: 2,
        fetch_timeout_secs: 5,
        ..HttpConfig::default()
    }
}

#[tokio::test]
async fn test_link_header_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("HEAD"))
        .and(path("/x"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .insert_header(
                    "Link",
                    format!(
                        "<{base}/meta.ttl>; rel=\"describedby\", <{base}/item.csv>; rel=\"item\""
                    )
                    .as_str(),
                ),
        )
        .mount(&server)
        .await;

    // Header links were found, so the page body is never requested
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_, resolver) = discovery_tools(&http_config()).unwrap();
    let links = resolver.discover_links(&format!("{}/x", base)).await;

    assert_eq!(links.path(), DiscoveryPath::Header);
    assert_eq!(links.len(), 2);
    assert_eq!(links.get("describedby"), Some(format!("{}/meta.ttl", base).as_str()));
    assert_eq!(links.get("item"), Some(format!("{}/item.csv", base).as_str()));

    let stats = resolver.stats();
    assert_eq!(stats.signposting_found, 1);
    assert_eq!(stats.fallback_used, 0);
}

#[tokio::test]
async fn test_html_link_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string(
                    r#"<html><head>
                        <link rel="describedby" href="/meta.ttl" type="text/turtle">
                        <link rel="alternate" type="application/rdf+xml" href="/page.rdf">
                    </head><body><a rel="license" href="https://creativecommons.org/licenses/by/4.0/">CC-BY</a></body></html>"#,
                ),
        )
        .mount(&server)
        .await;

    let (_, resolver) = discovery_tools(&http_config()).unwrap();
    let links = resolver.discover_links(&format!("{}/page", base)).await;

    assert_eq!(links.path(), DiscoveryPath::Html);
    assert_eq!(links.get("describedby"), Some("/meta.ttl"));
    assert_eq!(links.get("alternate"), Some("/page.rdf"));
    assert_eq!(
        links.get("license"),
        Some("https://creativecommons.org/licenses/by/4.0/")
    );
}

#[tokio::test]
async fn test_heuristic_fallback_finds_rdf_variant() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/records/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("<html><body>Record 42</body></html>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/records/42.ttl"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "text/turtle"))
        .mount(&server)
        .await;

    let (_, resolver) = discovery_tools(&http_config()).unwrap();
    let links = resolver.discover_links(&format!("{}/records/42", base)).await;

    assert_eq!(links.path(), DiscoveryPath::Heuristic);
    assert_eq!(
        links.get("alternate"),
        Some(format!("{}/records/42.ttl", base).as_str())
    );
    assert_eq!(resolver.stats().heuristic_hits, 1);
    assert_eq!(resolver.stats().fallback_used, 1);
}

#[tokio::test]
async fn test_embedded_fallback_points_at_jsonld() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string(
                    r#"<html><head><script type="application/ld+json">
                    {"@context": "https://schema.org", "@type": "Dataset", "name": "Tides"}
                    </script></head><body>About</body></html>"#,
                ),
        )
        .mount(&server)
        .await;

    let (_, resolver) = discovery_tools(&http_config()).unwrap();
    let links = resolver.discover_links(&format!("{}/about", base)).await;

    assert_eq!(links.path(), DiscoveryPath::Embedded);
    assert_eq!(
        links.get("describedby"),
        Some(format!("{}/about#jsonld", base).as_str())
    );
    assert_eq!(resolver.stats().embedded_hits, 1);
}

#[tokio::test]
async fn test_nothing_discovered() {
    let server = MockServer::start().await;

    let (_, resolver) = discovery_tools(&http_config()).unwrap();
    let links = resolver.discover_links(&format!("{}/missing", server.uri())).await;

    assert!(links.is_empty());
    assert_eq!(resolver.stats().fallback_used, 0);
}

#[tokio::test]
async fn test_fetch_and_parse_turtle() {
    let server = MockServer::start().await;
    mount_turtle(&server, "/meta.ttl", DATASET_TURTLE).await;

    let (fetcher, _) = discovery_tools(&http_config()).unwrap();
    let parsed = fetcher
        .fetch_and_parse(&format!("{}/meta.ttl", server.uri()))
        .await;

    assert!(parsed.has_triples());
    assert!(parsed.error().is_none());
    assert_eq!(parsed.format.map(|f| f.as_str()), Some("turtle"));
    assert_eq!(parsed.content_type.as_deref(), Some("text/turtle"));
}

#[tokio::test]
async fn test_unparsable_resource_yields_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.ttl"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/turtle")
                .set_body_string("this is { not :: rdf <at all"),
        )
        .mount(&server)
        .await;

    let (fetcher, _) = discovery_tools(&http_config()).unwrap();
    let parsed = fetcher
        .fetch_and_parse(&format!("{}/broken.ttl", server.uri()))
        .await;

    assert_eq!(parsed.triple_count(), 0);
    assert!(matches!(parsed.outcome, ParseOutcome::Failed(_)));
    assert!(parsed.error().is_some());
}

#[tokio::test]
async fn test_non_rdf_content_type_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/photo"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photo"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, _) = discovery_tools(&http_config()).unwrap();
    let parsed = fetcher
        .fetch_and_parse(&format!("{}/photo", server.uri()))
        .await;

    assert!(!parsed.has_triples());
    assert_eq!(parsed.error(), Some("Non-RDF content type"));
}

#[tokio::test]
async fn test_check_seed_with_signposting() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_landing_page(&server, "/landing", &format!("{}/meta.ttl", base), "describedby").await;

    let (fetcher, resolver) = discovery_tools(&http_config()).unwrap();
    let report = check_seed(&fetcher, &resolver, &format!("{}/landing", base)).await;

    assert!(!report.rdf_found);
    assert!(report.signposting_found);
    assert_eq!(report.relations, vec!["describedby"]);
    assert!(!report.known_repository);
    assert!((report.score - 0.3).abs() < 1e-9);
    assert_eq!(report.recommendation, Recommendation::Promising);
}

#[tokio::test]
async fn test_check_seed_with_direct_rdf() {
    let server = MockServer::start().await;
    mount_turtle(&server, "/meta.ttl", DATASET_TURTLE).await;

    let (fetcher, resolver) = discovery_tools(&http_config()).unwrap();
    let report = check_seed(&fetcher, &resolver, &format!("{}/meta.ttl", server.uri())).await;

    assert!(report.rdf_found);
    assert!(report.triple_count > 0);
    assert_eq!(report.format.as_deref(), Some("turtle"));
    assert!(report.score >= 0.5);
    assert_eq!(report.recommendation, Recommendation::Promising);
}

const LICENSED_TURTLE: &str = r#"
@prefix schema: <http://schema.org/> .
@prefix dcterms: <http://purl.org/dc/terms/> .

<> schema:name "Ocean temperatures" ;
    dcterms:license <https://creativecommons.org/licenses/by/4.0/> ;
    schema:identifier <https://doi.org/10.5281/zenodo.1> .
"#;

/// Serves a Turtle dataset that advertises metadata and license links
async fn mount_fair_dataset(server: &MockServer) -> String {
    let url = format!("{}/dataset", server.uri());
    Mock::given(method("HEAD"))
        .and(path("/dataset"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/turtle")
                .insert_header(
                    "Link",
                    format!(
                        "<{url}>; rel=\"describedby\", <https://creativecommons.org/licenses/by/4.0/>; rel=\"license\""
                    )
                    .as_str(),
                ),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dataset"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/turtle")
                .set_body_string(LICENSED_TURTLE),
        )
        .mount(server)
        .await;
    url
}

#[tokio::test]
async fn test_fair_assessment_from_direct_fetch() {
    let server = MockServer::start().await;
    let url = mount_fair_dataset(&server).await;

    let (fetcher, _) = discovery_tools(&http_config()).unwrap();
    let assessment = assess_fair(&fetcher, None, &url).await;

    assert_eq!(
        assessment.source,
        DescriptionSource::Direct(FormatUsed::Serialization(RdfSerialization::Turtle))
    );
    assert_eq!(assessment.triple_count, 3);
    // Link header, describedby and a persistent identifier
    assert_eq!(assessment.findable.score, 3);
    assert_eq!(
        assessment.accessible.details,
        vec!["Supports content negotiation for text/turtle"]
    );
    // Schema.org, Dublin Core and the Turtle serialization
    assert_eq!(assessment.interoperable.score, 3);
    // License link and license statement
    assert_eq!(assessment.reusable.score, 2);
    assert_eq!(assessment.total(), 9);
    assert_eq!(assessment.max(), 20);
    assert_eq!(assessment.percentage(), 45);
}

#[tokio::test]
async fn test_fair_assessment_prefers_the_store() {
    let server = MockServer::start().await;
    let url = mount_fair_dataset(&server).await;

    let store = MemoryGraphStore::new();
    let mut graph = Graph::new();
    graph.insert(&Triple::new(
        NamedNode::new_unchecked(url.as_str()),
        NamedNode::new_unchecked("http://schema.org/name"),
        Literal::new_simple_literal("Ocean temperatures"),
    ));
    store.create_graph("http://crawl.data/g/1", &graph).await.unwrap();

    let (fetcher, _) = discovery_tools(&http_config()).unwrap();
    let assessment = assess_fair(&fetcher, Some(&store), &url).await;

    assert_eq!(assessment.source, DescriptionSource::Store);
    assert_eq!(assessment.triple_count, 1);
    assert_eq!(assessment.findable.details[0], "Resource is indexed in RDF store");
    assert_eq!(assessment.findable.score, 3);
    assert_eq!(assessment.interoperable.score, 1);
    assert_eq!(assessment.reusable.score, 1);
}

#[tokio::test]
async fn test_fair_assessment_of_unreachable_resource() {
    let server = MockServer::start().await;
    let (fetcher, _) = discovery_tools(&http_config()).unwrap();
    let assessment = assess_fair(&fetcher, None, &format!("{}/missing", server.uri())).await;

    assert_eq!(assessment.source, DescriptionSource::None);
    assert_eq!(assessment.total(), 0);
    assert_eq!(assessment.percentage(), 0);
}
