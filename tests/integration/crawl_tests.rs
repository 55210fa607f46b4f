//! Full crawl sessions against mock publishers
//!
//! Harvested triples land in a [`MemoryGraphStore`] so the tests can inspect
//! exactly which named graphs were written.

use crate::{mount_landing_page, mount_turtle, test_config, DATASET_TURTLE};
use signpost_harvest::output::{load_statistics, provenance_file_name};
use signpost_harvest::provenance::{
    final_provenance_graph_name, interim_provenance_graph_name, SourceKind,
};
use signpost_harvest::state::StopReason;
use signpost_harvest::storage::{open_storage, MemoryGraphStore, Storage};
use signpost_harvest::{CrawlEngine, Config, SessionState};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Publisher with one landing page signposting one Turtle description
async fn publisher() -> MockServer {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_landing_page(&server, "/landing", &format!("{}/meta.ttl", base), "describedby").await;
    mount_turtle(&server, "/meta.ttl", DATASET_TURTLE).await;
    server
}

#[tokio::test]
async fn test_full_crawl_follows_signposting() {
    let server = publisher().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(&dir.path().join("exports"));
    config.crawler.max_depth = 2;
    let store = Arc::new(MemoryGraphStore::new());

    let engine = CrawlEngine::new(
        config,
        vec![format!("{}/landing", base)],
        store.clone(),
        "hash".to_string(),
    )
    .expect("Failed to create engine");

    let status = engine.run().await.expect("Crawl failed to start");

    assert_eq!(status.state, SessionState::Finished);
    assert_eq!(status.stop_reason, Some(StopReason::DepthLimit));
    assert_eq!(status.depth, 2);
    assert_eq!(status.progress, 100);
    assert!(status.triples_collected > 0);
    assert!(engine.is_visited(&format!("{}/landing", base)));
    assert!(engine.is_visited(&format!("{}/meta.ttl", base)));

    // The description reached through `describedby` went to a harvest graph;
    // crawling it directly at depth 1 does not store it a second time
    let meta = format!("{}/meta.ttl", base);
    assert!(store.graph(&meta).is_none());
    let names = store.graph_names();
    assert!(names.iter().any(|name| name.contains("/graph/")));
    assert!(names.contains(&final_provenance_graph_name(engine.session_id())));

    let provenance = engine.provenance();
    let sources: Vec<&SourceKind> = provenance.records().iter().map(|r| &r.source).collect();
    assert!(sources.contains(&&SourceKind::Signposting("describedby".to_string())));
    assert!(!sources.contains(&&SourceKind::DirectRdf));
    assert_eq!(provenance.records()[0].resource, meta);
    assert!(provenance.finished_at().is_some());
    assert_eq!(
        provenance.relation_types().get("describedby"),
        Some(&1)
    );

    let export = dir
        .path()
        .join("exports")
        .join(provenance_file_name(engine.session_id()));
    let turtle = std::fs::read_to_string(export).expect("Provenance file missing");
    assert!(turtle.contains("prov:"));
}

#[tokio::test]
async fn test_direct_rdf_seed_is_stored_under_its_url() {
    let server = publisher().await;
    let meta = format!("{}/meta.ttl", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryGraphStore::new());

    let engine = CrawlEngine::new(
        test_config(dir.path()),
        vec![meta.clone()],
        store.clone(),
        String::new(),
    )
    .unwrap();
    let status = engine.run().await.unwrap();

    assert_eq!(status.state, SessionState::Finished);
    assert!(store.graph(&meta).is_some_and(|g| !g.is_empty()));

    let provenance = engine.provenance();
    let record = &provenance.records()[0];
    assert_eq!(record.source, SourceKind::DirectRdf);
    assert_eq!(record.format.as_deref(), Some("turtle"));
    assert_eq!(record.graph.as_deref(), Some(meta.as_str()));
}

#[tokio::test]
async fn test_unreachable_seed_ends_with_empty_frontier() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryGraphStore::new());

    let engine = CrawlEngine::new(
        test_config(dir.path()),
        vec![format!("{}/nothing-here", server.uri())],
        store.clone(),
        String::new(),
    )
    .unwrap();
    let status = engine.run().await.unwrap();

    assert_eq!(status.state, SessionState::Finished);
    assert_eq!(status.stop_reason, Some(StopReason::EmptyFrontier));
    assert_eq!(status.triples_collected, 0);
    assert_eq!(status.resources_visited, 1);
    assert!(engine.provenance().records().is_empty());
    assert_eq!(
        store.graph_names(),
        vec![
            final_provenance_graph_name(engine.session_id()),
            interim_provenance_graph_name(engine.session_id()),
        ]
    );
}

#[tokio::test]
async fn test_cancelled_crawl_is_aborted() {
    let server = publisher().await;
    let dir = tempfile::tempdir().unwrap();

    let engine = CrawlEngine::new(
        test_config(dir.path()),
        vec![format!("{}/landing", server.uri())],
        Arc::new(MemoryGraphStore::new()),
        String::new(),
    )
    .unwrap();
    engine.cancel();
    let status = engine.spawn().await.unwrap().unwrap();

    assert_eq!(status.state, SessionState::Aborted);
    assert_eq!(status.stop_reason, Some(StopReason::Cancelled));
    assert!(!status.active);
    assert_eq!(status.resources_visited, 0);

    // Provenance is exported even for an aborted session
    let export = dir.path().join(provenance_file_name(engine.session_id()));
    assert!(export.exists());
}

#[tokio::test]
async fn test_parallel_round_crawls_every_seed() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_landing_page(&server, "/a", &format!("{}/a.ttl", base), "describedby").await;
    mount_landing_page(&server, "/b", &format!("{}/b.ttl", base), "item").await;
    mount_turtle(&server, "/a.ttl", DATASET_TURTLE).await;
    mount_turtle(&server, "/b.ttl", DATASET_TURTLE).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.crawler.max_depth = 1;
    config.crawler.parallel = true;
    config.crawler.max_workers = 2;

    let engine = CrawlEngine::new(
        config,
        vec![format!("{}/a", base), format!("{}/b", base)],
        Arc::new(MemoryGraphStore::new()),
        String::new(),
    )
    .unwrap();
    let status = engine.run().await.unwrap();

    assert_eq!(status.state, SessionState::Finished);
    assert_eq!(status.stop_reason, Some(StopReason::DepthLimit));
    assert_eq!(status.resources_visited, 2);

    let provenance = engine.provenance();
    assert_eq!(provenance.resources_visited(), 2);
    assert_eq!(provenance.relation_types().get("describedby"), Some(&1));
    assert_eq!(provenance.relation_types().get("item"), Some(&1));

    let mut frontier = engine.frontier();
    frontier.sort();
    assert_eq!(
        frontier,
        vec![format!("{}/a.ttl", base), format!("{}/b.ttl", base)]
    );
}

#[tokio::test]
async fn test_ledger_resume_and_continue() {
    let server = publisher().await;
    let base = server.uri();
    mount_landing_page(&server, "/more", &format!("{}/more.ttl", base), "describedby").await;
    mount_turtle(&server, "/more.ttl", DATASET_TURTLE).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");
    let mut config = test_config(dir.path());
    config.crawler.max_depth = 1;
    config.output.database_path = db_path.display().to_string();
    let store = Arc::new(MemoryGraphStore::new());

    let engine = CrawlEngine::new(
        config.clone(),
        vec![format!("{}/landing", base)],
        store.clone(),
        "hash".to_string(),
    )
    .unwrap()
    .with_ledger(Box::new(open_storage(&db_path).unwrap()))
    .unwrap();
    let first = engine.run().await.unwrap();
    assert_eq!(first.state, SessionState::Finished);
    assert_eq!(first.depth, 1);
    let session_id = engine.session_id().to_string();
    drop(engine);

    let ledger = open_storage(&db_path).unwrap();
    let record = ledger.get_session(&session_id).unwrap();
    assert_eq!(record.state, SessionState::Finished);
    assert_eq!(record.stop_reason.as_deref(), Some("depth_limit"));
    assert_eq!(ledger.load_frontier(&session_id).unwrap(), vec![format!("{}/meta.ttl", base)]);

    let resumed = CrawlEngine::resume(config, Box::new(ledger), &session_id, store.clone()).unwrap();
    assert!(resumed.is_visited(&format!("{}/landing", base)));
    assert_eq!(resumed.provenance().resources_visited(), 1);

    let status = resumed
        .continue_from(&format!("{}/more", base))
        .await
        .unwrap();
    assert_eq!(status.state, SessionState::Finished);
    assert_eq!(status.depth, 2);
    assert!(status.triples_collected > first.triples_collected);
    assert!(resumed.is_visited(&format!("{}/more.ttl", base)));

    let ledger = open_storage(&db_path).unwrap();
    let stats = load_statistics(&ledger, Some(&session_id)).unwrap();
    assert_eq!(stats.session.depth, 2);
    // meta.ttl and more.ttl through their links, plus the format variant
    // of more.ttl that heuristic discovery finds at depth 2
    assert_eq!(stats.resources_ingested, 3);
    assert!(stats.triples_collected > 0);
}

#[tokio::test]
async fn test_interrupted_session_is_recovered_as_aborted() {
    let server = publisher().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");
    let config = test_config(dir.path());

    let engine = CrawlEngine::new(
        config.clone(),
        vec![format!("{}/landing", server.uri())],
        Arc::new(MemoryGraphStore::new()),
        String::new(),
    )
    .unwrap()
    .with_ledger(Box::new(open_storage(&db_path).unwrap()))
    .unwrap();
    let session_id = engine.session_id().to_string();

    // Simulate a process that died mid-crawl
    let mut ledger = open_storage(&db_path).unwrap();
    let mut session = ledger
        .get_session(&session_id)
        .unwrap()
        .into_session((&config.crawler).into());
    session.transition(SessionState::Running).unwrap();
    ledger.update_session(&session).unwrap();
    drop(engine);

    let resumed = CrawlEngine::resume(
        config,
        Box::new(ledger),
        &session_id,
        Arc::new(MemoryGraphStore::new()),
    )
    .unwrap();
    let status = resumed.status();
    assert_eq!(status.state, SessionState::Aborted);
    assert_eq!(status.error.as_deref(), Some("interrupted"));
}

/// Mounts an HTML page without any signposting
async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("HEAD"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "text/html"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

const SHARED_TARGET_TURTLE: &str = r#"
@prefix schema: <http://schema.org/> .
<http://data.example.org/shared> schema:name "Shared description" .
"#;

/// Two landing pages signposting the same target; only one is a repository
async fn shared_target_publisher() -> MockServer {
    let server = MockServer::start().await;
    let target = format!("{}/target", server.uri());
    mount_landing_page(&server, "/plain", &target, "describedby").await;
    mount_landing_page(&server, "/zenodo.org/rec", &target, "describedby").await;
    mount_turtle(&server, "/target", SHARED_TARGET_TURTLE).await;
    server
}

fn shared_target_config(dir: &std::path::Path) -> Config {
    let mut config = test_config(dir);
    config.crawler.max_depth = 1;
    config.crawler.relevance_threshold = 0.8;
    config
}

async fn crawl_shared_target(seeds: &[&str]) -> (String, Vec<(String, SourceKind)>, usize) {
    let server = shared_target_publisher().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryGraphStore::new());

    let engine = CrawlEngine::new(
        shared_target_config(dir.path()),
        seeds.iter().map(|seed| format!("{}{}", base, seed)).collect(),
        store.clone(),
        String::new(),
    )
    .unwrap();
    let status = engine.run().await.unwrap();
    assert_eq!(status.state, SessionState::Finished);

    let records = engine
        .provenance()
        .records()
        .iter()
        .map(|r| (r.resource.clone(), r.source.clone()))
        .collect();
    let harvest_graphs = store
        .graph_names()
        .iter()
        .filter(|name| name.contains("/graph/"))
        .count();
    (format!("{}/target", base), records, harvest_graphs)
}

#[tokio::test]
async fn test_shared_target_ingested_once_in_either_order() {
    // The target scores 0.7 through the plain page and 0.9 through the
    // repository page against a threshold of 0.8
    for seeds in [["/plain", "/zenodo.org/rec"], ["/zenodo.org/rec", "/plain"]] {
        let (target, records, harvest_graphs) = crawl_shared_target(&seeds).await;

        assert_eq!(
            records,
            vec![(target, SourceKind::Signposting("describedby".to_string()))],
            "seed order {:?}",
            seeds
        );
        assert_eq!(harvest_graphs, 1, "seed order {:?}", seeds);
    }
}

#[tokio::test]
async fn test_shared_target_needs_the_repository_boost() {
    let (_, records, harvest_graphs) = crawl_shared_target(&["/plain"]).await;

    assert!(records.is_empty());
    assert_eq!(harvest_graphs, 0);
}

#[tokio::test]
async fn test_rdfa_landing_page_without_signposting() {
    let server = MockServer::start().await;
    let page = format!("{}/dataset-page", server.uri());
    mount_html(
        &server,
        "/dataset-page",
        format!(
            r#"<html><head><title>Ocean temperatures</title></head><body>
            <div vocab="http://schema.org/" typeof="Dataset" resource="{page}">
                <h1 property="name">Ocean temperatures</h1>
                <p property="description">Sea surface temperatures, 1990-2020</p>
                <span property="dc:title">Ocean temperatures</span>
            </div>
            </body></html>"#
        ),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.crawler.max_depth = 1;
    let store = Arc::new(MemoryGraphStore::new());

    let engine = CrawlEngine::new(config, vec![page.clone()], store.clone(), String::new()).unwrap();
    let status = engine.run().await.unwrap();
    assert_eq!(status.state, SessionState::Finished);

    // The page is ingested directly; its `#rdfa` fallback link names the
    // same document and is not stored again
    let provenance = engine.provenance();
    assert_eq!(provenance.records().len(), 1);
    let record = &provenance.records()[0];
    assert_eq!(record.resource, page);
    assert_eq!(record.source, SourceKind::DirectRdf);
    assert_eq!(record.format.as_deref(), Some("rdfa"));
    assert_eq!(record.triple_count, 4);

    let graph = store.graph(&page).expect("Page graph missing");
    assert!(graph
        .iter()
        .any(|t| t.predicate.as_str() == "http://schema.org/name"));
    assert_eq!(engine.discovery_stats().embedded_hits, 1);
}

#[tokio::test]
async fn test_deeply_nested_page_is_crawled() {
    const DEPTH: usize = 20_000;

    let server = MockServer::start().await;
    let page = format!("{}/deep", server.uri());
    let body = format!(
        "<html><body>{}<div itemscope itemtype=\"http://schema.org/Dataset\"><span itemprop=\"name\">Deep</span></div>{}</body></html>",
        "<div>".repeat(DEPTH),
        "</div>".repeat(DEPTH)
    );
    mount_html(&server, "/deep", body).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.crawler.max_depth = 1;
    config.crawler.relevance_threshold = 0.3;
    let store = Arc::new(MemoryGraphStore::new());

    let engine = CrawlEngine::new(config, vec![page.clone()], store.clone(), String::new()).unwrap();
    let status = engine.run().await.unwrap();

    assert_eq!(status.state, SessionState::Finished);
    assert_eq!(status.triples_collected, 2);
    let provenance = engine.provenance();
    assert_eq!(provenance.records().len(), 1);
    assert_eq!(provenance.records()[0].format.as_deref(), Some("microdata"));
    assert!(store.graph(&page).is_some_and(|g| g.len() == 2));
}
