//! Integration tests for Signpost-Harvest
//!
//! These tests use wiremock to stand in for publishers and for the SPARQL
//! endpoint, and drive discovery, storage and whole crawl sessions
//! end-to-end.

mod crawl_tests;
mod discovery_tests;
mod store_tests;

use signpost_harvest::config::Config;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A small, well-described dataset description
pub const DATASET_TURTLE: &str = r#"
@prefix schema: <http://schema.org/> .
@prefix dcterms: <http://purl.org/dc/terms/> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .
@prefix dcat: <http://www.w3.org/ns/dcat#> .

<http://data.example.org/dataset/1> a dcat:Dataset, schema:Dataset ;
    schema:name "Ocean temperatures" ;
    schema:description "Sea surface temperatures, 1990-2020" ;
    dcterms:title "Ocean temperatures" ;
    schema:creator <http://data.example.org/person/7> .

<http://data.example.org/person/7> a foaf:Person ;
    foaf:name "A. Researcher" .
"#;

/// Test configuration writing exports into `export_dir`
pub fn test_config(export_dir: &Path) -> Config {
    let mut config = Config::default();
    config.output.export_dir = export_dir.display().to_string();
    config.store.retry_delay_ms = 0;
    config.store.max_retries = 1;
    config.http.probe_timeout_secs = 2;
    config.http.fetch_timeout_secs = 5;
    config
}

/// Mounts a landing page advertising `target` through a `Link` header
pub async fn mount_landing_page(server: &MockServer, landing: &str, target: &str, rel: &str) {
    Mock::given(method("HEAD"))
        .and(path(landing))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .insert_header("Link", format!("<{}>; rel=\"{}\"", target, rel).as_str()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(landing))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("<html><head><title>Dataset</title></head><body>Dataset</body></html>"),
        )
        .mount(server)
        .await;
}

/// Mounts a Turtle document answering both HEAD and GET
pub async fn mount_turtle(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("HEAD"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "text/turtle"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/turtle")
                .set_body_raw(body.as_bytes().to_vec(), "text/turtle"),
        )
        .mount(server)
        .await;
}
