//! HTTP fetcher and RDF parse cascade
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - HEAD probes to check Content-Type at a short deadline
//! - GET requests to fetch resource bodies
//! - Turning a fetched body into a triple set, trying formats in priority order
//! - Extracting structured data embedded in HTML when no format parses

use crate::config::HttpConfig;
use crate::rdf::{
    extract_jsonld_scripts, extract_microdata, extract_rdfa, has_rdf_extension,
    is_html_media_type, is_rdf_media_type, is_xml_or_html_media_type, parse, FormatUsed,
    RdfSerialization, FALLBACK_ORDER, RDF_ACCEPT,
};
use oxrdf::Graph;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fragment markers the fallback prober attaches to a page URL
pub const JSONLD_MARKER: &str = "#jsonld";
pub const RDFA_MARKER: &str = "#rdfa";
pub const MICRODATA_MARKER: &str = "#microdata";

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use signpost_harvest::config::HttpConfig;
/// use signpost_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent())
        .timeout(config.fetch_timeout())
        .connect_timeout(config.probe_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Whether a fetch-and-parse attempt produced a triple set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Some format accepted the content; the triple set may still be empty
    Parsed,

    /// Nothing could be parsed
    Failed(String),
}

/// Result of a fetch-and-parse attempt
#[derive(Debug, Clone)]
pub struct ParsedResource {
    pub triples: Graph,
    pub outcome: ParseOutcome,
    pub format: Option<FormatUsed>,
    pub content_type: Option<String>,
}

impl ParsedResource {
    fn parsed(triples: Graph, format: FormatUsed, content_type: Option<String>) -> Self {
        Self {
            triples,
            outcome: ParseOutcome::Parsed,
            format: Some(format),
            content_type,
        }
    }

    fn failed(reason: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            triples: Graph::new(),
            outcome: ParseOutcome::Failed(reason.into()),
            format: None,
            content_type,
        }
    }

    pub fn triple_count(&self) -> usize {
        self.triples.len()
    }

    pub fn has_triples(&self) -> bool {
        !self.triples.is_empty()
    }

    /// Failure reason, if nothing could be parsed
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ParseOutcome::Parsed => None,
            ParseOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// A fetched body with its declared content type
struct FetchedBody {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl FetchedBody {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    fn looks_like_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(false, is_html_media_type)
            || self.text().to_lowercase().contains("<html")
    }
}

/// Orders the formats to try for one body
///
/// Extension hint first, then the declared content type, then the fixed
/// fallback list; each format appears once.
pub fn format_attempts(url: &str, content_type: Option<&str>) -> Vec<RdfSerialization> {
    let mut attempts = Vec::with_capacity(FALLBACK_ORDER.len());
    let hinted = RdfSerialization::from_extension(url);
    let declared = content_type.and_then(RdfSerialization::from_media_type);

    for format in hinted.into_iter().chain(declared).chain(FALLBACK_ORDER) {
        if !attempts.contains(&format) {
            attempts.push(format);
        }
    }
    attempts
}

/// Fetches resources and parses them into triple sets
///
/// Never fails past its boundary: network and parse errors become a
/// [`ParseOutcome::Failed`] with an empty triple set.
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    client: Client,
    probe_timeout: Duration,
    fetch_timeout: Duration,
}

impl ResourceFetcher {
    pub fn new(client: Client, config: &HttpConfig) -> Self {
        Self {
            client,
            probe_timeout: config.probe_timeout(),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// HEAD request asking for RDF; returns the response Content-Type
    ///
    /// `None` on network errors or when the header is missing.
    pub async fn probe_content_type(&self, url: &str) -> Option<String> {
        self.probe(url).await.and_then(|(_, content_type)| content_type)
    }

    /// HEAD request asking for RDF; returns status and Content-Type
    pub async fn probe(&self, url: &str) -> Option<(u16, Option<String>)> {
        let response = self.head(url, RDF_ACCEPT).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Some((response.status().as_u16(), content_type))
    }

    /// HEAD request with the given `Accept` value and the short HEAD deadline
    pub async fn head(&self, url: &str, accept: &str) -> Option<Response> {
        match self
            .client
            .head(url)
            .header(ACCEPT, accept)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                debug!("HEAD probe failed for {}: {}", url, e);
                None
            }
        }
    }

    /// GET request returning the page text, for link and marker scanning
    pub async fn fetch_text(&self, url: &str) -> Result<String, reqwest::Error> {
        let body = self.fetch_body(url).await?;
        Ok(body.text())
    }

    async fn fetch_body(&self, url: &str) -> Result<FetchedBody, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, RDF_ACCEPT)
            .timeout(self.fetch_timeout)
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        debug!(
            "Fetched {} ({} bytes, Content-Type: {})",
            url,
            bytes.len(),
            content_type.as_deref().unwrap_or("none")
        );
        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }

    /// Fetches `url` and parses it into a triple set
    ///
    /// # Request Flow
    ///
    /// 1. URLs carrying an embedded-data marker go straight to the matching extractor
    /// 2. Without an RDF extension, a HEAD probe whose Content-Type is neither
    ///    RDF nor XML/HTML skips the resource
    /// 3. The body is fetched once and tried against [`format_attempts`];
    ///    bodies declared as HTML skip this step
    /// 4. HTML bodies fall back to JSON-LD scripts, RDFa, then microdata
    pub async fn fetch_and_parse(&self, url: &str) -> ParsedResource {
        if let Some(page) = url.strip_suffix(JSONLD_MARKER) {
            return self.parse_embedded(page, Embedded::JsonLd).await;
        }
        if let Some(page) = url.strip_suffix(RDFA_MARKER) {
            return self.parse_embedded(page, Embedded::Rdfa).await;
        }
        if let Some(page) = url.strip_suffix(MICRODATA_MARKER) {
            return self.parse_embedded(page, Embedded::Microdata).await;
        }

        if !has_rdf_extension(url) {
            if let Some(content_type) = self.probe_content_type(url).await {
                if !content_type.trim().is_empty()
                    && !is_rdf_media_type(&content_type)
                    && !is_xml_or_html_media_type(&content_type)
                {
                    info!(
                        "Skipping non-RDF resource {} based on Content-Type: {}",
                        url, content_type
                    );
                    return ParsedResource::failed("Non-RDF content type", Some(content_type));
                }
            }
        }

        let body = match self.fetch_body(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Error fetching content from {}: {}", url, e);
                return ParsedResource::failed(format!("Error fetching content from {}: {}", url, e), None);
            }
        };

        let declared_html = body
            .content_type
            .as_deref()
            .map_or(false, is_html_media_type);

        if !declared_html {
            for format in format_attempts(url, body.content_type.as_deref()) {
                match parse(&body.bytes, format, url) {
                    Ok(triples) => {
                        info!(
                            "Parsed {} triples from {} with format {}",
                            triples.len(),
                            url,
                            format
                        );
                        return ParsedResource::parsed(
                            triples,
                            FormatUsed::Serialization(format),
                            body.content_type,
                        );
                    }
                    Err(e) => debug!("Parsing {} as {} failed: {}", url, format, e),
                }
            }
        }

        if body.looks_like_html() {
            let html = body.text();
            if let Some(parsed) = parse_html_fallback(&html, url) {
                return parsed;
            }
        }

        warn!("Failed to parse {} with any known RDF format", url);
        ParsedResource::failed(
            "Failed to parse content with any known RDF format",
            body.content_type,
        )
    }

    async fn parse_embedded(&self, page: &str, kind: Embedded) -> ParsedResource {
        info!("Processing embedded {} from {}", kind.label(), page);
        let html = match self.fetch_text(page).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Error fetching {}: {}", page, e);
                return ParsedResource::failed(format!("Error fetching {}: {}", page, e), None);
            }
        };
        parse_embedded_html(&html, page, kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Embedded {
    JsonLd,
    Rdfa,
    Microdata,
}

impl Embedded {
    fn label(&self) -> &'static str {
        match self {
            Self::JsonLd => "JSON-LD",
            Self::Rdfa => "RDFa",
            Self::Microdata => "microdata",
        }
    }
}

fn parse_embedded_html(html: &str, page: &str, kind: Embedded) -> ParsedResource {
    let html_type = Some("text/html".to_string());
    match kind {
        Embedded::JsonLd => {
            let extraction = extract_jsonld_scripts(html, page);
            if extraction.scripts == 0 {
                return ParsedResource::failed(format!("No JSON-LD scripts found in {}", page), None);
            }
            if extraction.graph.is_empty() && !extraction.errors.is_empty() {
                return ParsedResource::failed(extraction.errors.join("; "), None);
            }
            ParsedResource::parsed(
                extraction.graph,
                FormatUsed::Serialization(RdfSerialization::JsonLd),
                Some("application/ld+json".to_string()),
            )
        }
        Embedded::Rdfa => match extract_rdfa(html, page) {
            Ok(graph) => ParsedResource::parsed(graph, FormatUsed::Rdfa, html_type),
            Err(e) => ParsedResource::failed(format!("Error parsing RDFa from {}: {}", page, e), None),
        },
        Embedded::Microdata => match extract_microdata(html, page) {
            Ok(graph) => ParsedResource::parsed(graph, FormatUsed::Microdata, html_type),
            Err(e) => {
                ParsedResource::failed(format!("Error parsing microdata from {}: {}", page, e), None)
            }
        },
    }
}

/// Last-resort extraction from an HTML body; first non-empty result wins
fn parse_html_fallback(html: &str, url: &str) -> Option<ParsedResource> {
    for kind in [Embedded::JsonLd, Embedded::Rdfa, Embedded::Microdata] {
        let parsed = parse_embedded_html(html, url, kind);
        if parsed.has_triples() {
            info!(
                "Extracted {} triples from {} as embedded {}",
                parsed.triple_count(),
                url,
                kind.label()
            );
            return Some(parsed);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_format_attempts_order() {
        let attempts = format_attempts("http://a.org/data.rdf", Some("text/turtle; charset=utf-8"));
        assert_eq!(attempts[0], RdfSerialization::RdfXml);
        assert_eq!(attempts[1], RdfSerialization::Turtle);
        assert_eq!(attempts[2], RdfSerialization::JsonLd);
        assert_eq!(attempts.len(), FALLBACK_ORDER.len());
    }

    #[test]
    fn test_format_attempts_without_hints() {
        let attempts = format_attempts("http://a.org/record", None);
        assert_eq!(attempts, FALLBACK_ORDER.to_vec());
    }

    #[test]
    fn test_embedded_jsonld_without_scripts() {
        let parsed = parse_embedded_html("<html><body></body></html>", "http://a.org/", Embedded::JsonLd);
        assert!(!parsed.has_triples());
        assert!(parsed.error().unwrap().contains("No JSON-LD scripts"));
    }

    #[test]
    fn test_html_fallback_prefers_jsonld() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@id": "http://a.org/ds", "http://schema.org/name": "Dataset"}
            </script></head>
            <body vocab="http://schema.org/" typeof="Dataset"><span property="name">RDFa</span></body></html>"#;
        let parsed = parse_html_fallback(html, "http://a.org/page").unwrap();
        assert_eq!(
            parsed.format,
            Some(FormatUsed::Serialization(RdfSerialization::JsonLd))
        );
        assert_eq!(parsed.outcome, ParseOutcome::Parsed);
    }

    #[test]
    fn test_html_fallback_without_data() {
        assert!(parse_html_fallback("<html><body><p>nothing</p></body></html>", "http://a.org/").is_none());
    }

    #[test]
    fn test_failed_resource_contract() {
        let failed = ParsedResource::failed("boom", None);
        assert_eq!(failed.triple_count(), 0);
        assert_eq!(failed.error(), Some("boom"));
        assert!(failed.format.is_none());
    }
}
