//! Heuristic discovery for sources that publish no signposting
//!
//! Synthesizes URL variants where linked data commonly lives and probes
//! them with HEAD requests until one answers with an RDF content type.

use super::fetcher::ResourceFetcher;
use crate::rdf::looks_like_rdf_content_type;
use tracing::{debug, info};
use url::Url;

/// Extensions appended to the URL as given
const APPENDED_EXTENSIONS: &[&str] = &[".rdf", ".ttl", ".jsonld", ".n3", ".nt"];

/// Sub-paths tried under the URL and under its parent
const COMMON_PATHS: &[&str] = &[
    "/data",
    "/metadata",
    "/rdf",
    "/sparql",
    "/void",
    "/lod",
    "/linked-data",
    "/about",
    "/.well-known/void",
];

/// Extensions substituted for the path's own extension
const SUBSTITUTED_EXTENSIONS: &[&str] = &[
    ".rdf", ".ttl", ".n3", ".nt", ".jsonld", ".json-ld", ".nq", ".trig", ".trix",
];

/// Values tried for a `format` query parameter
const FORMAT_PARAMETERS: &[&str] = &["rdf", "turtle", "n3", "json-ld", "ntriples", "xml"];

/// Candidate URLs for heuristic probing, in probe order
///
/// Duplicates and the original URL are removed.
///
/// # Example
///
/// ```
/// use signpost_harvest::crawler::candidate_urls;
///
/// let candidates = candidate_urls("http://example.org/records/42");
/// assert_eq!(candidates[0], "http://example.org/records/42.rdf");
/// assert!(candidates.contains(&"http://example.org/records/data".to_string()));
/// assert!(candidates.contains(&"http://example.org/records/42?format=turtle".to_string()));
/// ```
pub fn candidate_urls(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };
    let origin = parsed.origin().ascii_serialization();
    let path = parsed.path();
    let trimmed = url.trim_end_matches('/');

    let mut variants: Vec<String> = Vec::new();

    for ext in APPENDED_EXTENSIONS {
        variants.push(format!("{}{}", trimmed, ext));
    }

    for sub_path in COMMON_PATHS {
        variants.push(format!("{}{}", trimmed, sub_path));
        if !path.is_empty() && path != "/" {
            let parent = path.rsplit_once('/').map_or("", |(parent, _)| parent);
            variants.push(format!("{}{}{}", origin, parent, sub_path));
        }
    }

    let stem_path = path.trim_end_matches('/');
    let stem = match stem_path.rsplit_once('/') {
        Some((dir, last)) => match last.rsplit_once('.') {
            Some((name, _)) if !name.is_empty() => format!("{}/{}", dir, name),
            _ => stem_path.to_string(),
        },
        None => stem_path.to_string(),
    };
    for ext in SUBSTITUTED_EXTENSIONS {
        variants.push(format!("{}{}{}", origin, stem, ext));
    }

    let separator = if parsed.query().is_some() { '&' } else { '?' };
    for value in FORMAT_PARAMETERS {
        variants.push(format!("{}{}format={}", url, separator, value));
    }

    let mut unique: Vec<String> = Vec::with_capacity(variants.len());
    for variant in variants {
        if variant != url && !unique.contains(&variant) {
            unique.push(variant);
        }
    }
    unique
}

/// Probes synthesized URL variants for an RDF representation
#[derive(Debug, Clone)]
pub struct HeuristicProber {
    fetcher: ResourceFetcher,
}

impl HeuristicProber {
    pub fn new(fetcher: ResourceFetcher) -> Self {
        Self { fetcher }
    }

    /// Returns the first variant answering 200 with an RDF content type
    pub async fn probe(&self, url: &str) -> Option<String> {
        let candidates = candidate_urls(url);
        debug!("Generated {} path variations for {}", candidates.len(), url);

        for candidate in candidates {
            let Some((status, content_type)) = self.fetcher.probe(&candidate).await else {
                continue;
            };
            let content_type = content_type.unwrap_or_default();
            if status == 200 && looks_like_rdf_content_type(&content_type) {
                info!(
                    "Found potential RDF resource at {} with Content-Type: {}",
                    candidate, content_type
                );
                return Some(candidate);
            }
        }
        None
    }
}
