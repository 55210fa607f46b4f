//! Crawler module for signposting discovery and harvesting
//!
//! This module contains the core harvesting logic, including:
//! - Typed-link extraction from `Link` headers and HTML markup
//! - Signposting discovery with heuristic and embedded-data fallbacks
//! - Fetching and parsing resources across RDF serializations
//! - Relevance scoring and domain-diverse frontier selection
//! - FAIR self-assessment of single resources
//! - The depth-by-depth crawl engine

mod engine;
mod fair;
mod fetcher;
mod frontier;
mod heuristic;
mod parser;
mod scorer;
mod seed_check;
pub mod signposting;

pub use engine::{CrawlEngine, CrawlStatus};
pub use fair::{assess_fair, DescriptionSource, FairAssessment, FairCategory, CATEGORY_MAX};
pub use fetcher::{
    build_http_client, format_attempts, ParseOutcome, ParsedResource, ResourceFetcher,
    JSONLD_MARKER, MICRODATA_MARKER, RDFA_MARKER,
};
pub use frontier::{select_frontier, FrontierSelection};
pub use heuristic::{candidate_urls, HeuristicProber};
pub use parser::{extract_html_links, parse_link_header, HtmlLinks};
pub use scorer::{assess, RelevanceScorer, FALLBACK_SCORE};
pub use seed_check::{check_seed, Recommendation, SeedReport};
pub use signposting::{
    DiscoveryCounts, DiscoveryPath, LinkSet, SignpostingResolver, PRIORITY_RELATIONS,
};

use crate::config::HttpConfig;
use crate::Result;

/// Builds a fetcher and resolver sharing one HTTP client
///
/// Convenience for one-off checks outside a crawl session.
pub fn discovery_tools(config: &HttpConfig) -> Result<(ResourceFetcher, SignpostingResolver)> {
    let client = build_http_client(config)?;
    let fetcher = ResourceFetcher::new(client, config);
    let resolver = SignpostingResolver::new(fetcher.clone());
    Ok((fetcher, resolver))
}
