//! Signposting discovery
//!
//! Typed links are looked for in three stages, each tried only when the
//! previous one found nothing:
//!
//! 1. `Link` headers of a HEAD response
//! 2. `<link rel>` / `<a rel>` markup of the page body
//! 3. Fallback: heuristic URL probing, then a scan for embedded structured data
//!
//! Network errors at any stage count as "nothing found" and the next stage
//! runs; discovery itself never fails.

use super::fetcher::{ResourceFetcher, JSONLD_MARKER, MICRODATA_MARKER, RDFA_MARKER};
use super::heuristic::HeuristicProber;
use super::parser::{extract_html_links, parse_link_header};
use crate::provenance::SourceKind;
use crate::rdf::{EmbeddedMarkers, RDF_ACCEPT};
use crate::url::resolve_reference;
use reqwest::header::{ACCEPT, LINK};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Relation types in the signposting vocabulary
pub mod relation {
    pub const DESCRIBEDBY: &str = "describedby";
    pub const DESCRIBES: &str = "describes";
    pub const ITEM: &str = "item";
    pub const COLLECTION: &str = "collection";
    pub const CITE_AS: &str = "cite-as";
    pub const AUTHOR: &str = "author";
    pub const LICENSE: &str = "license";
    pub const TYPE: &str = "type";
    pub const PROFILE: &str = "profile";
    pub const ALTERNATE: &str = "alternate";
}

/// Relations worth following even when their target holds no triples
pub const PRIORITY_RELATIONS: &[&str] = &[
    relation::DESCRIBEDBY,
    relation::DESCRIBES,
    relation::ITEM,
    relation::COLLECTION,
    relation::CITE_AS,
    relation::AUTHOR,
    relation::LICENSE,
    relation::TYPE,
    relation::PROFILE,
    relation::ALTERNATE,
];

pub fn is_priority_relation(relation: &str) -> bool {
    PRIORITY_RELATIONS.contains(&relation)
}

/// Which stage produced a link set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPath {
    Header,
    Html,
    Heuristic,
    Embedded,
    Nothing,
}

impl DiscoveryPath {
    /// Links found on a fallback path are not published signposting
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Heuristic | Self::Embedded)
    }
}

/// Relation → target map produced by discovery
///
/// Each relation keeps one target; a later insert for the same relation
/// replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSet {
    links: BTreeMap<String, String>,
    path: DiscoveryPath,
}

impl LinkSet {
    pub fn empty() -> Self {
        Self {
            links: BTreeMap::new(),
            path: DiscoveryPath::Nothing,
        }
    }

    fn with_path(path: DiscoveryPath) -> Self {
        Self {
            links: BTreeMap::new(),
            path,
        }
    }

    pub fn insert(&mut self, relation: impl Into<String>, target: impl Into<String>) {
        self.links.insert(relation.into(), target.into());
    }

    pub fn get(&self, relation: &str) -> Option<&str> {
        self.links.get(relation).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn path(&self) -> DiscoveryPath {
        self.path
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.links.iter()
    }

    pub fn relations(&self) -> Vec<String> {
        self.links.keys().cloned().collect()
    }

    /// Provenance source kind for a link reached through `relation`
    pub fn source_kind(&self, relation: &str) -> SourceKind {
        if self.path.is_fallback() {
            SourceKind::Fallback(relation.to_string())
        } else {
            SourceKind::Signposting(relation.to_string())
        }
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.links
    }
}

impl Default for LinkSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Discovery counters shared by every resolver of a session
#[derive(Debug, Default)]
pub struct DiscoveryStats {
    signposting_found: AtomicU64,
    fallback_used: AtomicU64,
    heuristic_hits: AtomicU64,
    embedded_hits: AtomicU64,
}

/// Point-in-time copy of [`DiscoveryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryCounts {
    pub signposting_found: u64,
    pub fallback_used: u64,
    pub heuristic_hits: u64,
    pub embedded_hits: u64,
}

impl DiscoveryStats {
    pub fn snapshot(&self) -> DiscoveryCounts {
        DiscoveryCounts {
            signposting_found: self.signposting_found.load(Ordering::Relaxed),
            fallback_used: self.fallback_used.load(Ordering::Relaxed),
            heuristic_hits: self.heuristic_hits.load(Ordering::Relaxed),
            embedded_hits: self.embedded_hits.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Finds typed links from a resource to related resources
#[derive(Debug, Clone)]
pub struct SignpostingResolver {
    fetcher: ResourceFetcher,
    prober: HeuristicProber,
    stats: Arc<DiscoveryStats>,
}

impl SignpostingResolver {
    pub fn new(fetcher: ResourceFetcher) -> Self {
        Self {
            prober: HeuristicProber::new(fetcher.clone()),
            fetcher,
            stats: Arc::new(DiscoveryStats::default()),
        }
    }

    pub fn stats(&self) -> DiscoveryCounts {
        self.stats.snapshot()
    }

    /// Discovers typed links published for `url`
    ///
    /// The fallback stage runs only when neither headers nor markup yielded
    /// a relation. An empty set means every stage came up empty.
    pub async fn discover_links(&self, url: &str) -> LinkSet {
        let links = self.header_links(url).await;
        if !links.is_empty() {
            return links;
        }

        let links = self.html_links(url).await;
        if !links.is_empty() {
            return links;
        }

        info!("No signposting found at {}, trying fallback discovery", url);
        let links = self.fallback_links(url).await;
        if !links.is_empty() {
            DiscoveryStats::bump(&self.stats.fallback_used);
        }
        links
    }

    async fn header_links(&self, url: &str) -> LinkSet {
        let mut links = LinkSet::with_path(DiscoveryPath::Header);

        let response = match self
            .fetcher
            .client()
            .head(url)
            .header(ACCEPT, RDF_ACCEPT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Error fetching signposting headers from {}: {}", url, e);
                return links;
            }
        };

        for value in response.headers().get_all(LINK) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for (relation, target) in parse_link_header(value) {
                info!("Found signposting in header: {} -> {}", relation, target);
                links.insert(relation, target);
            }
        }

        if !links.is_empty() {
            DiscoveryStats::bump(&self.stats.signposting_found);
        }
        links
    }

    async fn html_links(&self, url: &str) -> LinkSet {
        let mut links = LinkSet::with_path(DiscoveryPath::Html);

        let html = match self.fetcher.fetch_text(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Error fetching HTML from {}: {}", url, e);
                return links;
            }
        };

        let found = extract_html_links(&html);
        for (relation, target) in found.links {
            debug!("Found signposting in HTML: {} -> {}", relation, target);
            links.insert(relation, target);
        }
        for target in found.rdf_alternates {
            info!("Found alternate link to RDF: {}", target);
            links.insert(relation::ALTERNATE, target);
        }

        if !links.is_empty() {
            DiscoveryStats::bump(&self.stats.signposting_found);
        }
        links
    }

    async fn fallback_links(&self, url: &str) -> LinkSet {
        if let Some(candidate) = self.prober.probe(url).await {
            DiscoveryStats::bump(&self.stats.heuristic_hits);
            let mut links = LinkSet::with_path(DiscoveryPath::Heuristic);
            links.insert(relation::ALTERNATE, candidate);
            return links;
        }

        let html = match self.fetcher.fetch_text(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Error scraping HTML from {}: {}", url, e);
                return LinkSet::empty();
            }
        };

        let links = embedded_links(url, &EmbeddedMarkers::scan(&html));
        if !links.is_empty() {
            DiscoveryStats::bump(&self.stats.embedded_hits);
        }
        links
    }
}

/// Links pointing at embedded structured data found on a page
///
/// Microdata takes precedence over RDFa, which takes precedence over
/// JSON-LD; an RDF `alternate` link is recorded alongside.
pub fn embedded_links(url: &str, markers: &EmbeddedMarkers) -> LinkSet {
    let mut links = LinkSet::with_path(DiscoveryPath::Embedded);
    let page = url.split('#').next().unwrap_or(url);

    let marker = if markers.microdata {
        Some(MICRODATA_MARKER)
    } else if markers.rdfa {
        Some(RDFA_MARKER)
    } else if markers.jsonld {
        Some(JSONLD_MARKER)
    } else {
        None
    };
    if let Some(marker) = marker {
        info!("Found embedded structured data ({}) in {}", marker, page);
        links.insert(relation::DESCRIBEDBY, format!("{}{}", page, marker));
    }

    if let Some(href) = &markers.rdf_alternate {
        match resolve_reference(href, page) {
            Ok(target) => {
                info!("Found alternate link to RDF: {}", target);
                links.insert(relation::ALTERNATE, target);
            }
            Err(e) => debug!("Ignoring alternate link {}: {}", href, e),
        }
    }

    if links.is_empty() {
        LinkSet::empty()
    } else {
        links
    }
}
