//! Typed-link extraction from `Link` headers and HTML markup
//!
//! Both extractors return `(relation, target)` pairs in document order and
//! leave targets exactly as written; resolving them against the page URL is
//! the caller's job.

use crate::rdf::looks_like_rdf_content_type;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"<([^>]*)>\s*;\s*rel=(?:"([^"]*)"|([^,;\s]*))"#).ok())
        .as_ref()
}

/// Parses an HTTP `Link` header value
///
/// Both quoted (`rel="describedby"`) and bare (`rel=describedby`) relation
/// tokens are accepted. A quoted value listing several relations yields one
/// pair per relation.
///
/// # Example
///
/// ```
/// use signpost_harvest::crawler::parse_link_header;
///
/// let links = parse_link_header(r#"<http://example.org/data>; rel="describedby""#);
/// assert_eq!(links, vec![("describedby".to_string(), "http://example.org/data".to_string())]);
/// ```
pub fn parse_link_header(value: &str) -> Vec<(String, String)> {
    let mut links = Vec::new();
    let Some(pattern) = link_pattern() else {
        return links;
    };

    for captures in pattern.captures_iter(value) {
        let target = captures.get(1).map_or("", |m| m.as_str()).trim();
        let relations = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map_or("", |m| m.as_str());

        for relation in relations.split_whitespace() {
            links.push((relation.to_string(), target.to_string()));
        }
    }

    links
}

/// Typed links found in an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlLinks {
    /// `<link rel href>` and `<a rel href>` pairs, first relation token only
    pub links: Vec<(String, String)>,

    /// `alternate` links whose declared type names an RDF serialization
    pub rdf_alternates: Vec<String>,
}

impl HtmlLinks {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.rdf_alternates.is_empty()
    }
}

/// Extracts typed links from an HTML page
///
/// **Include:**
/// - `<link rel="..." href="...">`
/// - `<a rel="..." href="...">`
/// - `<link rel="alternate" type="..." href="...">` when the type is RDF-like
///
/// Elements whose `rel` or `href` is empty are skipped.
pub fn extract_html_links(html: &str) -> HtmlLinks {
    let document = Html::parse_document(html);
    let mut found = HtmlLinks::default();

    for selector in ["link[rel][href]", "a[rel][href]"] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let element = element.value();
            let (Some(rel), Some(href)) = (element.attr("rel"), element.attr("href")) else {
                continue;
            };
            let (Some(relation), href) = (rel.split_whitespace().next(), href.trim()) else {
                continue;
            };
            if href.is_empty() {
                continue;
            }
            found
                .links
                .push((relation.to_lowercase(), href.to_string()));
        }
    }

    if let Ok(selector) = Selector::parse(r#"link[rel~="alternate"][type][href]"#) {
        for element in document.select(&selector) {
            let element = element.value();
            let is_rdf = element
                .attr("type")
                .map_or(false, looks_like_rdf_content_type);
            match element.attr("href").map(str::trim) {
                Some(href) if is_rdf && !href.is_empty() => {
                    found.rdf_alternates.push(href.to_string());
                }
                _ => {}
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(rel: &str, target: &str) -> (String, String) {
        (rel.to_string(), target.to_string())
    }

    #[test]
    fn test_quoted_relation() {
        let links = parse_link_header(r#"<http://example.org/data>; rel="describedby""#);
        assert_eq!(links, vec![pair("describedby", "http://example.org/data")]);
    }

    #[test]
    fn test_bare_relation() {
        let links = parse_link_header("<https://doi.org/10.1234/x>; rel=cite-as");
        assert_eq!(links, vec![pair("cite-as", "https://doi.org/10.1234/x")]);
    }

    #[test]
    fn test_multiple_links_and_params() {
        let header = r#"<http://a.org/meta.ttl>; rel="describedby"; type="text/turtle", <http://a.org/LICENSE>; rel=license, <http://orcid.org/0000>; rel="author""#;
        let links = parse_link_header(header);
        assert_eq!(
            links,
            vec![
                pair("describedby", "http://a.org/meta.ttl"),
                pair("license", "http://a.org/LICENSE"),
                pair("author", "http://orcid.org/0000"),
            ]
        );
    }

    #[test]
    fn test_space_separated_relations() {
        let links = parse_link_header(r#"<http://a.org/x>; rel="item describedby""#);
        assert_eq!(
            links,
            vec![pair("item", "http://a.org/x"), pair("describedby", "http://a.org/x")]
        );
    }

    #[test]
    fn test_header_without_rel() {
        assert!(parse_link_header(r#"<http://a.org/x>; type="text/html""#).is_empty());
        assert!(parse_link_header("").is_empty());
    }

    #[test]
    fn test_html_links() {
        let html = r#"
            <html><head>
                <link rel="describedby" href="/meta.jsonld" type="application/ld+json">
                <link rel="stylesheet" href="/style.css">
                <link rel="alternate" type="text/turtle" href="data.ttl">
            </head><body>
                <a rel="cite-as" href="https://doi.org/10.1/abc">DOI</a>
                <a href="/plain">no rel</a>
                <a rel="license" href="">empty</a>
            </body></html>
        "#;
        let found = extract_html_links(html);

        assert_eq!(
            found.links,
            vec![
                pair("describedby", "/meta.jsonld"),
                pair("stylesheet", "/style.css"),
                pair("alternate", "data.ttl"),
                pair("cite-as", "https://doi.org/10.1/abc"),
            ]
        );
        assert_eq!(found.rdf_alternates, vec!["data.ttl".to_string()]);
    }

    #[test]
    fn test_html_alternate_not_rdf() {
        let html = r#"<link rel="alternate" type="application/rss+xml" href="/feed">"#;
        let found = extract_html_links(html);
        assert!(found.rdf_alternates.is_empty());
        assert_eq!(found.links.len(), 1);
    }

    #[test]
    fn test_page_without_links() {
        assert!(extract_html_links("<html><body><p>hi</p></body></html>").is_empty());
    }
}
