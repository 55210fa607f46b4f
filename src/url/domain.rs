use url::Url;

/// Host fragments of data repositories and identifier services
///
/// Matched as lowercase substrings of the full URL.
pub const REPOSITORY_MARKERS: &[&str] = &[
    "zenodo.org",
    "figshare.com",
    "datadryad.org",
    "dataverse",
    "ands.org.au",
    "doi.org",
    "datacite.org",
    "pangaea.de",
    "ncbi.nlm.nih.gov",
    "orcid.org",
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "sourceforge.net",
];

/// Extracts the domain from a URL
///
/// The domain is the lowercase host followed by `:port` when the URL carries
/// a non-default port, so two services on one host count as two domains.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use signpost_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.org/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.org".to_string()));
///
/// let url = Url::parse("http://localhost:3030/ds").unwrap();
/// assert_eq!(extract_domain(&url), Some("localhost:3030".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Parses `url` and extracts its domain; unparsable input has none
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}

/// Returns true when the URL points into a known data repository
pub fn is_repository_url(url: &str) -> bool {
    let lowered = url.to_lowercase();
    REPOSITORY_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.org/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.org".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://data.example.org/record/1").unwrap();
        assert_eq!(extract_domain(&url), Some("data.example.org".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.org:8443/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.org:8443".to_string()));
    }

    #[test]
    fn test_default_port_omitted() {
        let url = Url::parse("https://example.org:443/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.org".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.ORG/Page?q=1#frag").unwrap();
        assert_eq!(extract_domain(&url), Some("example.org".to_string()));
    }

    #[test]
    fn test_domain_of_invalid() {
        assert_eq!(domain_of("not a url"), None);
        assert_eq!(domain_of("http://a.org/x"), Some("a.org".to_string()));
    }

    #[test]
    fn test_repository_urls() {
        assert!(is_repository_url("https://zenodo.org/records/123"));
        assert!(is_repository_url("https://doi.org/10.5281/zenodo.1"));
        assert!(is_repository_url("https://demo.Dataverse.org/dataset"));
        assert!(is_repository_url("https://GitHub.com/org/repo"));
        assert!(!is_repository_url("https://example.org/data"));
    }
}
