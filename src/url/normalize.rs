use crate::UrlError;
use url::Url;

/// Reference schemes that never lead to a fetchable resource
const UNFOLLOWABLE_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a URL for use as a crawl identity
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Default the scheme to `http://` when none is given
/// 3. Percent-decode the whole string
/// 4. Parse; reject non-HTTP(S) schemes and host-less URLs
/// 5. Re-serialize through the URL parser so equivalent spellings collapse
///
/// # Examples
///
/// ```
/// use signpost_harvest::url::normalize_url;
///
/// let url = normalize_url("example.org/data%2Ettl").unwrap();
/// assert_eq!(url, "http://example.org/data.ttl");
/// ```
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    // Step 1
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    // Step 2
    let with_scheme = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else if trimmed.contains("://") {
        let scheme = trimmed.split("://").next().unwrap_or_default();
        return Err(UrlError::InvalidScheme(scheme.to_string()));
    } else {
        format!("http://{}", trimmed)
    };

    // Step 3: invalid UTF-8 after decoding keeps the original spelling
    let decoded = urlencoding::decode(&with_scheme)
        .map(|cow| cow.into_owned())
        .unwrap_or(with_scheme);

    // Step 4
    let url = Url::parse(&decoded).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    // Step 5
    Ok(url.to_string())
}

/// Resolves a link target against the URL it was discovered on
///
/// Absolute HTTP(S) targets are normalized as-is; relative references are
/// joined onto `base` first. Script, mail, telephone, data and same-page
/// fragment references are rejected.
///
/// # Examples
///
/// ```
/// use signpost_harvest::url::resolve_reference;
///
/// let resolved = resolve_reference("meta.ttl", "http://example.org/records/42").unwrap();
/// assert_eq!(resolved, "http://example.org/records/meta.ttl");
/// ```
pub fn resolve_reference(target: &str, base: &str) -> Result<String, UrlError> {
    let target = target.trim();

    if target.is_empty() || target.starts_with('#') {
        return Err(UrlError::Unfollowable(target.to_string()));
    }

    let lowered = target.to_ascii_lowercase();
    if UNFOLLOWABLE_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return Err(UrlError::Unfollowable(target.to_string()));
    }

    if has_http_scheme(target) {
        return normalize_url(target);
    }

    let base_url = Url::parse(&normalize_url(base)?).map_err(|e| UrlError::Parse(e.to_string()))?;
    let joined = base_url
        .join(target)
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    normalize_url(joined.as_str())
}

/// Splits a delimiter-separated seed list into trimmed, non-empty entries
///
/// Commas and line breaks both separate seeds.
pub fn split_seeds(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_http_scheme(s: &str) -> bool {
    let lowered = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}
