//! Seed suitability check
//!
//! Estimates, before a crawl, whether a URL is a good starting point: does
//! it serve RDF itself, does it publish signposting, and is it hosted by a
//! known data repository.

use super::fetcher::ResourceFetcher;
use super::signposting::SignpostingResolver;
use crate::url::is_repository_url;
use std::fmt;

/// How promising a seed looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Promising,
    MightWork,
    Unlikely,
}

impl Recommendation {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.3 {
            Self::Promising
        } else if score > 0.0 {
            Self::MightWork
        } else {
            Self::Unlikely
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promising => "promising",
            Self::MightWork => "might_work",
            Self::Unlikely => "unlikely",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Findings of a seed check
#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub url: String,
    pub score: f64,
    pub rdf_found: bool,
    pub triple_count: usize,
    pub format: Option<String>,
    pub content_type: Option<String>,
    pub signposting_found: bool,
    pub relations: Vec<String>,
    pub known_repository: bool,
    pub recommendation: Recommendation,
}

impl SeedReport {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            score: 0.0,
            rdf_found: false,
            triple_count: 0,
            format: None,
            content_type: None,
            signposting_found: false,
            relations: Vec::new(),
            known_repository: false,
            recommendation: Recommendation::Unlikely,
        }
    }
}

/// Checks a candidate seed
///
/// Direct RDF adds 0.5, any discovered link adds 0.3 and a repository host
/// adds 0.2.
pub async fn check_seed(
    fetcher: &ResourceFetcher,
    resolver: &SignpostingResolver,
    url: &str,
) -> SeedReport {
    let mut report = SeedReport::new(url);

    let parsed = fetcher.fetch_and_parse(url).await;
    if parsed.has_triples() {
        report.rdf_found = true;
        report.triple_count = parsed.triple_count();
        report.format = parsed.format.map(|f| f.as_str().to_string());
        report.content_type = parsed.content_type.clone();
        report.score += 0.5;
    }

    let links = resolver.discover_links(url).await;
    if !links.is_empty() {
        report.signposting_found = true;
        report.relations = links.relations();
        report.score += 0.3;
    }

    if is_repository_url(url) {
        report.known_repository = true;
        report.score += 0.2;
    }

    report.recommendation = Recommendation::from_score(report.score);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_score(0.5), Recommendation::Promising);
        assert_eq!(Recommendation::from_score(0.3), Recommendation::Promising);
        assert_eq!(Recommendation::from_score(0.2), Recommendation::MightWork);
        assert_eq!(Recommendation::from_score(0.0), Recommendation::Unlikely);
    }

    #[test]
    fn test_recommendation_labels() {
        assert_eq!(Recommendation::MightWork.to_string(), "might_work");
    }
}
