//! URL handling module for Signpost-Harvest
//!
//! This module provides URL normalization, reference resolution, seed list
//! splitting, domain extraction and repository classification.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{domain_of, extract_domain, is_repository_url, REPOSITORY_MARKERS};
pub use normalize::{normalize_url, resolve_reference, split_seeds};

/// Domain classification types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainClassification {
    /// Known data repository or identifier service
    Repository,
    /// Any other host
    General,
}

impl DomainClassification {
    /// Score bonus granted to resources on this kind of domain
    pub fn score_bonus(&self) -> f64 {
        match self {
            Self::Repository => 0.2,
            Self::General => 0.0,
        }
    }
}

/// Classifies the domain a URL belongs to
///
/// # Examples
///
/// ```
/// use signpost_harvest::url::{classify_url, DomainClassification};
///
/// assert_eq!(classify_url("https://zenodo.org/records/1"), DomainClassification::Repository);
/// assert_eq!(classify_url("https://example.org/"), DomainClassification::General);
/// ```
pub fn classify_url(url: &str) -> DomainClassification {
    if is_repository_url(url) {
        DomainClassification::Repository
    } else {
        DomainClassification::General
    }
}
