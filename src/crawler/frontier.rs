//! Domain-diverse frontier selection
//!
//! Picks the URLs crawled at the next depth from scored candidates. Each
//! domain first gets an equal share of the per-level cap, taken from its
//! best-scoring URLs, with domains visited in order of their best score.
//! Leftover capacity is filled from the remaining pool by global score.

use crate::url::domain_of;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Next frontier plus how many URLs each domain contributed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontierSelection {
    pub urls: Vec<String>,
    pub per_domain: BTreeMap<String, usize>,
}

impl FrontierSelection {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Selects at most `cap` URLs from scored, unvisited candidates
///
/// Duplicate candidates keep their first score. Ties keep the order in
/// which candidates (and their domains) first appeared.
///
/// # Example
///
/// ```
/// use signpost_harvest::crawler::select_frontier;
///
/// let candidates = vec![
///     ("http://one.org/a".to_string(), 0.9),
///     ("http://one.org/b".to_string(), 0.6),
///     ("http://two.org/c".to_string(), 0.5),
/// ];
/// let selection = select_frontier(&candidates, 2);
/// assert_eq!(selection.urls, vec!["http://one.org/a", "http://two.org/c"]);
/// ```
pub fn select_frontier(candidates: &[(String, f64)], cap: usize) -> FrontierSelection {
    if cap == 0 {
        return FrontierSelection::default();
    }

    // Group by host[:port], remembering first-seen order
    let mut domains: Vec<(String, Vec<(String, f64)>)> = Vec::new();
    for (url, score) in candidates {
        let domain = domain_of(url).unwrap_or_default();
        if domains
            .iter()
            .any(|(_, urls)| urls.iter().any(|(seen, _)| seen == url))
        {
            continue;
        }
        match domains.iter_mut().find(|(name, _)| *name == domain) {
            Some((_, urls)) => urls.push((url.clone(), *score)),
            None => domains.push((domain, vec![(url.clone(), *score)])),
        }
    }
    if domains.is_empty() {
        return FrontierSelection::default();
    }

    for (_, urls) in domains.iter_mut() {
        urls.sort_by(|a, b| by_score_desc(a.1, b.1));
    }
    // Stable sort keeps first-seen order among equally ranked domains
    domains.sort_by(|a, b| by_score_desc(a.1[0].1, b.1[0].1));

    let quota = cap.div_ceil(domains.len()).max(1);
    let mut selected: Vec<(String, f64)> = Vec::with_capacity(cap);
    let mut remaining: Vec<(String, f64)> = Vec::new();

    for (_, urls) in &domains {
        for (index, candidate) in urls.iter().enumerate() {
            if index < quota && selected.len() < cap {
                selected.push(candidate.clone());
            } else {
                remaining.push(candidate.clone());
            }
        }
    }

    if selected.len() < cap {
        remaining.sort_by(|a, b| by_score_desc(a.1, b.1));
        let room = cap - selected.len();
        selected.extend(remaining.into_iter().take(room));
    }

    let mut per_domain = BTreeMap::new();
    for (url, _) in &selected {
        *per_domain.entry(domain_of(url).unwrap_or_default()).or_insert(0) += 1;
    }

    FrontierSelection {
        urls: selected.into_iter().map(|(url, _)| url).collect(),
        per_domain,
    }
}
