//! Scoring, duplicate marking, weighting, ordering and paging of unified
//! search results.

use std::cmp::Ordering;
use std::collections::HashMap;

use portfolio_types::config::SearchSettings;
use portfolio_types::element::Source;
use portfolio_types::unified::{SortBy, UnifiedSearchResult};

/// Score for an empty query, which matches everything.
pub const EMPTY_QUERY_SCORE: f64 = 0.1;

/// Score `name`/`tags`/`description` against a query. `None` means no match.
///
/// Tiers, highest first: exact name (also in slug form) 1.0, name prefix 0.8,
/// name substring 0.6, tag 0.5, description substring 0.3. Below that, each
/// query term found anywhere contributes a share of 0.4.
pub fn text_score(
    query: &str,
    name: &str,
    tags: &[String],
    description: Option<&str>,
) -> Option<f64> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Some(EMPTY_QUERY_SCORE);
    }
    let name_lc = name.to_lowercase();

    if name_lc == query || slug(&name_lc) == slug(&query) {
        return Some(1.0);
    }
    if name_lc.starts_with(&query) {
        return Some(0.8);
    }
    if name_lc.contains(&query) {
        return Some(0.6);
    }
    let tags_lc: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
    if tags_lc.iter().any(|t| *t == query) {
        return Some(0.5);
    }
    let description_lc = description.map(str::to_lowercase).unwrap_or_default();
    if description_lc.contains(&query) {
        return Some(0.3);
    }

    let terms: Vec<&str> = query.split_whitespace().collect();
    let found = terms
        .iter()
        .filter(|term| {
            name_lc.contains(*term)
                || description_lc.contains(*term)
                || tags_lc.iter().any(|t| t.contains(*term))
        })
        .count();
    if found == 0 {
        return None;
    }
    Some(found as f64 / terms.len() as f64 * 0.4)
}

/// Lowercase, with every run of non-alphanumerics collapsed to one `-`.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// True when `candidate` names the same element as `name` (case-insensitive,
/// slug forms equal).
pub fn names_match(name: &str, candidate: &str) -> bool {
    name.eq_ignore_ascii_case(candidate) || slug(name) == slug(candidate)
}

/// Flag every result whose dedup key occurs more than once. Nothing is
/// removed.
pub fn mark_duplicates(results: &mut [UnifiedSearchResult]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for r in results.iter() {
        *counts.entry(r.entry.dedup_key()).or_default() += 1;
    }
    for r in results.iter_mut() {
        r.is_duplicate = counts.get(&r.entry.dedup_key()).copied().unwrap_or(0) > 1;
    }
}

/// Discount non-local scores by their source weight.
pub fn apply_source_weights(results: &mut [UnifiedSearchResult], settings: &SearchSettings) {
    for r in results.iter_mut() {
        r.score *= settings.weight_for(r.source);
    }
}

/// Order results in place. `priority` is the effective source order used
/// for tie-breaks and for [`SortBy::Source`].
pub fn sort_results(results: &mut [UnifiedSearchResult], sort: SortBy, priority: &[Source]) {
    let rank = |s: Source| priority.iter().position(|p| *p == s).unwrap_or(priority.len());
    let by_score = |a: &UnifiedSearchResult, b: &UnifiedSearchResult| {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
    };
    let by_name = |a: &UnifiedSearchResult, b: &UnifiedSearchResult| {
        a.entry.name.to_lowercase().cmp(&b.entry.name.to_lowercase())
    };

    match sort {
        SortBy::Relevance => results.sort_by(|a, b| {
            by_score(a, b)
                .then_with(|| rank(a.source).cmp(&rank(b.source)))
                .then_with(|| by_name(a, b))
        }),
        SortBy::Name => results.sort_by(|a, b| {
            by_name(a, b).then_with(|| rank(a.source).cmp(&rank(b.source)))
        }),
        SortBy::Source => results.sort_by(|a, b| {
            rank(a.source)
                .cmp(&rank(b.source))
                .then_with(|| by_score(a, b))
                .then_with(|| by_name(a, b))
        }),
    }
}

/// Return one 1-based page. Page 0 is treated as page 1.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    items.into_iter().skip(start).take(page_size).collect()
}
