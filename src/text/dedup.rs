//! Exact-duplicate removal for name candidates.

use crate::models::NameCandidate;
use std::collections::HashSet;

/// Collapse identical `(name, link)` pairs to their first occurrence.
///
/// Comparison is exact: no case folding, whitespace or accent normalization.
pub fn dedup_candidates(candidates: Vec<NameCandidate>) -> Vec<NameCandidate> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|c| seen.insert((c.name.clone(), c.link.clone())))
        .collect()
}
