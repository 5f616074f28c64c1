// SPDX-License-Identifier: MIT

//! Approximate matching used during reconciliation
//!
//! Matching is case-insensitive substring containment in either direction.
//! It produces false positives for short names ("Auth" matches "OAuth
//! integration"); callers rely on exactly this behavior.

use super::types::Priority;
use std::collections::HashMap;

/// Longest milestone name kept, in characters
pub const MILESTONE_NAME_LIMIT: usize = 50;

const MILESTONE_KEYWORDS: [&str; 3] = ["milestone", "release", "launch"];

/// Case-insensitive containment of either string in the other
pub fn fuzzy_matches(name: &str, candidate: &str) -> bool {
    let a = name.trim().to_lowercase();
    let b = candidate.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// First bucket (must → wont) holding an entry that fuzzily matches `name`.
///
/// Unmatched features default to `wont_have`.
pub fn resolve_priority(name: &str, buckets: &HashMap<Priority, Vec<String>>) -> Priority {
    Priority::ALL
        .into_iter()
        .find(|p| {
            buckets
                .get(p)
                .is_some_and(|entries| entries.iter().any(|e| fuzzy_matches(name, e)))
        })
        .unwrap_or(Priority::WontHave)
}

/// A `feature_dependencies` entry: feature name and what it depends on
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEntry {
    pub feature: String,
    pub depends_on: Vec<String>,
}

/// Dependencies of the first entry whose feature fuzzily matches `name`
pub fn resolve_dependencies(name: &str, entries: &[DependencyEntry]) -> Vec<String> {
    entries
        .iter()
        .find(|e| fuzzy_matches(name, &e.feature))
        .map(|e| e.depends_on.clone())
        .unwrap_or_default()
}

/// Risk level of the first entry whose feature fuzzily matches `name`
pub fn resolve_risk<'a>(name: &str, risks: &'a [(String, String)]) -> Option<&'a str> {
    risks
        .iter()
        .find(|(feature, _)| fuzzy_matches(name, feature))
        .map(|(_, level)| level.as_str())
}

/// Sentences of a narrative that mention a milestone, release or launch
pub fn extract_milestones(narrative: &str) -> Vec<String> {
    narrative
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lower = s.to_lowercase();
            MILESTONE_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|s| s.chars().take(MILESTONE_NAME_LIMIT).collect::<String>())
        .collect()
}
