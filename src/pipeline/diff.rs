//! New-item detection.
//!
//! Compares the identifiers discovered on the remote listing with the
//! identifiers already stored and yields the ones to fetch.

use std::collections::HashSet;

use crate::models::ListingEntry;

/// Result of comparing a listing against stored identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Unique discovered identifiers, first occurrence order
    pub discovered: Vec<String>,
    /// Discovered identifiers that are not stored yet, same order
    pub added: Vec<String>,
}

impl Diff {
    /// Check if there is anything to fetch.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }

    /// Number of discovered identifiers that are already stored.
    pub fn already_present(&self) -> usize {
        self.discovered.len() - self.added.len()
    }
}

/// Calculate `discovered \ existing`.
///
/// Duplicate identifiers on the listing collapse to their first occurrence.
pub fn calculate_diff(discovered: &[ListingEntry], existing: &HashSet<String>) -> Diff {
    let mut seen: HashSet<&str> = HashSet::with_capacity(discovered.len());
    let mut diff = Diff::default();

    for entry in discovered {
        if !seen.insert(entry.id.as_str()) {
            continue;
        }
        diff.discovered.push(entry.id.clone());
        if !existing.contains(&entry.id) {
            diff.added.push(entry.id.clone());
        }
    }

    diff
}
