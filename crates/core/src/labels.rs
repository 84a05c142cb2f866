//! # Labels
//!
//! Pure label bookkeeping used by the event handlers.
//!
//! - Detecting comments that both add and remove the same label
//! - Computing the labels that actually need to change on an item
//! - Finding requested labels that the repository does not define
//! - Selecting the labels cleared when new commits are pushed to a pull request
//!
//! Label names are compared case-insensitively, the same way the platform treats them.

use crate::config::RepositoryPolicy;
use std::collections::HashSet;
use std::fmt;

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;

/// Separator used when conflicting labels are displayed.
///
/// Conflict templates wrap `__labels__` in bold markers, each label ends up bold on its own.
pub const CONFLICT_SEPARATOR: &str = "**, **";

/// Labels that a single comment asked to both add and remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelConflict {
    /// Lower cased label names, sorted and without duplicates
    pub labels: Vec<String>,
}

impl fmt::Display for LabelConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.labels.join(CONFLICT_SEPARATOR))
    }
}

/// Finds the labels present in both `to_add` and `to_remove`.
///
/// Returns `None` when either list is empty or the lists have nothing in common.
///
/// # Examples
///
/// ```
/// use repo_steward_core::labels::find_conflicts;
///
/// let add = vec!["kind/Bug".to_string(), "sig/docs".to_string()];
/// let remove = vec!["kind/bug".to_string()];
///
/// let conflict = find_conflicts(&add, &remove).unwrap();
/// assert_eq!(conflict.to_string(), "kind/bug");
/// ```
pub fn find_conflicts(to_add: &[String], to_remove: &[String]) -> Option<LabelConflict> {
    if to_add.is_empty() || to_remove.is_empty() {
        return None;
    }

    let removed: HashSet<String> = to_remove.iter().map(|l| l.to_lowercase()).collect();
    let mut labels: Vec<String> = to_add
        .iter()
        .map(|l| l.to_lowercase())
        .filter(|l| removed.contains(l))
        .collect();

    if labels.is_empty() {
        return None;
    }

    labels.sort();
    labels.dedup();
    Some(LabelConflict { labels })
}

/// The label changes needed to apply a set of label commands to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDiff {
    /// Requested labels the item does not carry yet
    pub to_add: Vec<String>,

    /// Labels the item carries that were requested to be removed, spelled as on the item
    pub to_remove: Vec<String>,
}

impl LabelDiff {
    /// Computes the changes needed to go from `current` to the requested labels.
    ///
    /// Labels that are already present are not added again and labels that are absent are
    /// not removed, so applying the same commands twice changes nothing the second time.
    pub fn compute(current: &[String], to_add: &[String], to_remove: &[String]) -> Self {
        let present: HashSet<String> = current.iter().map(|l| l.to_lowercase()).collect();

        let mut add: Vec<String> = Vec::new();
        for label in to_add {
            let key = label.to_lowercase();
            if !present.contains(&key) && !add.iter().any(|l| l.to_lowercase() == key) {
                add.push(label.clone());
            }
        }

        let requested: HashSet<String> = to_remove.iter().map(|l| l.to_lowercase()).collect();
        let mut remove: Vec<String> = Vec::new();
        for label in current {
            if requested.contains(&label.to_lowercase()) && !remove.contains(label) {
                remove.push(label.clone());
            }
        }

        Self {
            to_add: add,
            to_remove: remove,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Returns the labels of `requested` that the repository does not define.
pub fn missing_labels(requested: &[String], repository_labels: &[String]) -> Vec<String> {
    let defined: HashSet<String> = repository_labels
        .iter()
        .map(|l| l.to_lowercase())
        .collect();

    requested
        .iter()
        .filter(|l| !defined.contains(&l.to_lowercase()))
        .cloned()
        .collect()
}

/// Selects the labels of a pull request that a push of new commits invalidates.
///
/// A label is selected when it is listed in `clear_labels` or matches
/// `clear_labels_by_regexp`. The result follows the order of `current`.
pub fn labels_to_clear(policy: &RepositoryPolicy, current: &[String]) -> Vec<String> {
    let listed: HashSet<&str> = policy.clear_labels.iter().map(String::as_str).collect();
    let regex = policy.clear_labels_regex();

    let mut labels: Vec<String> = Vec::new();
    for label in current {
        let selected =
            listed.contains(label.as_str()) || regex.is_some_and(|r| r.is_match(label));
        if selected && !labels.contains(label) {
            labels.push(label.clone());
        }
    }

    labels
}
