//! Squash label management for pull requests.

use crate::config::RepositoryPolicy;

#[cfg(test)]
#[path = "squash_tests.rs"]
mod tests;

/// The change to make to the squash label of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquashAction {
    None,
    AddLabel,
    RemoveLabel,
}

/// Decides whether the squash label needs to change.
///
/// A pull request with more commits than the policy threshold gets the label, a pull
/// request at or below the threshold loses it. The label is matched case-insensitively.
/// Nothing changes when squash checking is turned off for the repository.
pub fn evaluate_squash(
    policy: &RepositoryPolicy,
    commit_count: u64,
    current_labels: &[String],
    squash_label: &str,
) -> SquashAction {
    if policy.unable_checking_squash {
        return SquashAction::None;
    }

    let squash_label = squash_label.to_lowercase();
    let has_label = current_labels
        .iter()
        .any(|l| l.to_lowercase() == squash_label);
    let needs_squash = commit_count > u64::from(policy.commits_threshold);

    match (needs_squash, has_label) {
        (true, false) => SquashAction::AddLabel,
        (false, true) => SquashAction::RemoveLabel,
        _ => SquashAction::None,
    }
}
