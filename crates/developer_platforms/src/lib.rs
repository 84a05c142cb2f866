//! # Repo Steward developer platforms
//!
//! The capability seam between the bot's decision logic and a code hosting platform.
//!
//! The core never talks to the network directly. Everything it needs to know about a
//! repository, and every side effect it wants to perform, goes through a
//! [`RepositoryProvider`]. The [`github`] module provides the production implementation.

use async_trait::async_trait;

pub mod errors;

pub mod github;

pub mod models;
use errors::Error;
use models::{ItemKind, ItemState, Label};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Trait for the repository operations the bot relies on.
///
/// Each method performs at most one logical request against the platform and reports
/// whether it succeeded. Callers decide what a failure means; implementations must not
/// retry on their own.
///
/// Operations that apply equally to issues and pull requests take an [`ItemKind`] so that
/// implementations can route them to the matching endpoint.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Checks whether `username` holds write access (or better) on the repository.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `username` - The login of the account to check
    ///
    /// # Returns
    ///
    /// `Ok(true)` when the user may operate on the repository, `Ok(false)` when the
    /// platform answered but the user lacks permission, `Err` when the answer is unknown.
    async fn check_permission(
        &self,
        repo_owner: &str,
        repo_name: &str,
        username: &str,
    ) -> Result<bool, Error>;

    /// Counts the commits that make up a pull request.
    async fn count_pull_request_commits(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<u64, Error>;

    /// Counts the pull requests linked to an issue, i.e. the pull requests that will close
    /// the issue when they merge.
    async fn count_linked_pull_requests(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
    ) -> Result<u64, Error>;

    /// Lists the labels currently applied to an issue or pull request.
    async fn list_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
    ) -> Result<Vec<Label>, Error>;

    /// Lists every label defined in the repository.
    async fn list_repository_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Vec<Label>, Error>;

    /// Adds labels to an issue or pull request in one batch.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `kind` - Whether `number` refers to an issue or a pull request
    /// * `number` - The issue or pull request number
    /// * `labels` - The labels to add
    async fn add_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        labels: &[String],
    ) -> Result<(), Error>;

    /// Removes labels from an issue or pull request in one batch.
    ///
    /// The batch fails as a whole if any label could not be removed.
    async fn remove_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        labels: &[String],
    ) -> Result<(), Error>;

    /// Opens or closes an issue or pull request.
    async fn set_state(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        state: ItemState,
    ) -> Result<(), Error>;

    /// Posts a comment on an issue or pull request.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `kind` - Whether `number` refers to an issue or a pull request
    /// * `number` - The issue or pull request number
    /// * `comment` - The comment text, Markdown is supported
    async fn add_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        comment: &str,
    ) -> Result<(), Error>;
}
