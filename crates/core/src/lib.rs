//! # Repo Steward Core
//!
//! Decision logic for a repository bot that keeps labels and issue state tidy.
//!
//! Repo Steward reacts to pull request and comment events:
//! - Pull requests with too many commits get a squash label, which is removed again once
//!   the commits are squashed
//! - Pushing new commits to a pull request clears labels that no longer apply
//! - Collaborators add and remove labels with comment commands such as `/kind bug`
//! - Collaborators close and reopen issues and pull requests with `/close` and `/reopen`
//!
//! Every event is handled independently using a snapshot of the bot configuration. The
//! side effects go through a [`RepositoryProvider`], each one attempted at most once.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use repo_steward_core::config::BotConfiguration;
//! use repo_steward_core::events::parse_github_webhook;
//! use repo_steward_core::RepoSteward;
//! use repo_steward_developer_platforms::RepositoryProvider;
//!
//! async fn handle<P: RepositoryProvider + std::fmt::Debug>(
//!     provider: P,
//!     config: &BotConfiguration,
//!     payload: &[u8],
//! ) {
//!     let steward = RepoSteward::new(provider);
//!
//!     if let Ok(Some(webhook)) = parse_github_webhook("issue_comment", payload) {
//!         let outcome = steward.process_event(config, &webhook.event).await;
//!         println!("Outcome: {:?}", outcome);
//!     }
//! }
//! ```

use repo_steward_developer_platforms::models::{ItemKind, ItemState};
use repo_steward_developer_platforms::RepositoryProvider;
use tracing::{info, instrument, warn};

pub mod commands;

mod comments;

pub mod config;
use config::BotConfiguration;

pub mod errors;

pub mod events;
use events::{Event, EventCategory};

pub mod labels;

pub mod messages;

pub mod permissions;

mod pull_requests;

pub mod squash;

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// The event categories [`RepoSteward::process_event`] handles, hosts only dispatch these
pub const HANDLED_CATEGORIES: [EventCategory; 3] = [
    EventCategory::PullRequest,
    EventCategory::IssueComment,
    EventCategory::PullRequestComment,
];

/// What happened to the squash label of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquashOutcome {
    /// Squash checking is turned off for the repository
    Disabled,

    /// The label already reflects the commit count
    Unchanged,
    LabelAdded,
    LabelRemoved,

    /// The commits could not be counted, the command trigger comment was posted instead
    CommitsUnavailable,

    /// The labels of the pull request could not be read
    LabelsUnavailable,

    /// Adding or removing the label failed
    UpdateFailed,
}

/// The result of handling a pull request event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestReport {
    pub squash: SquashOutcome,

    /// Labels removed because new commits were pushed
    pub cleared_labels: Vec<String>,
}

/// The label changes made for a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,

    /// Labels that could not be added or removed
    pub failed: Vec<String>,
}

/// The result of processing an event.
///
/// Processing never fails. Problems are reported here, logged, and where the commenter can
/// do something about them, explained in a comment on the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// No policy applies to the repository, nothing was done
    Unconfigured,

    /// The event did not ask for anything
    Ignored,

    PullRequestChecked(PullRequestReport),

    /// The comment asked to both add and remove the listed labels
    ConflictingCommand { labels: Vec<String> },

    /// The commenter may not perform `action` on the item
    PermissionDenied { action: String },

    /// The permission of the commenter could not be determined, nothing was done
    PermissionInconclusive,

    StateChanged(ItemState),

    /// Changing the state of the item failed
    StateChangeFailed(ItemState),

    /// The issue can not be closed before a pull request is linked to it
    LinkedPullRequestRequired,

    /// The pull requests linked to the issue could not be listed
    LinkedPullRequestsUnavailable,

    /// The comment asked for labels the repository does not define
    MissingLabels { labels: Vec<String> },

    LabelsUpdated(LabelReport),

    /// The labels of the item or of the repository could not be read
    LabelsUnavailable,
}

/// Processes repository events and applies the resulting label and state changes.
///
/// # Examples
///
/// ```rust,no_run
/// use repo_steward_core::config::load_bot_configuration;
/// use repo_steward_core::RepoSteward;
/// use repo_steward_developer_platforms::github::GitHubProvider;
///
/// let steward = RepoSteward::new(GitHubProvider::default());
/// let config = load_bot_configuration("repo-steward.toml").unwrap();
/// ```
#[derive(Debug)]
pub struct RepoSteward<P: RepositoryProvider + std::fmt::Debug> {
    provider: P,
}

impl<P: RepositoryProvider + std::fmt::Debug> RepoSteward<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The provider used for every platform request.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Processes a single event against a configuration snapshot.
    ///
    /// The first policy that applies to the repository of the event decides how the event
    /// is handled. Events from repositories without a policy are dropped.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration snapshot to use for the whole event
    /// * `event` - The normalized event
    ///
    /// # Returns
    ///
    /// An [`EventOutcome`] describing what the bot did.
    #[instrument(skip(self, config))]
    pub async fn process_event(&self, config: &BotConfiguration, event: &Event) -> EventOutcome {
        let Some(policy) = config.policy_for(event.repo_owner(), event.repo_name()) else {
            warn!(
                repository_owner = event.repo_owner(),
                repository = event.repo_name(),
                "No configuration applies to the repository"
            );
            return EventOutcome::Unconfigured;
        };

        let outcome = match event {
            Event::PullRequest(e) => self.handle_pull_request(config, policy, e).await,
            Event::IssueComment(e) | Event::PullRequestComment(e) => {
                self.handle_comment(config, policy, e).await
            }
        };

        info!(
            repository_owner = event.repo_owner(),
            repository = event.repo_name(),
            number = event.number(),
            category = %event.category(),
            outcome = ?outcome,
            "Processed event"
        );

        outcome
    }

    /// Reads the label names of an issue or pull request, `None` if they could not be read.
    pub(crate) async fn fetch_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
    ) -> Option<Vec<String>> {
        match self
            .provider
            .list_labels(repo_owner, repo_name, kind, number)
            .await
        {
            Ok(labels) => Some(labels.into_iter().map(|l| l.name).collect()),
            Err(e) => {
                warn!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    number = number,
                    kind = %kind,
                    error = e.to_string(),
                    "Failed to list the labels"
                );
                None
            }
        }
    }

    /// Posts a comment, failures are logged and otherwise ignored.
    pub(crate) async fn post_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        comment: &str,
    ) {
        if let Err(e) = self
            .provider
            .add_comment(repo_owner, repo_name, kind, number, comment)
            .await
        {
            warn!(
                repository_owner = repo_owner,
                repository = repo_name,
                number = number,
                kind = %kind,
                error = e.to_string(),
                "Failed to post a comment"
            );
        }
    }
}
