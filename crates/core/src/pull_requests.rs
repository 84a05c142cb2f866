//! Handling of pull request events.

use repo_steward_developer_platforms::models::ItemKind;
use repo_steward_developer_platforms::RepositoryProvider;
use tracing::{debug, info, warn};

use crate::config::{BotConfiguration, RepositoryPolicy};
use crate::events::{PullRequestAction, PullRequestEvent};
use crate::labels::labels_to_clear;
use crate::squash::{evaluate_squash, SquashAction};
use crate::{EventOutcome, PullRequestReport, RepoSteward, SquashOutcome};

#[cfg(test)]
#[path = "pull_requests_tests.rs"]
mod tests;

impl<P: RepositoryProvider + std::fmt::Debug> RepoSteward<P> {
    pub(crate) async fn handle_pull_request(
        &self,
        config: &BotConfiguration,
        policy: &RepositoryPolicy,
        event: &PullRequestEvent,
    ) -> EventOutcome {
        let squash = self.update_squash_label(config, policy, event).await;

        let cleared_labels = match event.action {
            PullRequestAction::SourceUpdated => {
                self.clear_labels_on_source_update(config, policy, event)
                    .await
            }
            PullRequestAction::Opened => Vec::new(),
        };

        EventOutcome::PullRequestChecked(PullRequestReport {
            squash,
            cleared_labels,
        })
    }

    async fn update_squash_label(
        &self,
        config: &BotConfiguration,
        policy: &RepositoryPolicy,
        event: &PullRequestEvent,
    ) -> SquashOutcome {
        if policy.unable_checking_squash {
            return SquashOutcome::Disabled;
        }

        let commit_count = match self
            .provider
            .count_pull_request_commits(&event.repo_owner, &event.repo_name, event.number)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    repository_owner = event.repo_owner,
                    repository = event.repo_name,
                    pull_request = event.number,
                    error = e.to_string(),
                    "Failed to count the commits of the pull request"
                );
                self.post_comment(
                    &event.repo_owner,
                    &event.repo_name,
                    ItemKind::PullRequest,
                    event.number,
                    &config.comment_command_trigger,
                )
                .await;
                return SquashOutcome::CommitsUnavailable;
            }
        };

        let Some(labels) = self
            .fetch_labels(
                &event.repo_owner,
                &event.repo_name,
                ItemKind::PullRequest,
                event.number,
            )
            .await
        else {
            return SquashOutcome::LabelsUnavailable;
        };

        let squash_label = vec![config.squash_commit_label.clone()];
        match evaluate_squash(policy, commit_count, &labels, &config.squash_commit_label) {
            SquashAction::None => SquashOutcome::Unchanged,
            SquashAction::AddLabel => {
                match self
                    .provider
                    .add_labels(
                        &event.repo_owner,
                        &event.repo_name,
                        ItemKind::PullRequest,
                        event.number,
                        &squash_label,
                    )
                    .await
                {
                    Ok(()) => {
                        info!(
                            pull_request = event.number,
                            commits = commit_count,
                            label = config.squash_commit_label,
                            "Added squash label"
                        );
                        SquashOutcome::LabelAdded
                    }
                    Err(e) => {
                        warn!(
                            pull_request = event.number,
                            error = e.to_string(),
                            "Failed to add the squash label"
                        );
                        SquashOutcome::UpdateFailed
                    }
                }
            }
            SquashAction::RemoveLabel => {
                match self
                    .provider
                    .remove_labels(
                        &event.repo_owner,
                        &event.repo_name,
                        ItemKind::PullRequest,
                        event.number,
                        &squash_label,
                    )
                    .await
                {
                    Ok(()) => {
                        info!(
                            pull_request = event.number,
                            commits = commit_count,
                            label = config.squash_commit_label,
                            "Removed squash label"
                        );
                        SquashOutcome::LabelRemoved
                    }
                    Err(e) => {
                        warn!(
                            pull_request = event.number,
                            error = e.to_string(),
                            "Failed to remove the squash label"
                        );
                        SquashOutcome::UpdateFailed
                    }
                }
            }
        }
    }

    /// Removes the labels that new commits invalidate and tells the author which ones.
    async fn clear_labels_on_source_update(
        &self,
        config: &BotConfiguration,
        policy: &RepositoryPolicy,
        event: &PullRequestEvent,
    ) -> Vec<String> {
        if !policy.clears_labels() {
            return Vec::new();
        }

        let Some(labels) = self
            .fetch_labels(
                &event.repo_owner,
                &event.repo_name,
                ItemKind::PullRequest,
                event.number,
            )
            .await
        else {
            return Vec::new();
        };

        let to_clear = labels_to_clear(policy, &labels);
        if to_clear.is_empty() {
            debug!(pull_request = event.number, "No labels to clear");
            return Vec::new();
        }

        if let Err(e) = self
            .provider
            .remove_labels(
                &event.repo_owner,
                &event.repo_name,
                ItemKind::PullRequest,
                event.number,
                &to_clear,
            )
            .await
        {
            warn!(
                repository_owner = event.repo_owner,
                repository = event.repo_name,
                pull_request = event.number,
                labels = ?to_clear,
                error = e.to_string(),
                "Failed to clear labels after the source was updated"
            );
            return Vec::new();
        }

        self.post_comment(
            &event.repo_owner,
            &event.repo_name,
            ItemKind::PullRequest,
            event.number,
            &config.labels_cleared_message(&to_clear),
        )
        .await;

        to_clear
    }
}
