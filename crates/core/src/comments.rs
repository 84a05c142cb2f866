//! Handling of comments left on issues and pull requests.
//!
//! A comment is checked for commands in a fixed order. A `/reopen` on a closed item or a
//! `/close` on an open item wins, otherwise the label commands of the comment are applied.

use repo_steward_developer_platforms::models::{ItemKind, ItemState};
use repo_steward_developer_platforms::RepositoryProvider;
use tracing::{debug, info, warn};

use crate::commands::{is_close_command, is_reopen_command, parse_label_commands};
use crate::config::{BotConfiguration, RepositoryPolicy};
use crate::events::CommentEvent;
use crate::labels::{find_conflicts, missing_labels, LabelDiff};
use crate::permissions::{check_commenter_permission, PermissionCheck};
use crate::{EventOutcome, LabelReport, RepoSteward};

#[cfg(test)]
#[path = "comments_tests.rs"]
mod tests;

const CLOSE_ACTION: &str = "close";
const REOPEN_ACTION: &str = "reopen";

impl<P: RepositoryProvider + std::fmt::Debug> RepoSteward<P> {
    pub(crate) async fn handle_comment(
        &self,
        config: &BotConfiguration,
        policy: &RepositoryPolicy,
        event: &CommentEvent,
    ) -> EventOutcome {
        if event.state == ItemState::Closed && is_reopen_command(&event.body) {
            return self.reopen(config, event).await;
        }

        if event.state == ItemState::Open && is_close_command(&event.body) {
            return self.close(config, policy, event).await;
        }

        self.apply_label_commands(config, policy, event).await
    }

    async fn reopen(&self, config: &BotConfiguration, event: &CommentEvent) -> EventOutcome {
        if let Err(outcome) = self.authorize(config, event, REOPEN_ACTION).await {
            return outcome;
        }

        self.change_state(event, ItemState::Open).await
    }

    async fn close(
        &self,
        config: &BotConfiguration,
        policy: &RepositoryPolicy,
        event: &CommentEvent,
    ) -> EventOutcome {
        if let Err(outcome) = self.authorize(config, event, CLOSE_ACTION).await {
            return outcome;
        }

        if event.kind == ItemKind::Issue && policy.need_issue_has_link_pull_requests {
            match self
                .provider
                .count_linked_pull_requests(&event.repo_owner, &event.repo_name, event.number)
                .await
            {
                Ok(0) => {
                    self.post_comment(
                        &event.repo_owner,
                        &event.repo_name,
                        event.kind,
                        event.number,
                        &config.issue_needs_linked_pull_request_message(&event.commenter),
                    )
                    .await;
                    return EventOutcome::LinkedPullRequestRequired;
                }
                Ok(count) => {
                    debug!(issue = event.number, linked_pull_requests = count, "Issue has linked pull requests");
                }
                Err(e) => {
                    warn!(
                        repository_owner = event.repo_owner,
                        repository = event.repo_name,
                        issue = event.number,
                        error = e.to_string(),
                        "Failed to list the pull requests linked to the issue"
                    );
                    self.post_comment(
                        &event.repo_owner,
                        &event.repo_name,
                        event.kind,
                        event.number,
                        &config.linked_pull_requests_failure_message(&event.commenter),
                    )
                    .await;
                    return EventOutcome::LinkedPullRequestsUnavailable;
                }
            }
        }

        self.change_state(event, ItemState::Closed).await
    }

    /// Checks that the commenter may change the state of the item.
    ///
    /// A denied commenter is told so in a comment. When the permission is unknown nothing is
    /// posted.
    async fn authorize(
        &self,
        config: &BotConfiguration,
        event: &CommentEvent,
        action: &str,
    ) -> Result<(), EventOutcome> {
        match check_commenter_permission(
            &self.provider,
            &event.repo_owner,
            &event.repo_name,
            &event.author,
            &event.commenter,
        )
        .await
        {
            PermissionCheck::Granted => Ok(()),
            PermissionCheck::Denied => {
                self.post_comment(
                    &event.repo_owner,
                    &event.repo_name,
                    event.kind,
                    event.number,
                    &config.no_permission_message(event.kind, &event.commenter, action),
                )
                .await;
                Err(EventOutcome::PermissionDenied {
                    action: action.to_string(),
                })
            }
            PermissionCheck::Inconclusive => Err(EventOutcome::PermissionInconclusive),
        }
    }

    async fn change_state(&self, event: &CommentEvent, state: ItemState) -> EventOutcome {
        match self
            .provider
            .set_state(&event.repo_owner, &event.repo_name, event.kind, event.number, state)
            .await
        {
            Ok(()) => {
                info!(
                    repository_owner = event.repo_owner,
                    repository = event.repo_name,
                    number = event.number,
                    kind = %event.kind,
                    state = %state,
                    commenter = event.commenter,
                    "Changed the state of the item"
                );
                EventOutcome::StateChanged(state)
            }
            Err(e) => {
                warn!(
                    repository_owner = event.repo_owner,
                    repository = event.repo_name,
                    number = event.number,
                    kind = %event.kind,
                    state = %state,
                    error = e.to_string(),
                    "Failed to change the state of the item"
                );
                EventOutcome::StateChangeFailed(state)
            }
        }
    }

    async fn apply_label_commands(
        &self,
        config: &BotConfiguration,
        policy: &RepositoryPolicy,
        event: &CommentEvent,
    ) -> EventOutcome {
        let commands = parse_label_commands(&event.body);
        if commands.is_empty() {
            return EventOutcome::Ignored;
        }

        if let Some(conflict) = find_conflicts(&commands.to_add, &commands.to_remove) {
            self.post_comment(
                &event.repo_owner,
                &event.repo_name,
                event.kind,
                event.number,
                &config.label_conflict_message(&event.commenter, &conflict.to_string()),
            )
            .await;
            return EventOutcome::ConflictingCommand {
                labels: conflict.labels,
            };
        }

        let Some(current) = self
            .fetch_labels(&event.repo_owner, &event.repo_name, event.kind, event.number)
            .await
        else {
            return EventOutcome::LabelsUnavailable;
        };

        let diff = LabelDiff::compute(&current, &commands.to_add, &commands.to_remove);
        if diff.is_empty() {
            debug!(number = event.number, "Labels already match the commands");
            return EventOutcome::LabelsUpdated(LabelReport::default());
        }

        if !diff.to_add.is_empty() {
            if let Err(outcome) = self.authorize_new_labels(config, policy, event, &diff.to_add).await {
                return outcome;
            }
        }

        let mut report = LabelReport::default();

        if !diff.to_add.is_empty() {
            match self
                .provider
                .add_labels(&event.repo_owner, &event.repo_name, event.kind, event.number, &diff.to_add)
                .await
            {
                Ok(()) => report.added = diff.to_add.clone(),
                Err(e) => {
                    warn!(
                        number = event.number,
                        labels = ?diff.to_add,
                        error = e.to_string(),
                        "Failed to add labels"
                    );
                    report.failed.extend(diff.to_add.iter().cloned());
                }
            }
        }

        if !diff.to_remove.is_empty() {
            match self
                .provider
                .remove_labels(&event.repo_owner, &event.repo_name, event.kind, event.number, &diff.to_remove)
                .await
            {
                Ok(()) => report.removed = diff.to_remove.clone(),
                Err(e) => {
                    warn!(
                        number = event.number,
                        labels = ?diff.to_remove,
                        error = e.to_string(),
                        "Failed to remove labels"
                    );
                    report.failed.extend(diff.to_remove.iter().cloned());
                }
            }
        }

        if !report.failed.is_empty() {
            self.post_comment(
                &event.repo_owner,
                &event.repo_name,
                event.kind,
                event.number,
                &config.update_label_failed_message(&event.commenter, &report.failed),
            )
            .await;
        }

        EventOutcome::LabelsUpdated(report)
    }

    /// Makes sure every label about to be added exists, or that the commenter may create it.
    async fn authorize_new_labels(
        &self,
        config: &BotConfiguration,
        policy: &RepositoryPolicy,
        event: &CommentEvent,
        to_add: &[String],
    ) -> Result<(), EventOutcome> {
        let repository_labels = match self
            .provider
            .list_repository_labels(&event.repo_owner, &event.repo_name)
            .await
        {
            Ok(labels) => labels.into_iter().map(|l| l.name).collect::<Vec<_>>(),
            Err(e) => {
                warn!(
                    repository_owner = event.repo_owner,
                    repository = event.repo_name,
                    error = e.to_string(),
                    "Failed to list the labels of the repository"
                );
                return Err(EventOutcome::LabelsUnavailable);
            }
        };

        let missing = missing_labels(to_add, &repository_labels);
        if missing.is_empty() {
            return Ok(());
        }

        if policy.allow_creating_labels_by_collaborator {
            match check_commenter_permission(
                &self.provider,
                &event.repo_owner,
                &event.repo_name,
                &event.author,
                &event.commenter,
            )
            .await
            {
                PermissionCheck::Granted => {
                    info!(
                        number = event.number,
                        labels = ?missing,
                        commenter = event.commenter,
                        "Commenter may create new labels"
                    );
                    return Ok(());
                }
                PermissionCheck::Denied => {}
                PermissionCheck::Inconclusive => return Err(EventOutcome::PermissionInconclusive),
            }
        }

        self.post_comment(
            &event.repo_owner,
            &event.repo_name,
            event.kind,
            event.number,
            &config.missing_labels_message(&event.commenter, &missing),
        )
        .await;

        Err(EventOutcome::MissingLabels { labels: missing })
    }
}
