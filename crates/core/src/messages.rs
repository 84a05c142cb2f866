//! Rendering of the comments the bot posts.
//!
//! Comment templates come from the bot configuration and use `__name__` placeholders that
//! are replaced when the comment is rendered.

use crate::config::BotConfiguration;
use repo_steward_developer_platforms::models::ItemKind;

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;

/// Placeholder for the action the commenter tried to perform
pub const ACTION_PLACEHOLDER: &str = "__action__";

/// Placeholder for the mention of the commenter
pub const COMMENTER_PLACEHOLDER: &str = "__commenter__";

/// Placeholder for a list of labels
pub const LABELS_PLACEHOLDER: &str = "__labels__";

/// Placeholder for a user login in `user_mark_format`
pub const LOGIN_PLACEHOLDER: &str = "__login__";

/// Separator used when a list of labels is rendered into a comment
pub const LABEL_LIST_SEPARATOR: &str = ", ";

/// Replaces every occurrence of each placeholder in `template` with its value.
pub fn render(template: &str, replacements: &[(&str, &str)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| {
            text.replace(placeholder, value)
        })
}

impl BotConfiguration {
    /// Formats a mention of `login` using `user_mark_format`.
    pub fn mention(&self, login: &str) -> String {
        render(&self.user_mark_format, &[(LOGIN_PLACEHOLDER, login)])
    }

    pub fn label_conflict_message(&self, commenter: &str, labels: &str) -> String {
        self.commenter_labels_message(&self.comment_label_command_conflict, commenter, labels)
    }

    pub fn update_label_failed_message(&self, commenter: &str, labels: &[String]) -> String {
        self.commenter_labels_message(
            &self.comment_update_label_failed,
            commenter,
            &labels.join(LABEL_LIST_SEPARATOR),
        )
    }

    pub fn missing_labels_message(&self, commenter: &str, labels: &[String]) -> String {
        self.commenter_labels_message(
            &self.comment_add_not_exist_label,
            commenter,
            &labels.join(LABEL_LIST_SEPARATOR),
        )
    }

    pub fn labels_cleared_message(&self, labels: &[String]) -> String {
        render(
            &self.comment_remove_labels_when_pr_source_code_updated,
            &[(LABELS_PLACEHOLDER, labels.join(LABEL_LIST_SEPARATOR).as_str())],
        )
    }

    /// Message posted when a commenter may not `action` the item.
    ///
    /// Issues and pull requests have their own template.
    pub fn no_permission_message(&self, kind: ItemKind, commenter: &str, action: &str) -> String {
        let template = match kind {
            ItemKind::Issue => &self.comment_no_permission_operate_issue,
            ItemKind::PullRequest => &self.comment_no_permission_operate_pr,
        };

        render(
            template,
            &[
                (COMMENTER_PLACEHOLDER, self.mention(commenter).as_str()),
                (ACTION_PLACEHOLDER, action),
            ],
        )
    }

    pub fn issue_needs_linked_pull_request_message(&self, commenter: &str) -> String {
        render(
            &self.comment_issue_needs_link_pr,
            &[(COMMENTER_PLACEHOLDER, self.mention(commenter).as_str())],
        )
    }

    pub fn linked_pull_requests_failure_message(&self, commenter: &str) -> String {
        render(
            &self.comment_list_linking_pull_requests_failure,
            &[(COMMENTER_PLACEHOLDER, self.mention(commenter).as_str())],
        )
    }

    fn commenter_labels_message(&self, template: &str, commenter: &str, labels: &str) -> String {
        render(
            template,
            &[
                (COMMENTER_PLACEHOLDER, self.mention(commenter).as_str()),
                (LABELS_PLACEHOLDER, labels),
            ],
        )
    }
}
