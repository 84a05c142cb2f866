use async_trait::async_trait;
use std::sync::Mutex;

use repo_steward_developer_platforms::errors::Error;
use repo_steward_developer_platforms::models::{ItemKind, ItemState, Label};
use repo_steward_developer_platforms::RepositoryProvider;

use crate::config::{BotConfiguration, RepositoryPolicy};

/// A request made against the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckPermission(String),
    CountCommits(u64),
    CountLinkedPullRequests(u64),
    ListLabels(ItemKind, u64),
    ListRepositoryLabels,
    AddLabels(ItemKind, u64, Vec<String>),
    RemoveLabels(ItemKind, u64, Vec<String>),
    SetState(ItemKind, u64, ItemState),
    AddComment(ItemKind, u64, String),
}

impl Call {
    /// Returns `true` for requests that change something on the platform.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::AddLabels(..) | Call::RemoveLabels(..) | Call::SetState(..) | Call::AddComment(..)
        )
    }
}

/// Provider that answers from canned data and records every request.
///
/// `None` in one of the answer fields makes the matching request fail.
#[derive(Debug)]
pub struct RecordingProvider {
    pub permission: Option<bool>,
    pub commit_count: Option<u64>,
    pub linked_pull_requests: Option<u64>,
    pub item_labels: Option<Vec<String>>,
    pub repository_labels: Option<Vec<String>>,
    pub fail_add_labels: bool,
    pub fail_remove_labels: bool,
    pub fail_set_state: bool,
    pub fail_add_comment: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            permission: Some(true),
            commit_count: Some(1),
            linked_pull_requests: Some(1),
            item_labels: Some(Vec::new()),
            repository_labels: Some(Vec::new()),
            fail_add_labels: false,
            fail_remove_labels: false,
            fail_set_state: false,
            fail_add_comment: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_item_labels(mut self, labels: &[&str]) -> Self {
        self.item_labels = Some(strings(labels));
        self
    }

    pub fn with_repository_labels(mut self, labels: &[&str]) -> Self {
        self.repository_labels = Some(strings(labels));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn comments(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddComment(_, _, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RepositoryProvider for RecordingProvider {
    async fn check_permission(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        username: &str,
    ) -> Result<bool, Error> {
        self.record(Call::CheckPermission(username.to_string()));
        self.permission.ok_or(Error::ApiError())
    }

    async fn count_pull_request_commits(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        pr_number: u64,
    ) -> Result<u64, Error> {
        self.record(Call::CountCommits(pr_number));
        self.commit_count.ok_or(Error::ApiError())
    }

    async fn count_linked_pull_requests(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        issue_number: u64,
    ) -> Result<u64, Error> {
        self.record(Call::CountLinkedPullRequests(issue_number));
        self.linked_pull_requests.ok_or(Error::InvalidResponse)
    }

    async fn list_labels(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        kind: ItemKind,
        number: u64,
    ) -> Result<Vec<Label>, Error> {
        self.record(Call::ListLabels(kind, number));
        self.item_labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| Label::from(l.as_str())).collect())
            .ok_or(Error::ApiError())
    }

    async fn list_repository_labels(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
    ) -> Result<Vec<Label>, Error> {
        self.record(Call::ListRepositoryLabels);
        self.repository_labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| Label::from(l.as_str())).collect())
            .ok_or(Error::ApiError())
    }

    async fn add_labels(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        kind: ItemKind,
        number: u64,
        labels: &[String],
    ) -> Result<(), Error> {
        self.record(Call::AddLabels(kind, number, labels.to_vec()));
        if self.fail_add_labels {
            return Err(Error::FailedToUpdateItem("Failed to add labels".to_string()));
        }
        Ok(())
    }

    async fn remove_labels(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        kind: ItemKind,
        number: u64,
        labels: &[String],
    ) -> Result<(), Error> {
        self.record(Call::RemoveLabels(kind, number, labels.to_vec()));
        if self.fail_remove_labels {
            return Err(Error::FailedToUpdateItem(
                "Failed to remove labels".to_string(),
            ));
        }
        Ok(())
    }

    async fn set_state(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        kind: ItemKind,
        number: u64,
        state: ItemState,
    ) -> Result<(), Error> {
        self.record(Call::SetState(kind, number, state));
        if self.fail_set_state {
            return Err(Error::FailedToUpdateItem("Failed to set state".to_string()));
        }
        Ok(())
    }

    async fn add_comment(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        kind: ItemKind,
        number: u64,
        comment: &str,
    ) -> Result<(), Error> {
        self.record(Call::AddComment(kind, number, comment.to_string()));
        if self.fail_add_comment {
            return Err(Error::FailedToUpdateItem("Failed to add comment".to_string()));
        }
        Ok(())
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// A validated configuration covering the `owner` organization.
pub fn bot_configuration(policy: RepositoryPolicy) -> BotConfiguration {
    let mut config = BotConfiguration {
        config_items: vec![policy],
        squash_commit_label: "stat/needs-squash".to_string(),
        user_mark_format: "@__login__".to_string(),
        comment_command_trigger: "Please push again to re-run the checks.".to_string(),
        comment_remove_labels_when_pr_source_code_updated: "Removed __labels__ after the update."
            .to_string(),
        comment_label_command_conflict: "__commenter__ conflict: **__labels__**".to_string(),
        comment_update_label_failed: "__commenter__ failed to update __labels__".to_string(),
        comment_add_not_exist_label: "__commenter__ unknown labels __labels__".to_string(),
        comment_no_permission_operate_issue: "__commenter__ can not __action__ this issue"
            .to_string(),
        comment_no_permission_operate_pr: "__commenter__ can not __action__ this pull request"
            .to_string(),
        comment_issue_needs_link_pr: "__commenter__ link a pull request first".to_string(),
        comment_list_linking_pull_requests_failure: "__commenter__ please try again".to_string(),
    };
    config.validate().unwrap();
    config
}

/// A policy for the `owner` organization with everything turned off.
pub fn policy() -> RepositoryPolicy {
    RepositoryPolicy {
        repos: strings(&["owner"]),
        ..Default::default()
    }
}
