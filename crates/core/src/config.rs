//! Configuration settings for the Repo Steward bot.
//!
//! The bot configuration is a TOML document holding the comment templates shared by every
//! repository and a list of per repository policies under `config_items`. A policy applies
//! to the organizations and repositories listed in its `repos` key, minus the entries in
//! `excluded_repos`.
//!
//! Configurations are validated once when loaded. A validated configuration is published
//! through a [`ConfigStore`] so that it can be replaced while events are being processed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::errors::ConfigLoadError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Commit threshold used when a policy does not set one
pub const DEFAULT_COMMITS_THRESHOLD: u32 = 1;

/// Top-level configuration for the bot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfiguration {
    /// Repository policies, the first policy that applies to a repository wins
    #[serde(default)]
    pub config_items: Vec<RepositoryPolicy>,

    /// Label that asks for the commits of a pull request to be squashed
    #[serde(default)]
    pub squash_commit_label: String,

    /// Format used to mention a user, `__login__` is replaced by the user login
    #[serde(default)]
    pub user_mark_format: String,

    /// Comment posted when the commits of a pull request can not be counted
    #[serde(default)]
    pub comment_command_trigger: String,

    #[serde(default)]
    pub comment_remove_labels_when_pr_source_code_updated: String,

    #[serde(default)]
    pub comment_label_command_conflict: String,

    #[serde(default)]
    pub comment_update_label_failed: String,

    #[serde(default)]
    pub comment_add_not_exist_label: String,

    #[serde(default)]
    pub comment_no_permission_operate_issue: String,

    #[serde(default)]
    pub comment_no_permission_operate_pr: String,

    #[serde(default)]
    pub comment_issue_needs_link_pr: String,

    #[serde(default)]
    pub comment_list_linking_pull_requests_failure: String,
}

impl BotConfiguration {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigLoadError> {
        let mut config: BotConfiguration = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the first policy that applies to the given repository, if any.
    pub fn policy_for(&self, org: &str, repo: &str) -> Option<&RepositoryPolicy> {
        let org_repo = format!("{}/{}", org, repo);
        self.config_items
            .iter()
            .find(|policy| policy.applies_to(org, &org_repo))
    }

    /// Validates the configuration and fills in the defaults of every policy.
    ///
    /// Required comment templates are checked first, the policies are checked in the
    /// order they are declared.
    pub fn validate(&mut self) -> Result<(), ConfigLoadError> {
        let missing = self.missing_required_fields();
        if !missing.is_empty() {
            return Err(ConfigLoadError::MissingFields(missing));
        }

        for policy in &mut self.config_items {
            policy.validate()?;
        }

        Ok(())
    }

    fn missing_required_fields(&self) -> Vec<&'static str> {
        let required = [
            ("squash_commit_label", &self.squash_commit_label),
            ("user_mark_format", &self.user_mark_format),
            ("comment_command_trigger", &self.comment_command_trigger),
            (
                "comment_remove_labels_when_pr_source_code_updated",
                &self.comment_remove_labels_when_pr_source_code_updated,
            ),
            (
                "comment_label_command_conflict",
                &self.comment_label_command_conflict,
            ),
            (
                "comment_update_label_failed",
                &self.comment_update_label_failed,
            ),
            (
                "comment_add_not_exist_label",
                &self.comment_add_not_exist_label,
            ),
            (
                "comment_no_permission_operate_issue",
                &self.comment_no_permission_operate_issue,
            ),
            (
                "comment_no_permission_operate_pr",
                &self.comment_no_permission_operate_pr,
            ),
            (
                "comment_issue_needs_link_pr",
                &self.comment_issue_needs_link_pr,
            ),
            (
                "comment_list_linking_pull_requests_failure",
                &self.comment_list_linking_pull_requests_failure,
            ),
        ];

        required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Bot behaviour for a set of repositories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryPolicy {
    /// Organizations (`org`) or repositories (`org/repo`) the policy applies to
    #[serde(default)]
    pub repos: Vec<String>,

    /// Organizations or repositories excluded from the policy
    #[serde(default)]
    pub excluded_repos: Vec<String>,

    /// Labels removed from a pull request when new commits are pushed to it
    #[serde(default)]
    pub clear_labels: Vec<String>,

    /// Pattern of the labels removed from a pull request when new commits are pushed to it
    #[serde(default)]
    pub clear_labels_by_regexp: String,

    /// Allows collaborators to add labels that do not exist in the repository yet
    #[serde(default)]
    pub allow_creating_labels_by_collaborator: bool,

    /// Requires an issue to be referenced by a pull request before it can be closed
    #[serde(default)]
    pub need_issue_has_link_pull_requests: bool,

    /// Turns off squash label management
    #[serde(default)]
    pub unable_checking_squash: bool,

    /// Number of commits above which a pull request is labelled for squashing
    #[serde(default)]
    pub commits_threshold: u32,

    #[serde(skip)]
    pub(crate) clear_labels_regex: Option<Regex>,
}

impl RepositoryPolicy {
    /// Determines whether the policy applies to a repository.
    ///
    /// An exclusion of the organization or of the repository always wins over an inclusion.
    pub fn applies_to(&self, org: &str, org_repo: &str) -> bool {
        if org.is_empty() {
            return false;
        }

        let listed = |entries: &[String]| {
            entries
                .iter()
                .any(|entry| entry == org || entry == org_repo)
        };

        if listed(&self.excluded_repos) {
            return false;
        }

        listed(&self.repos)
    }

    /// The compiled form of `clear_labels_by_regexp`, available once the policy is validated.
    pub fn clear_labels_regex(&self) -> Option<&Regex> {
        self.clear_labels_regex.as_ref()
    }

    /// Returns `true` when a push to a pull request may clear some of its labels.
    pub fn clears_labels(&self) -> bool {
        !self.clear_labels.is_empty() || self.clear_labels_regex.is_some()
    }

    /// Validates the policy, compiles its label pattern and fills in the commit threshold.
    pub fn validate(&mut self) -> Result<(), ConfigLoadError> {
        if self.repos.is_empty() {
            return Err(ConfigLoadError::EmptyRepositories);
        }

        let included: HashSet<&str> = self.repos.iter().map(String::as_str).collect();
        let mut conflicts: Vec<String> = self
            .excluded_repos
            .iter()
            .filter(|entry| included.contains(entry.as_str()))
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            conflicts.sort();
            conflicts.dedup();
            return Err(ConfigLoadError::ConflictingRepositories(conflicts));
        }

        self.clear_labels_regex = if self.clear_labels_by_regexp.is_empty() {
            None
        } else {
            let regex = Regex::new(&self.clear_labels_by_regexp).map_err(|source| {
                ConfigLoadError::InvalidRegex {
                    pattern: self.clear_labels_by_regexp.clone(),
                    source,
                }
            })?;
            Some(regex)
        };

        if self.commits_threshold == 0 {
            self.commits_threshold = DEFAULT_COMMITS_THRESHOLD;
        }

        Ok(())
    }
}

/// Loads and validates the bot configuration from a TOML file.
///
/// # Errors
///
/// Returns [`ConfigLoadError::NotFound`] if the file does not exist, a parse error for
/// malformed TOML and a validation error for a configuration that can not be used.
pub fn load_bot_configuration<P: AsRef<Path>>(path: P) -> Result<BotConfiguration, ConfigLoadError> {
    let path_ref = path.as_ref();
    let content = match fs::read_to_string(path_ref) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigLoadError::NotFound(path_ref.display().to_string()));
        }
        Err(e) => return Err(ConfigLoadError::Io(e)),
    };

    let config = BotConfiguration::from_toml_str(&content)?;
    debug!(
        path = %path_ref.display(),
        policies = config.config_items.len(),
        "Loaded bot configuration"
    );
    Ok(config)
}

/// Holds the active bot configuration.
///
/// Readers take a snapshot at the start of every event and keep using it until the event
/// is done, so a replacement never changes the configuration under a running handler.
#[derive(Debug)]
pub struct ConfigStore {
    sender: watch::Sender<Arc<BotConfiguration>>,
}

impl ConfigStore {
    pub fn new(config: BotConfiguration) -> Self {
        let (sender, _) = watch::channel(Arc::new(config));
        Self { sender }
    }

    /// Returns the configuration that is currently active.
    pub fn snapshot(&self) -> Arc<BotConfiguration> {
        self.sender.borrow().clone()
    }

    /// Makes `config` the active configuration and returns the previous one.
    pub fn replace(&self, config: BotConfiguration) -> Arc<BotConfiguration> {
        self.sender.send_replace(Arc::new(config))
    }

    /// Loads a configuration file and activates it.
    ///
    /// The active configuration is left untouched when the file can not be loaded.
    pub fn reload_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigLoadError> {
        let config = load_bot_configuration(path.as_ref())?;
        let policies = config.config_items.len();
        self.replace(config);
        info!(
            path = %path.as_ref().display(),
            policies = policies,
            "Activated new bot configuration"
        );
        Ok(())
    }

    /// Subscribes to configuration changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<BotConfiguration>> {
        self.sender.subscribe()
    }
}
