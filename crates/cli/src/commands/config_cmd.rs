use clap::Subcommand;
use repo_steward_core::config::{load_bot_configuration, BotConfiguration, RepositoryPolicy};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{get_config_path, AppConfig};
use crate::errors::CliError;

#[cfg(test)]
#[path = "config_cmd_tests.rs"]
mod tests;

/// Subcommands for the config command
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Check a bot configuration file and summarize its policies
    Validate {
        /// Path to the bot configuration file. Defaults to the `policy_path` of the host
        /// configuration in the current directory
        #[arg(short, long)]
        path: Option<String>,
    },
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { path } => validate_config(path.as_deref()),
    }
}

/// Validate a bot configuration file
fn validate_config(path: Option<&str>) -> Result<(), CliError> {
    let policy_path = match path {
        Some(p) => PathBuf::from(p),
        None => AppConfig::load(&get_config_path(None))?.policy_path,
    };
    debug!("Validating configuration at {:?}", policy_path);

    let config = load_bot_configuration(&policy_path)?;

    println!("Configuration is valid");
    print!("{}", summarize(&config));
    Ok(())
}

/// Describes the policies of a validated configuration, one block per policy.
pub fn summarize(config: &BotConfiguration) -> String {
    let mut summary = String::new();
    let _ = writeln!(summary, "Squash label: {}", config.squash_commit_label);
    let _ = writeln!(summary, "Policies: {}", config.config_items.len());

    for (index, policy) in config.config_items.iter().enumerate() {
        let _ = writeln!(summary, "  [{}] repos: {}", index + 1, policy.repos.join(", "));
        if !policy.excluded_repos.is_empty() {
            let _ = writeln!(summary, "      excluded: {}", policy.excluded_repos.join(", "));
        }
        let _ = writeln!(summary, "      squash check: {}", describe_squash(policy));
        if policy.clears_labels() {
            let _ = writeln!(
                summary,
                "      cleared on push: {}",
                describe_cleared_labels(policy)
            );
        }
        let _ = writeln!(
            summary,
            "      collaborators create labels: {}",
            yes_no(policy.allow_creating_labels_by_collaborator)
        );
        let _ = writeln!(
            summary,
            "      closing issues needs a linked pull request: {}",
            yes_no(policy.need_issue_has_link_pull_requests)
        );
    }

    summary
}

/// Describes the squash settings of a policy
fn describe_squash(policy: &RepositoryPolicy) -> String {
    if policy.unable_checking_squash {
        "disabled".to_string()
    } else {
        format!("more than {} commit(s)", policy.commits_threshold)
    }
}

/// Describes the labels a policy clears when new commits are pushed
fn describe_cleared_labels(policy: &RepositoryPolicy) -> String {
    let mut parts: Vec<String> = policy.clear_labels.clone();
    if !policy.clear_labels_by_regexp.is_empty() {
        parts.push(format!("/{}/", policy.clear_labels_by_regexp));
    }
    parts.join(", ")
}

/// Renders a flag for humans
fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
