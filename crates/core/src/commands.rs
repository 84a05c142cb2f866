//! # Commands
//!
//! Slash commands that collaborators can leave in issue and pull request comments.
//!
//! Label commands occupy a whole line of the comment, for example `/kind bug` or
//! `/remove-priority high`. The `reopen` and `close` commands change the state of the
//! item the comment was left on.

use lazy_static::lazy_static;
use regex::Regex;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

/// Label categories that can be added or removed through comment commands
pub const LABEL_CATEGORIES: [&str; 4] = ["kind", "priority", "sig", "good"];

lazy_static! {
    /// Pre-compiled regex for commands that add a label, e.g. `/kind bug`
    pub static ref ADD_LABEL_COMMAND_REGEX: Regex = Regex::new(
        r"^/(kind|priority|sig|good)[\t ]+([A-Za-z0-9_-]+)$"
    ).expect("Failed to compile add label command regex");

    /// Pre-compiled regex for commands that remove a label, e.g. `/remove-kind bug`
    pub static ref REMOVE_LABEL_COMMAND_REGEX: Regex = Regex::new(
        r"^/remove-(kind|priority|sig|good)[\t ]+([A-Za-z0-9_-]+)$"
    ).expect("Failed to compile remove label command regex");

    /// Pre-compiled regex for the reopen command
    pub static ref REOPEN_COMMAND_REGEX: Regex =
        Regex::new(r"(?mi)^/reopen\s*$").expect("Failed to compile reopen command regex");

    /// Pre-compiled regex for the close command
    pub static ref CLOSE_COMMAND_REGEX: Regex =
        Regex::new(r"(?mi)^/close\s*$").expect("Failed to compile close command regex");
}

/// The labels requested by the commands found in a single comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCommands {
    /// Canonical names of the labels to add, in the order they were requested
    pub to_add: Vec<String>,

    /// Canonical names of the labels to remove, in the order they were requested
    pub to_remove: Vec<String>,
}

impl LabelCommands {
    /// Returns `true` when the comment contained no label commands at all.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Builds the canonical label name for a category and value.
///
/// The `good` category joins its value without a separator so `/good first-issue`
/// produces `goodfirst-issue`. Every other category uses a slash, `kind/bug`.
pub fn canonical_label(category: &str, value: &str) -> String {
    if category == "good" {
        format!("{}{}", category, value)
    } else {
        format!("{}/{}", category, value)
    }
}

/// Extracts the label commands from a comment body.
///
/// Every line is trimmed and matched on its own. Lines that are not well formed commands
/// are ignored, so `/kind bug fix` or `/kind` request nothing. Labels are reported in the
/// order they appear, a label requested twice is reported twice.
///
/// # Examples
///
/// ```
/// use repo_steward_core::commands::parse_label_commands;
///
/// let commands = parse_label_commands("/kind bug\n/remove-priority low\nthanks!");
/// assert_eq!(commands.to_add, vec!["kind/bug".to_string()]);
/// assert_eq!(commands.to_remove, vec!["priority/low".to_string()]);
/// ```
pub fn parse_label_commands(comment: &str) -> LabelCommands {
    let mut commands = LabelCommands::default();

    for line in comment.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        if let Some(captures) = ADD_LABEL_COMMAND_REGEX.captures(line) {
            commands
                .to_add
                .push(canonical_label(&captures[1], &captures[2]));
        } else if let Some(captures) = REMOVE_LABEL_COMMAND_REGEX.captures(line) {
            commands
                .to_remove
                .push(canonical_label(&captures[1], &captures[2]));
        }
    }

    commands
}

/// Returns `true` if any line of the comment is a `/reopen` command.
pub fn is_reopen_command(comment: &str) -> bool {
    REOPEN_COMMAND_REGEX.is_match(comment)
}

/// Returns `true` if any line of the comment is a `/close` command.
pub fn is_close_command(comment: &str) -> bool {
    CLOSE_COMMAND_REGEX.is_match(comment)
}
