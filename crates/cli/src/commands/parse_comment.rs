use clap::Args;
use repo_steward_core::commands::{is_close_command, is_reopen_command, parse_label_commands};
use repo_steward_core::labels::find_conflicts;
use std::fmt::Write;
use std::path::PathBuf;
use std::{fs, io};
use tracing::debug;

use crate::errors::CliError;

#[cfg(test)]
#[path = "parse_comment_tests.rs"]
mod tests;

/// Arguments for the parse-comment command
#[derive(Args, Debug)]
pub struct ParseCommentArgs {
    /// File holding the comment body. The body is read from stdin when omitted
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Executes the `parse-comment` command.
///
/// Shows what the bot would do with a comment without touching any repository.
pub async fn execute(args: ParseCommentArgs) -> Result<(), CliError> {
    let body = match &args.file {
        Some(path) => {
            debug!("Reading comment from {:?}", path);
            fs::read_to_string(path).map_err(|e| {
                CliError::InvalidArguments(format!("Failed to read {:?}: {}", path, e))
            })?
        }
        None => io::read_to_string(io::stdin())
            .map_err(|e| CliError::Other(format!("Failed to read the comment from stdin: {}", e)))?,
    };

    print!("{}", describe_comment(&body));
    Ok(())
}

/// Describes the commands found in a comment body.
pub fn describe_comment(body: &str) -> String {
    let commands = parse_label_commands(body);
    let mut report = String::new();

    let _ = writeln!(report, "Add: {}", list_or_none(&commands.to_add));
    let _ = writeln!(report, "Remove: {}", list_or_none(&commands.to_remove));

    if let Some(conflict) = find_conflicts(&commands.to_add, &commands.to_remove) {
        let _ = writeln!(report, "Conflict: {}", conflict.labels.join(", "));
    }
    if is_reopen_command(body) {
        let _ = writeln!(report, "Reopen requested");
    }
    if is_close_command(body) {
        let _ = writeln!(report, "Close requested");
    }

    report
}

/// Joins labels for display
fn list_or_none(labels: &[String]) -> String {
    if labels.is_empty() {
        "(none)".to_string()
    } else {
        labels.join(", ")
    }
}
