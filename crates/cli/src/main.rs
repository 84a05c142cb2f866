//! # Repo Steward CLI
//!
//! Hosts the Repo Steward bot and offers tools to check its configuration.
//!
//! # Commands
//!
//! - `serve` - Receive GitHub webhooks and apply the bot's label and state changes
//! - `config validate` - Check a bot configuration file and summarize its policies
//! - `parse-comment` - Show which commands the bot would find in a comment
//!
//! # Examples
//!
//! ```bash
//! # Serve webhooks using ./repo-steward.toml
//! repo-steward serve
//!
//! # Check a bot configuration
//! repo-steward config validate --path bot.toml
//!
//! # Try out a comment
//! echo "/kind bug" | repo-steward parse-comment
//! ```

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use tracing::{error, info, instrument};

/// Command implementations for the CLI.
mod commands;

/// Configuration management for the CLI.
mod config;

/// Error types specific to the CLI.
mod errors;

use commands::{config_cmd::ConfigCommands, parse_comment::ParseCommentArgs, serve::ServeArgs};
use errors::CliError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command-line interface structure for Repo Steward.
///
/// This struct defines the top-level CLI interface using clap's derive API.
/// It includes global options like verbose logging and the main command structure.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the Repo Steward CLI.
#[derive(Subcommand)]
enum Commands {
    /// Receive GitHub webhooks and process them
    Serve(ServeArgs),

    /// Manage the bot configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show the commands found in a comment
    #[command(name = "parse-comment")]
    ParseComment(ParseCommentArgs),
}

/// Main entry point for the Repo Steward CLI.
///
/// Initializes logging from the `REPO_STEWARD_LOG` environment variable, parses the
/// command line and dispatches to the selected command.
///
/// # Errors
///
/// Returns the `CliError` of the failed command. Its variant selects the exit code of the
/// process.
#[tokio::main]
#[instrument]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("REPO_STEWARD_LOG"))
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Serve(args) => {
            if let Err(e) = commands::serve::execute(args).await {
                error!("Error serving webhooks: {}", e);
                return Err(e);
            }
        }
        Commands::Config(cmd) => {
            if let Err(e) = commands::config_cmd::execute(cmd).await {
                error!("Error executing config command: {}", e);
                return Err(e);
            }
        }
        Commands::ParseComment(args) => {
            if let Err(e) = commands::parse_comment::execute(args).await {
                error!("Error parsing comment: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
