use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::CliError;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "repo-steward.toml";

/// Default route on which GitHub delivers webhooks
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/repo_steward";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Configuration for the Repo Steward host process
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the bot configuration with the repository policies and comment templates
    pub policy_path: PathBuf,

    /// How the bot authenticates with GitHub
    #[serde(default)]
    pub authentication: AuthenticationConfig,

    /// Where webhooks are received
    #[serde(default)]
    pub webhooks: WebHookConfig,
}

impl AppConfig {
    /// Load configuration from the specified file
    ///
    /// A relative `policy_path` is resolved against the directory of the configuration file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(CliError::ConfigError(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CliError::ConfigError(format!("Failed to read configuration file: {}", e))
        })?;

        let mut config: AppConfig = toml::from_str(&content).map_err(|e| {
            CliError::ConfigError(format!("Failed to parse configuration file: {}", e))
        })?;

        if config.policy_path.is_relative() {
            if let Some(parent) = path.parent() {
                config.policy_path = parent.join(&config.policy_path);
            }
        }

        info!(
            policy_path = %config.policy_path.display(),
            auth_method = config.authentication.auth_method.as_str(),
            port = config.webhooks.port,
            "Loaded host configuration"
        );
        Ok(config)
    }
}

/// Supported ways to authenticate with GitHub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// A personal access token read from `token_file`
    Token,

    /// A GitHub App, authenticated per installation
    App,
}

impl AuthMethod {
    /// The name used for the method in the configuration file
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Token => "token",
            AuthMethod::App => "app",
        }
    }
}

/// Authentication settings
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    /// The authentication method
    #[serde(default = "AuthenticationConfig::default_auth_method")]
    pub auth_method: AuthMethod,

    /// File holding the personal access token
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Deletes the token file once the token has been read
    #[serde(default)]
    pub delete_token_file_after_read: bool,

    /// ID of the GitHub App
    #[serde(default)]
    pub app_id: Option<u64>,

    /// File holding the PEM encoded private key of the GitHub App
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// File holding the secret GitHub signs webhook deliveries with
    #[serde(default)]
    pub webhook_secret_file: Option<PathBuf>,
}

impl AuthenticationConfig {
    /// The method used when the configuration does not name one
    fn default_auth_method() -> AuthMethod {
        AuthMethod::Token
    }
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            auth_method: AuthenticationConfig::default_auth_method(),
            token_file: None,
            delete_token_file_after_read: false,
            app_id: None,
            private_key_path: None,
            webhook_secret_file: None,
        }
    }
}

/// Configuration for listening to webhook calls
#[derive(Debug, Serialize, Deserialize)]
pub struct WebHookConfig {
    /// The port on which webhooks will be received
    #[serde(default = "default_port")]
    pub port: u16,

    /// The route on which webhooks will be received
    #[serde(default = "default_webhook_path")]
    pub path: String,
}

impl Default for WebHookConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_webhook_path(),
        }
    }
}

/// Get the path to the configuration file
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        // Look for config in current directory
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}

/// Reads a secret from a file, trimming surrounding whitespace.
///
/// The file is removed afterwards when `delete_after_read` is set, a failed removal is only
/// logged.
pub fn read_secret_file(path: &Path, delete_after_read: bool) -> Result<String, CliError> {
    let secret = fs::read_to_string(path)
        .map_err(|e| CliError::AuthError(format!("Failed to read {:?}: {}", path, e)))?
        .trim()
        .to_string();

    if secret.is_empty() {
        return Err(CliError::AuthError(format!("The file {:?} is empty", path)));
    }

    if delete_after_read {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = e.to_string(), "Failed to delete the secret file");
        }
    }

    Ok(secret)
}

/// The port used when the configuration does not name one
fn default_port() -> u16 {
    3100
}

/// The webhook route used when the configuration does not name one
fn default_webhook_path() -> String {
    DEFAULT_WEBHOOK_PATH.to_string()
}
