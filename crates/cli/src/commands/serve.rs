use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use axum_macros::debug_handler;
use clap::Args;
use hmac::{Hmac, Mac};
use octocrab::Octocrab;
use repo_steward_core::config::{load_bot_configuration, ConfigStore};
use repo_steward_core::events::parse_github_webhook;
use repo_steward_core::{RepoSteward, HANDLED_CATEGORIES};
use repo_steward_developer_platforms::github::{
    authenticate_with_access_token, create_app_client, create_token_client, GitHubProvider,
};
use sha2::Sha256;
use std::fs;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{get_config_path, read_secret_file, AppConfig, AuthMethod};
use crate::errors::CliError;

#[cfg(test)]
#[path = "serve_tests.rs"]
mod tests;

/// Header holding the HMAC-SHA256 signature of a webhook delivery
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Header holding the name of the webhook event
pub const EVENT_HEADER: &str = "x-github-event";

/// The GitHub client used to build a provider for each delivery
pub enum GitHubClient {
    /// A client authenticated with a personal access token, shared by every delivery
    Token(Octocrab),

    /// A GitHub App client, exchanged for an installation client per delivery
    App(Octocrab),
}

impl GitHubClient {
    /// Creates a provider that can act on the repository of a delivery.
    async fn provider_for(
        &self,
        installation_id: Option<u64>,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<GitHubProvider, StatusCode> {
        match self {
            GitHubClient::Token(client) => Ok(GitHubProvider::new(client.clone())),
            GitHubClient::App(client) => {
                let Some(installation_id) = installation_id else {
                    warn!(
                        repository_owner = repo_owner,
                        repository = repo_name,
                        "Web hook payload did not include installation information. Cannot process changes."
                    );
                    return Err(StatusCode::BAD_REQUEST);
                };

                let api_with_token =
                    authenticate_with_access_token(client, installation_id, repo_owner, repo_name)
                        .await
                        .map_err(|e| {
                            error!(
                                repository_owner = repo_owner,
                                repository = repo_name,
                                error = e.to_string(),
                                "Failed to authenticate with GitHub"
                            );
                            StatusCode::UNAUTHORIZED
                        })?;
                Ok(GitHubProvider::new(api_with_token))
            }
        }
    }
}

/// Shared state of the webhook server
pub struct AppState {
    /// Client used to act on repositories
    pub client: GitHubClient,

    /// The active bot configuration
    pub config_store: Arc<ConfigStore>,

    /// Secret GitHub signs deliveries with
    pub webhook_secret: String,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Alternate config file
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Creates the GitHub client selected by the authentication configuration.
///
/// # Errors
///
/// Returns a `CliError` when the credentials named in the configuration are missing, can
/// not be read, or are refused while building the client.
fn create_github_client(config: &AppConfig) -> Result<GitHubClient, CliError> {
    let auth = &config.authentication;
    debug!(auth_method = auth.auth_method.as_str(), "Creating GitHub client");

    match auth.auth_method {
        AuthMethod::Token => {
            let token_file = auth.token_file.as_deref().ok_or_else(|| {
                CliError::ConfigError(
                    "token_file must be set when using token authentication".to_string(),
                )
            })?;
            let token = read_secret_file(token_file, auth.delete_token_file_after_read)?;
            let client = create_token_client(&token)
                .map_err(|e| CliError::AuthError(format!("Failed to create the client: {}", e)))?;
            Ok(GitHubClient::Token(client))
        }
        AuthMethod::App => {
            let app_id = auth.app_id.ok_or_else(|| {
                CliError::ConfigError("app_id must be set when using app authentication".to_string())
            })?;
            let key_path = auth.private_key_path.as_deref().ok_or_else(|| {
                CliError::ConfigError(
                    "private_key_path must be set when using app authentication".to_string(),
                )
            })?;
            let app_key = fs::read_to_string(key_path).map_err(|e| {
                CliError::ConfigError(format!(
                    "Failed to load the app key from the provided file: {}",
                    e
                ))
            })?;

            let client = create_app_client(app_id, &app_key).map_err(|e| {
                CliError::AuthError(format!(
                    "Failed to load the GitHub provider. Error was: {}",
                    e
                ))
            })?;
            Ok(GitHubClient::App(client))
        }
    }
}

/// Reads the webhook secret named in the configuration.
fn retrieve_webhook_secret(config: &AppConfig) -> Result<String, CliError> {
    debug!(message = "Retrieving webhook secret");
    let path = config
        .authentication
        .webhook_secret_file
        .as_deref()
        .ok_or_else(|| CliError::ConfigError("webhook_secret_file must be set".to_string()))?;

    read_secret_file(path, false)
}

/// Builds the router serving webhook deliveries on `path`.
pub fn router(state: Arc<AppState>, path: &str) -> Router {
    Router::new()
        .route(path, post(handle_webhook))
        .with_state(state)
}

/// Executes the `serve` command.
///
/// Loads the host configuration and the bot configuration, authenticates with GitHub and
/// serves webhook deliveries until the process is stopped. On unix a `SIGHUP` reloads the
/// bot configuration.
///
/// # Errors
///
/// Returns a `CliError` if a configuration can not be loaded, authentication fails or the
/// server can not listen on the configured port.
#[instrument]
pub async fn execute(args: ServeArgs) -> Result<(), CliError> {
    let config_path = get_config_path(args.config.as_deref());
    let config = AppConfig::load(&config_path)?;

    let bot_config = load_bot_configuration(&config.policy_path)?;
    let config_store = Arc::new(ConfigStore::new(bot_config));

    let client = create_github_client(&config)?;
    let webhook_secret = retrieve_webhook_secret(&config)?;

    #[cfg(unix)]
    spawn_policy_reloader(config_store.clone(), config.policy_path.clone())?;

    let state = Arc::new(AppState {
        client,
        config_store,
        webhook_secret,
    });

    let addr = format!("0.0.0.0:{}", config.webhooks.port);
    let app = router(state, &config.webhooks.path);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::NetworkError(format!("Failed to listen on {}: {}", addr, e)))?;

    info!(
        address = addr,
        path = config.webhooks.path,
        categories = ?HANDLED_CATEGORIES,
        "Listening for webhooks"
    );
    axum::serve(listener, app)
        .await
        .map_err(|e| CliError::NetworkError(format!("The webhook server failed: {}", e)))?;

    Ok(())
}

/// Reloads the bot configuration every time the process receives `SIGHUP`.
#[cfg(unix)]
fn spawn_policy_reloader(
    config_store: Arc<ConfigStore>,
    policy_path: std::path::PathBuf,
) -> Result<(), CliError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())
        .map_err(|e| CliError::Other(format!("Failed to listen for SIGHUP: {}", e)))?;

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!(path = %policy_path.display(), "Reloading bot configuration");
            if let Err(e) = config_store.reload_from_file(&policy_path) {
                error!(
                    path = %policy_path.display(),
                    error = e.to_string(),
                    "Failed to reload the bot configuration, keeping the active one"
                );
            }
        }
    });

    Ok(())
}

/// Handles a single webhook delivery.
#[debug_handler]
#[instrument(skip(state, headers, body))]
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    info!("Received webhook call from Github");

    if !verify_github_signature(&state.webhook_secret, &headers, &body) {
        warn!("Webhook did not have valid signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let Some(event_name) = headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok()) else {
        warn!("Webhook did not name the event");
        return Err(StatusCode::BAD_REQUEST);
    };

    let webhook = match parse_github_webhook(event_name, &body) {
        Ok(Some(webhook)) => webhook,
        Ok(None) => {
            info!(event = event_name, "Event does not need processing");
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            error!(
                event = event_name,
                error = e.to_string(),
                "Could not extract webhook payload from request body"
            );
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let event = webhook.event;
    if !HANDLED_CATEGORIES.contains(&event.category()) {
        info!(category = %event.category(), "No handler registered for the event");
        return Ok(StatusCode::OK);
    }

    let provider = state
        .client
        .provider_for(webhook.installation_id, event.repo_owner(), event.repo_name())
        .await?;

    let config = state.config_store.snapshot();
    let steward = RepoSteward::new(provider);
    let outcome = steward.process_event(&config, &event).await;

    debug!(outcome = ?outcome, "Finished processing webhook");
    Ok(StatusCode::OK)
}

/// Checks the HMAC-SHA256 signature GitHub attaches to a delivery.
fn verify_github_signature(secret: &str, headers: &HeaderMap, payload: &[u8]) -> bool {
    let prefix = "sha256=";

    let signature_header = match headers.get(SIGNATURE_HEADER) {
        Some(value) => value.to_str().unwrap_or(""),
        None => return false,
    };

    let Some(received_sig) = signature_header.strip_prefix(prefix) else {
        error!("Missing 'sha256=' prefix in signature header");
        return false;
    };

    let received_bytes = match hex::decode(received_sig) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to decode signature: {:?}", e);
            return false;
        }
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);

    mac.verify_slice(&received_bytes).is_ok()
}
