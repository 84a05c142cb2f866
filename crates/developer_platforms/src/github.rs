use async_trait::async_trait;
use jsonwebtoken::EncodingKey;
use octocrab::{Octocrab, Page};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    errors::Error,
    models::{ItemKind, ItemState, Label},
    RepositoryProvider,
};

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;

/// Repository permission levels that allow a user to operate on issues and pull requests.
const WRITE_PERMISSIONS: [&str; 3] = ["admin", "maintain", "write"];

const LINKED_PULL_REQUESTS_QUERY: &str = r#"
query($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    issue(number: $number) {
      closedByPullRequestsReferences(first: 1, includeClosedPrs: true) {
        totalCount
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct CollaboratorPermission {
    permission: String,
    #[serde(default)]
    role_name: Option<String>,
}

impl CollaboratorPermission {
    fn allows_write(&self) -> bool {
        WRITE_PERMISSIONS.contains(&self.permission.as_str())
            || self
                .role_name
                .as_deref()
                .is_some_and(|role| WRITE_PERMISSIONS.contains(&role))
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestCommitCount {
    commits: u64,
}

/// Authenticates with GitHub using an installation access token for a specific app installation.
///
/// # Arguments
///
/// * `octocrab` - A client authenticated as the GitHub App.
/// * `installation_id` - The ID of the GitHub App installation.
/// * `repository_owner` - The owner of the repository associated with the installation.
/// * `source_repository` - The name of the repository associated with the installation.
///
/// # Errors
///
/// Returns [`Error::FailedToCreateAccessToken`] when GitHub refuses to issue a token for
/// the installation.
#[instrument(skip(octocrab))]
pub async fn authenticate_with_access_token(
    octocrab: &Octocrab,
    installation_id: u64,
    repository_owner: &str,
    source_repository: &str,
) -> Result<Octocrab, Error> {
    debug!(
        repository_owner = repository_owner,
        repository = source_repository,
        installation_id,
        "Finding installation"
    );

    let (api_with_token, _) = octocrab
        .installation_and_token(installation_id.into())
        .await
        .map_err(|e| {
            log_octocrab_error("Failed to create a token for the installation", e);
            Error::FailedToCreateAccessToken(
                repository_owner.to_string(),
                source_repository.to_string(),
                installation_id,
            )
        })?;

    info!(
        repository_owner = repository_owner,
        repository = source_repository,
        installation_id,
        "Created access token for installation",
    );

    Ok(api_with_token)
}

/// Creates an `Octocrab` client authenticated as a GitHub App.
///
/// # Arguments
///
/// * `app_id` - The ID of the GitHub App.
/// * `private_key` - The private key associated with the GitHub App, in PEM format.
#[instrument(skip(private_key))]
pub fn create_app_client(app_id: u64, private_key: &str) -> Result<Octocrab, Error> {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
        Error::AuthError(format!(
            "Failed to translate the private key. Error was: {}",
            e
        ))
    })?;

    let octocrab = Octocrab::builder()
        .app(app_id.into(), key)
        .build()
        .map_err(|_| Error::AuthError("Failed to build the GitHub App client.".to_string()))?;

    info!(app_id, "Created client for the GitHub app");
    Ok(octocrab)
}

/// Creates an `Octocrab` client authenticated with a personal access token.
#[instrument(skip(token))]
pub fn create_token_client(token: &str) -> Result<Octocrab, Error> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|_| Error::AuthError("Failed to build the token client.".to_string()))
}

fn log_octocrab_error(message: &str, e: octocrab::Error) -> Error {
    match e {
        octocrab::Error::GitHub { source, backtrace } => {
            let err = *source;
            error!(
                error_message = err.message,
                status_code = err.status_code.as_u16(),
                backtrace = backtrace.to_string(),
                "{}. Received an error from GitHub",
                message
            );

            if err.status_code.as_u16() == 429 || err.message.to_lowercase().contains("rate limit")
            {
                return Error::RateLimitExceeded;
            }
        }
        octocrab::Error::UriParse { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        octocrab::Error::Uri { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        octocrab::Error::InvalidHeaderValue { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. One of the header values was invalid.",
            message
        ),
        octocrab::Error::Serde { .. } | octocrab::Error::Json { .. } => {
            error!(
                error_message = e.to_string(),
                "{}. Failed to deserialize the response.",
                message
            );
            return Error::InvalidResponse;
        }
        _ => error!(error_message = e.to_string(), message),
    };

    Error::ApiError()
}

fn issue_route(repo_owner: &str, repo_name: &str, kind: ItemKind, number: u64) -> String {
    match kind {
        ItemKind::Issue => format!("/repos/{}/{}/issues/{}", repo_owner, repo_name, number),
        ItemKind::PullRequest => format!("/repos/{}/{}/pulls/{}", repo_owner, repo_name, number),
    }
}

/// [`RepositoryProvider`] backed by the GitHub REST and GraphQL APIs.
#[derive(Debug, Default)]
pub struct GitHubProvider {
    client: Octocrab,
}

impl GitHubProvider {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Follows the pagination links of a label listing. A failed page fails the whole listing.
    async fn collect_labels(
        &self,
        mut current_page: Page<octocrab::models::Label>,
        message: &str,
    ) -> Result<Vec<Label>, Error> {
        let mut labels = current_page.take_items();
        loop {
            match self
                .client
                .get_page::<octocrab::models::Label>(&current_page.next)
                .await
            {
                Ok(Some(mut new_page)) => {
                    labels.extend(new_page.take_items());
                    current_page = new_page;
                }
                Ok(None) => break,
                Err(e) => return Err(log_octocrab_error(message, e)),
            }
        }

        Ok(labels.into_iter().map(|l| Label { name: l.name }).collect())
    }
}

#[async_trait]
impl RepositoryProvider for GitHubProvider {
    #[instrument(skip(self))]
    async fn check_permission(
        &self,
        repo_owner: &str,
        repo_name: &str,
        username: &str,
    ) -> Result<bool, Error> {
        let route = format!(
            "/repos/{}/{}/collaborators/{}/permission",
            repo_owner,
            repo_name,
            urlencoding::encode(username)
        );

        let permission: CollaboratorPermission = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(|e| log_octocrab_error("Failed to get collaborator permission", e))?;

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            user = username,
            permission = permission.permission.as_str(),
            "Retrieved collaborator permission"
        );

        Ok(permission.allows_write())
    }

    #[instrument(skip(self))]
    async fn count_pull_request_commits(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<u64, Error> {
        let route = issue_route(repo_owner, repo_name, ItemKind::PullRequest, pr_number);
        let pr: PullRequestCommitCount = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(|e| log_octocrab_error("Failed to get pull request information", e))?;

        Ok(pr.commits)
    }

    #[instrument(skip(self))]
    async fn count_linked_pull_requests(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
    ) -> Result<u64, Error> {
        let payload = json!({
            "query": LINKED_PULL_REQUESTS_QUERY,
            "variables": {
                "owner": repo_owner,
                "name": repo_name,
                "number": issue_number,
            }
        });

        let response: Value = self
            .client
            .graphql(&payload)
            .await
            .map_err(|e| log_octocrab_error("Failed to query linked pull requests", e))?;

        response
            .pointer("/data/repository/issue/closedByPullRequestsReferences/totalCount")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                warn!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    issue = issue_number,
                    errors = response.get("errors").map(|e| e.to_string()),
                    "Linked pull request query returned no count"
                );
                Error::InvalidResponse
            })
    }

    #[instrument(skip(self))]
    async fn list_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
    ) -> Result<Vec<Label>, Error> {
        // Pull request labels are served by the issues API as well.
        let mut current_page = self
            .client
            .issues(repo_owner, repo_name)
            .list_labels_for_issue(number)
            .per_page(100)
            .send()
            .await
            .map_err(|e| log_octocrab_error("Failed to list labels", e))?;

        let labels = self
            .collect_labels(current_page, "Failed to list labels")
            .await?;
        debug!(kind = %kind, count = labels.len(), "Listed labels");

        Ok(labels)
    }

    #[instrument(skip(self))]
    async fn list_repository_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Vec<Label>, Error> {
        let mut current_page = self
            .client
            .issues(repo_owner, repo_name)
            .list_labels_for_repo()
            .per_page(100)
            .send()
            .await
            .map_err(|e| log_octocrab_error("Failed to list repository labels", e))?;

        self.collect_labels(current_page, "Failed to list repository labels")
            .await
    }

    #[instrument(skip(self))]
    async fn add_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        labels: &[String],
    ) -> Result<(), Error> {
        match self
            .client
            .issues(repo_owner, repo_name)
            .add_labels(number, labels)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                log_octocrab_error("Failed to add new labels", e);
                Err(Error::FailedToUpdateItem(format!(
                    "Failed to add labels to {} {}",
                    kind, number
                )))
            }
        }
    }

    #[instrument(skip(self))]
    async fn remove_labels(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        labels: &[String],
    ) -> Result<(), Error> {
        let mut failed = Vec::new();
        for label in labels {
            let route = format!(
                "/repos/{}/{}/issues/{}/labels/{}",
                repo_owner,
                repo_name,
                number,
                urlencoding::encode(label)
            );

            if let Err(e) = self.client.delete::<Value, _, _>(route, None::<&()>).await {
                log_octocrab_error("Failed to remove label", e);
                failed.push(label.as_str());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::FailedToUpdateItem(format!(
                "Failed to remove labels from {} {}: {}",
                kind,
                number,
                failed.join(", ")
            )))
        }
    }

    #[instrument(skip(self))]
    async fn set_state(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        state: ItemState,
    ) -> Result<(), Error> {
        let route = issue_route(repo_owner, repo_name, kind, number);
        let body = json!({ "state": state.as_str() });

        match self.client.patch::<Value, _, _>(route, Some(&body)).await {
            Ok(_) => Ok(()),
            Err(e) => {
                log_octocrab_error("Failed to change state", e);
                Err(Error::FailedToUpdateItem(format!(
                    "Failed to change the {} state to {}",
                    kind, state
                )))
            }
        }
    }

    #[instrument(skip(self, comment))]
    async fn add_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        kind: ItemKind,
        number: u64,
        comment: &str,
    ) -> Result<(), Error> {
        match self
            .client
            .issues(repo_owner, repo_name)
            .create_comment(number, comment)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                log_octocrab_error("Failed to add comment", e);
                Err(Error::FailedToUpdateItem(format!(
                    "Failed to add comment to {} {}",
                    kind, number
                )))
            }
        }
    }
}
