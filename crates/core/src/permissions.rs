//! Permission checks for commands that change an issue or pull request.

use repo_steward_developer_platforms::RepositoryProvider;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;

/// The result of checking whether a user may run a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCheck {
    Granted,
    Denied,

    /// The permission could not be determined, the command must not run
    Inconclusive,
}

/// Checks whether `commenter` may operate on an item written by `author`.
///
/// The author of an issue or pull request may always operate on it, anybody else needs
/// write access to the repository.
pub async fn check_commenter_permission<P: RepositoryProvider + ?Sized>(
    provider: &P,
    repo_owner: &str,
    repo_name: &str,
    author: &str,
    commenter: &str,
) -> PermissionCheck {
    if !author.is_empty() && author.eq_ignore_ascii_case(commenter) {
        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            commenter = commenter,
            "Commenter is the author of the item"
        );
        return PermissionCheck::Granted;
    }

    check_collaborator_permission(provider, repo_owner, repo_name, commenter).await
}

/// Asks the platform whether `username` has write access to the repository.
pub async fn check_collaborator_permission<P: RepositoryProvider + ?Sized>(
    provider: &P,
    repo_owner: &str,
    repo_name: &str,
    username: &str,
) -> PermissionCheck {
    match provider
        .check_permission(repo_owner, repo_name, username)
        .await
    {
        Ok(true) => PermissionCheck::Granted,
        Ok(false) => {
            debug!(
                repository_owner = repo_owner,
                repository = repo_name,
                user = username,
                "User does not have write access"
            );
            PermissionCheck::Denied
        }
        Err(e) => {
            warn!(
                repository_owner = repo_owner,
                repository = repo_name,
                user = username,
                error = e.to_string(),
                "Failed to check the permission of the user"
            );
            PermissionCheck::Inconclusive
        }
    }
}
