#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for developer platform operations.
///
/// Every capability of a [`crate::RepositoryProvider`] reports failure through this enum.
/// The bot never retries a failed call, so the variants mostly exist to make the logs
/// useful when an operator needs to work out why a label or comment did not show up.
///
/// # Examples
///
/// ```rust
/// use repo_steward_developer_platforms::errors::Error;
///
/// let rate_limit = Error::RateLimitExceeded;
/// assert_eq!(rate_limit.to_string(), "Rate limit exceeded");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic API request failure.
    ///
    /// Used when the platform rejected the call and nothing more specific is known.
    #[error("API request failed")]
    ApiError(),

    /// Authentication failed with the platform.
    ///
    /// The string parameter contains additional details about the authentication failure.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Failed to create app access token for repository.
    ///
    /// Parameters: repository owner, repository name, installation ID
    #[error("Failed to create an app access token for repository: {0}/{1}. For installation with ID: {2}")]
    FailedToCreateAccessToken(String, String, u64),

    /// Failed to update an issue or pull request.
    ///
    /// This covers label changes, comments and state transitions. The string parameter
    /// names the operation that failed.
    #[error("Failed to update the issue or pull request: {0}")]
    FailedToUpdateItem(String),

    /// The response from the platform could not be interpreted.
    #[error("Invalid response format")]
    InvalidResponse,

    /// Platform rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}
