//! # Models
//!
//! Data models shared between the bot core and the platform implementations.
//!
//! The webhook shaped types (`Repository`, `Installation`, `User`) mirror the subset of
//! the platform payloads the bot reads. Unknown fields are ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// The kind of item a comment or label operation targets.
///
/// Issues and pull requests share most of their API surface, but some operations (state
/// changes in particular) are routed to different endpoints depending on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Issue => write!(f, "issue"),
            ItemKind::PullRequest => write!(f, "pull request"),
        }
    }
}

/// Lifecycle state of an issue or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

impl ItemState {
    /// The value the platform API expects for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Open => "open",
            ItemState::Closed => "closed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a label on an issue, a pull request or a repository.
///
/// # Examples
///
/// ```
/// use repo_steward_developer_platforms::models::Label;
///
/// let label = Label {
///     name: "kind/bug".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// The name of the label
    pub name: String,
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label {
            name: name.to_string(),
        }
    }
}

/// A platform account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
}

/// The repository a webhook event originated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name without the owner, e.g. `hello-world`
    pub name: String,

    /// Full name including the owner, e.g. `octocat/hello-world`
    pub full_name: String,

    /// The account that owns the repository
    pub owner: User,
}

impl Repository {
    /// Returns the owner login, preferring the owner object and falling back to the
    /// prefix of the full name.
    pub fn owner_login(&self) -> &str {
        if !self.owner.login.is_empty() {
            return &self.owner.login;
        }

        self.full_name
            .split_once('/')
            .map(|(owner, _)| owner)
            .unwrap_or_default()
    }
}

/// The app installation a webhook event was delivered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub id: u64,
}
