//! # Events
//!
//! Normalized events the bot handles and their conversion from GitHub webhook payloads.
//!
//! Only the parts of a payload the decision logic needs are kept. Deliveries the bot does
//! not react to, e.g. a pull request being labelled or a comment being edited, normalize to
//! `None`.

use repo_steward_developer_platforms::models::{Installation, ItemKind, ItemState, Repository};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use crate::errors::StewardError;

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

/// GitHub webhook event name for pull request deliveries
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// GitHub webhook event name for comments on issues and pull requests
pub const ISSUE_COMMENT_EVENT: &str = "issue_comment";

/// The categories of events the bot registers handlers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    PullRequest,
    IssueComment,
    PullRequestComment,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::PullRequest => write!(f, "pull-request"),
            EventCategory::IssueComment => write!(f, "issue-comment"),
            EventCategory::PullRequestComment => write!(f, "pull-request-comment"),
        }
    }
}

/// What happened to a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,

    /// New commits were pushed to the source branch
    SourceUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub repo_owner: String,
    pub repo_name: String,
    pub number: u64,
    pub action: PullRequestAction,
    pub author: String,
}

/// A comment created on an issue or a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEvent {
    pub repo_owner: String,
    pub repo_name: String,

    /// Number of the issue or pull request the comment belongs to
    pub number: u64,
    pub kind: ItemKind,

    /// State of the item when the comment was made
    pub state: ItemState,

    /// Login of the author of the issue or pull request
    pub author: String,

    /// Login of the author of the comment
    pub commenter: String,
    pub body: String,
}

/// An event the bot handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PullRequest(PullRequestEvent),
    IssueComment(CommentEvent),
    PullRequestComment(CommentEvent),
}

impl Event {
    pub fn category(&self) -> EventCategory {
        match self {
            Event::PullRequest(_) => EventCategory::PullRequest,
            Event::IssueComment(_) => EventCategory::IssueComment,
            Event::PullRequestComment(_) => EventCategory::PullRequestComment,
        }
    }

    pub fn repo_owner(&self) -> &str {
        match self {
            Event::PullRequest(e) => &e.repo_owner,
            Event::IssueComment(e) | Event::PullRequestComment(e) => &e.repo_owner,
        }
    }

    pub fn repo_name(&self) -> &str {
        match self {
            Event::PullRequest(e) => &e.repo_name,
            Event::IssueComment(e) | Event::PullRequestComment(e) => &e.repo_name,
        }
    }

    pub fn number(&self) -> u64 {
        match self {
            Event::PullRequest(e) => e.number,
            Event::IssueComment(e) | Event::PullRequestComment(e) => e.number,
        }
    }
}

/// A normalized event together with the app installation it was delivered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub event: Event,

    /// Present when the delivery came from a GitHub App installation
    pub installation_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestDetails {
    number: u64,
    user: Account,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: String,
    pull_request: PullRequestDetails,
    repository: Repository,
    installation: Option<Installation>,
}

#[derive(Debug, Deserialize)]
struct IssueDetails {
    number: u64,
    state: ItemState,
    user: Account,

    /// Only present when the issue is a pull request
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CommentDetails {
    body: Option<String>,
    user: Account,
}

#[derive(Debug, Deserialize)]
struct IssueCommentPayload {
    action: String,
    issue: IssueDetails,
    comment: CommentDetails,
    repository: Repository,
    installation: Option<Installation>,
}

/// Normalizes a GitHub webhook delivery.
///
/// # Arguments
///
/// * `event_name` - The value of the `X-GitHub-Event` header
/// * `body` - The raw JSON payload
///
/// # Returns
///
/// `Ok(None)` for deliveries the bot does not handle, an error when the payload of a
/// handled event can not be read.
pub fn parse_github_webhook(
    event_name: &str,
    body: &[u8],
) -> Result<Option<WebhookEvent>, StewardError> {
    match event_name {
        PULL_REQUEST_EVENT => parse_pull_request(body),
        ISSUE_COMMENT_EVENT => parse_issue_comment(body),
        _ => {
            debug!(event_name = event_name, "Ignoring unhandled webhook event");
            Ok(None)
        }
    }
}

fn parse_pull_request(body: &[u8]) -> Result<Option<WebhookEvent>, StewardError> {
    let payload: PullRequestPayload = serde_json::from_slice(body)?;

    let action = match payload.action.as_str() {
        "opened" => PullRequestAction::Opened,
        "synchronize" => PullRequestAction::SourceUpdated,
        other => {
            debug!(action = other, "Ignoring pull request action");
            return Ok(None);
        }
    };

    let event = Event::PullRequest(PullRequestEvent {
        repo_owner: payload.repository.owner_login().to_string(),
        repo_name: payload.repository.name.clone(),
        number: payload.pull_request.number,
        action,
        author: payload.pull_request.user.login,
    });

    Ok(Some(WebhookEvent {
        event,
        installation_id: payload.installation.map(|i| i.id),
    }))
}

fn parse_issue_comment(body: &[u8]) -> Result<Option<WebhookEvent>, StewardError> {
    let payload: IssueCommentPayload = serde_json::from_slice(body)?;

    if payload.action != "created" {
        debug!(action = %payload.action, "Ignoring issue comment action");
        return Ok(None);
    }

    let is_pull_request = payload.issue.pull_request.is_some();
    let comment = CommentEvent {
        repo_owner: payload.repository.owner_login().to_string(),
        repo_name: payload.repository.name.clone(),
        number: payload.issue.number,
        kind: if is_pull_request {
            ItemKind::PullRequest
        } else {
            ItemKind::Issue
        },
        state: payload.issue.state,
        author: payload.issue.user.login,
        commenter: payload.comment.user.login,
        body: payload.comment.body.unwrap_or_default(),
    };

    let event = if is_pull_request {
        Event::PullRequestComment(comment)
    } else {
        Event::IssueComment(comment)
    };

    Ok(Some(WebhookEvent {
        event,
        installation_id: payload.installation.map(|i| i.id),
    }))
}
