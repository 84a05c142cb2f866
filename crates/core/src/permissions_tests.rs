use crate::test_support::{Call, RecordingProvider};

use super::*;

#[tokio::test]
async fn test_author_is_granted_without_a_request() {
    let provider = RecordingProvider::new();

    let check = check_commenter_permission(&provider, "owner", "repo", "Octocat", "octocat").await;

    assert_eq!(check, PermissionCheck::Granted);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_other_commenters_need_write_access() {
    let mut provider = RecordingProvider::new();

    let check = check_commenter_permission(&provider, "owner", "repo", "author", "maintainer").await;
    assert_eq!(check, PermissionCheck::Granted);

    provider.permission = Some(false);
    let check = check_commenter_permission(&provider, "owner", "repo", "author", "stranger").await;
    assert_eq!(check, PermissionCheck::Denied);

    assert_eq!(
        provider.calls(),
        vec![
            Call::CheckPermission("maintainer".to_string()),
            Call::CheckPermission("stranger".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_failed_request_is_inconclusive() {
    let mut provider = RecordingProvider::new();
    provider.permission = None;

    let check = check_commenter_permission(&provider, "owner", "repo", "author", "maintainer").await;

    assert_eq!(check, PermissionCheck::Inconclusive);
}

#[tokio::test]
async fn test_empty_author_never_matches() {
    let mut provider = RecordingProvider::new();
    provider.permission = Some(false);

    let check = check_commenter_permission(&provider, "owner", "repo", "", "").await;

    assert_eq!(check, PermissionCheck::Denied);
}

#[tokio::test]
async fn test_collaborator_permission_always_asks() {
    let provider = RecordingProvider::new();

    let check = check_collaborator_permission(&provider, "owner", "repo", "author").await;

    assert_eq!(check, PermissionCheck::Granted);
    assert_eq!(provider.calls(), vec![Call::CheckPermission("author".to_string())]);
}
