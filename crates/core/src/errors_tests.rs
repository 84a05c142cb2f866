use super::*;
use std::error::Error as StdError;

#[test]
fn test_missing_fields_lists_every_field() {
    let err = ConfigLoadError::MissingFields(vec!["squash_commit_label", "user_mark_format"]);

    assert_eq!(
        err.to_string(),
        "missing the following config: squash_commit_label, user_mark_format"
    );
}

#[test]
fn test_empty_repositories_message() {
    let err = ConfigLoadError::EmptyRepositories;

    assert_eq!(
        err.to_string(),
        "the repositories configuration can not be empty"
    );
}

#[test]
fn test_conflicting_repositories_message() {
    let err = ConfigLoadError::ConflictingRepositories(vec![
        "owner1".to_string(),
        "owner2/repo1".to_string(),
    ]);

    assert_eq!(
        err.to_string(),
        "some org or org/repo exists in both repos and excluded_repos: owner1, owner2/repo1"
    );
}

#[test]
fn test_invalid_regex_keeps_source() {
    let source = regex::Regex::new("(").unwrap_err();
    let err = ConfigLoadError::InvalidRegex {
        pattern: "(".to_string(),
        source,
    };

    assert!(err.to_string().starts_with("Invalid clear_labels_by_regexp '('"));
    assert!(err.source().is_some());
}

#[test]
fn test_not_found_message() {
    let err = ConfigLoadError::NotFound("bot.toml".to_string());

    assert_eq!(err.to_string(), "Configuration file not found: bot.toml");
}

#[test]
fn test_steward_error_wraps_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: StewardError = json_err.into();

    assert!(err.to_string().starts_with("Invalid webhook payload:"));
}
