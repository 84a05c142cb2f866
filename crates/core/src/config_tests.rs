use indoc::indoc;
use std::io::Write;
use tempfile::NamedTempFile;

use super::*;

const VALID_CONFIGURATION: &str = indoc! {r#"
    squash_commit_label = "stat/needs-squash"
    user_mark_format = "@__login__"
    comment_command_trigger = "Please trigger the bot again with `/check-pr`."
    comment_remove_labels_when_pr_source_code_updated = "New code was pushed, removed: __labels__"
    comment_label_command_conflict = "__commenter__ conflicting labels: **__labels__**"
    comment_update_label_failed = "__commenter__ failed to update: __labels__"
    comment_add_not_exist_label = "__commenter__ these labels do not exist: __labels__"
    comment_no_permission_operate_issue = "__commenter__ you can not __action__ this issue"
    comment_no_permission_operate_pr = "__commenter__ you can not __action__ this pull request"
    comment_issue_needs_link_pr = "__commenter__ link a pull request before closing"
    comment_list_linking_pull_requests_failure = "__commenter__ please try again"

    [[config_items]]
    repos = ["owner1", "owner2/repo1"]
    excluded_repos = ["owner1/private"]
    clear_labels = ["lgtm", "approved"]
    clear_labels_by_regexp = "^ci/"
    allow_creating_labels_by_collaborator = true
    need_issue_has_link_pull_requests = true
    commits_threshold = 3

    [[config_items]]
    repos = ["owner2"]
    unable_checking_squash = true
"#};

#[test]
fn test_from_toml_str_valid_configuration() {
    let config = BotConfiguration::from_toml_str(VALID_CONFIGURATION).unwrap();

    assert_eq!(config.squash_commit_label, "stat/needs-squash");
    assert_eq!(config.config_items.len(), 2);

    let first = &config.config_items[0];
    assert_eq!(first.repos, vec!["owner1", "owner2/repo1"]);
    assert_eq!(first.clear_labels, vec!["lgtm", "approved"]);
    assert!(first.clear_labels_regex().unwrap().is_match("ci/passed"));
    assert!(first.allow_creating_labels_by_collaborator);
    assert!(first.need_issue_has_link_pull_requests);
    assert_eq!(first.commits_threshold, 3);

    let second = &config.config_items[1];
    assert!(second.unable_checking_squash);
    assert!(second.clear_labels_regex().is_none());
    assert_eq!(second.commits_threshold, DEFAULT_COMMITS_THRESHOLD);
}

#[test]
fn test_from_toml_str_reports_missing_fields_in_order() {
    let toml = indoc! {r#"
        squash_commit_label = "stat/needs-squash"
        comment_command_trigger = "trigger"
        comment_remove_labels_when_pr_source_code_updated = "removed"
        comment_label_command_conflict = "conflict"
        comment_add_not_exist_label = "not exist"
        comment_no_permission_operate_issue = "no permission"
        comment_no_permission_operate_pr = "no permission"
        comment_issue_needs_link_pr = "link"
        comment_list_linking_pull_requests_failure = "failure"
    "#};

    let err = BotConfiguration::from_toml_str(toml).unwrap_err();

    assert_eq!(
        err.to_string(),
        "missing the following config: user_mark_format, comment_update_label_failed"
    );
}

#[test]
fn test_from_toml_str_blank_field_is_missing() {
    let toml = VALID_CONFIGURATION.replace(
        r#"squash_commit_label = "stat/needs-squash""#,
        r#"squash_commit_label = "   ""#,
    );

    let err = BotConfiguration::from_toml_str(&toml).unwrap_err();

    assert!(matches!(err, ConfigLoadError::MissingFields(ref fields) if fields == &vec!["squash_commit_label"]));
}

#[test]
fn test_from_toml_str_rejects_empty_repos() {
    let toml = VALID_CONFIGURATION.replace(r#"repos = ["owner2"]"#, "repos = []");

    let err = BotConfiguration::from_toml_str(&toml).unwrap_err();

    assert!(matches!(err, ConfigLoadError::EmptyRepositories));
}

#[test]
fn test_from_toml_str_rejects_repository_in_both_lists() {
    let toml = VALID_CONFIGURATION.replace(
        r#"excluded_repos = ["owner1/private"]"#,
        r#"excluded_repos = ["owner2/repo1", "owner1"]"#,
    );

    let err = BotConfiguration::from_toml_str(&toml).unwrap_err();

    assert_eq!(
        err.to_string(),
        "some org or org/repo exists in both repos and excluded_repos: owner1, owner2/repo1"
    );
}

#[test]
fn test_from_toml_str_rejects_invalid_regex() {
    let toml = VALID_CONFIGURATION.replace(r#""^ci/""#, r#""ci/(""#);

    let err = BotConfiguration::from_toml_str(&toml).unwrap_err();

    assert!(matches!(err, ConfigLoadError::InvalidRegex { ref pattern, .. } if pattern == "ci/("));
}

#[test]
fn test_from_toml_str_rejects_malformed_toml() {
    let err = BotConfiguration::from_toml_str("squash_commit_label = ").unwrap_err();

    assert!(matches!(err, ConfigLoadError::Parse(_)));
}

#[test]
fn test_applies_to() {
    let policy = RepositoryPolicy {
        repos: vec!["owner1".to_string(), "owner2/repo1".to_string()],
        excluded_repos: vec!["owner1/private".to_string()],
        ..Default::default()
    };

    assert!(policy.applies_to("owner1", "owner1/repo"));
    assert!(policy.applies_to("owner2", "owner2/repo1"));

    assert!(!policy.applies_to("owner1", "owner1/private"));
    assert!(!policy.applies_to("owner2", "owner2/repo2"));
    assert!(!policy.applies_to("owner3", "owner3/repo1"));
    assert!(!policy.applies_to("", "/repo1"));
}

#[test]
fn test_applies_to_excluded_org_wins() {
    let policy = RepositoryPolicy {
        repos: vec!["owner1/repo1".to_string()],
        excluded_repos: vec!["owner1".to_string()],
        ..Default::default()
    };

    assert!(!policy.applies_to("owner1", "owner1/repo1"));
}

#[test]
fn test_policy_for_returns_first_match() {
    let config = BotConfiguration::from_toml_str(VALID_CONFIGURATION).unwrap();

    let policy = config.policy_for("owner2", "repo1").unwrap();
    assert_eq!(policy.commits_threshold, 3);

    let policy = config.policy_for("owner2", "repo2").unwrap();
    assert!(policy.unable_checking_squash);

    assert!(config.policy_for("owner1", "private").is_none());
    assert!(config.policy_for("unknown", "repo").is_none());
}

#[test]
fn test_clears_labels() {
    let mut policy = RepositoryPolicy {
        repos: vec!["owner1".to_string()],
        ..Default::default()
    };
    policy.validate().unwrap();
    assert!(!policy.clears_labels());

    policy.clear_labels_by_regexp = "^lgtm$".to_string();
    policy.validate().unwrap();
    assert!(policy.clears_labels());
}

#[test]
fn test_load_bot_configuration_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(VALID_CONFIGURATION.as_bytes()).unwrap();

    let config = load_bot_configuration(file.path()).unwrap();

    assert_eq!(config.user_mark_format, "@__login__");
}

#[test]
fn test_load_bot_configuration_missing_file() {
    let err = load_bot_configuration("/does/not/exist/bot.toml").unwrap_err();

    assert!(matches!(err, ConfigLoadError::NotFound(ref path) if path == "/does/not/exist/bot.toml"));
}

#[test]
fn test_config_store_replace_keeps_existing_snapshots() {
    let store = ConfigStore::new(BotConfiguration::from_toml_str(VALID_CONFIGURATION).unwrap());
    let before = store.snapshot();

    let mut updated = (*before).clone();
    updated.squash_commit_label = "needs-squash".to_string();
    let previous = store.replace(updated);

    assert_eq!(previous.squash_commit_label, "stat/needs-squash");
    assert_eq!(before.squash_commit_label, "stat/needs-squash");
    assert_eq!(store.snapshot().squash_commit_label, "needs-squash");
}

#[test]
fn test_config_store_reload_failure_keeps_active_configuration() {
    let store = ConfigStore::new(BotConfiguration::from_toml_str(VALID_CONFIGURATION).unwrap());

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"squash_commit_label = \"only\"").unwrap();

    assert!(store.reload_from_file(file.path()).is_err());
    assert_eq!(store.snapshot().squash_commit_label, "stat/needs-squash");
}

#[test]
fn test_config_store_reload_notifies_subscribers() {
    let store = ConfigStore::new(BotConfiguration::default());
    let mut receiver = store.subscribe();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(VALID_CONFIGURATION.as_bytes()).unwrap();
    store.reload_from_file(file.path()).unwrap();

    assert!(receiver.has_changed().unwrap());
    assert_eq!(
        receiver.borrow_and_update().squash_commit_label,
        "stat/needs-squash"
    );
}
