use indoc::indoc;
use proptest::prelude::*;

use super::*;

#[test]
fn test_parse_label_commands_single_add() {
    let commands = parse_label_commands("/kind bug");

    assert_eq!(commands.to_add, vec!["kind/bug".to_string()]);
    assert!(commands.to_remove.is_empty());
}

#[test]
fn test_parse_label_commands_mixed_comment() {
    let comment = indoc! {"
        Looks like a regression to me.

        /kind bug
          /priority high
        /remove-sig docs
        /sig storage extra
        /kind
    "};

    let commands = parse_label_commands(comment);

    assert_eq!(
        commands.to_add,
        vec!["kind/bug".to_string(), "priority/high".to_string()]
    );
    assert_eq!(commands.to_remove, vec!["sig/docs".to_string()]);
}

#[test]
fn test_parse_label_commands_remove_keeps_value_case() {
    let commands = parse_label_commands("/remove-sig Community");

    assert!(commands.to_add.is_empty());
    assert_eq!(commands.to_remove, vec!["sig/Community".to_string()]);
}

#[test]
fn test_parse_label_commands_good_category_has_no_separator() {
    let commands = parse_label_commands("/good  first-issue\n/remove-good help_wanted");

    assert_eq!(commands.to_add, vec!["goodfirst-issue".to_string()]);
    assert_eq!(commands.to_remove, vec!["goodhelp_wanted".to_string()]);
}

#[test]
fn test_parse_label_commands_accepts_tabs_and_crlf() {
    let commands = parse_label_commands("/kind\tfeature\r\n/remove-kind bug\r\n");

    assert_eq!(commands.to_add, vec!["kind/feature".to_string()]);
    assert_eq!(commands.to_remove, vec!["kind/bug".to_string()]);
}

#[test]
fn test_parse_label_commands_ignores_malformed_lines() {
    let malformed = vec![
        "/kind bug fix",       // Trailing word
        "/kind bug!",          // Invalid character
        "/kind",               // Missing value
        "/kindbug",            // Missing separator
        "/area bug",           // Unknown category
        "/KIND bug",           // Category is case sensitive
        "please /kind bug",    // Command not at line start
        "/remove-kind",        // Missing value
        "/remove kind bug",    // Malformed remove prefix
        "/remove-area bug",    // Unknown category
    ];

    for line in malformed {
        let commands = parse_label_commands(line);
        assert!(
            commands.is_empty(),
            "line '{}' should not produce a label command",
            line
        );
    }
}

#[test]
fn test_parse_label_commands_keeps_order_and_duplicates() {
    let commands = parse_label_commands("/sig docs\n/kind bug\n/kind  bug");

    assert_eq!(
        commands.to_add,
        vec![
            "sig/docs".to_string(),
            "kind/bug".to_string(),
            "kind/bug".to_string()
        ]
    );
}

#[test]
fn test_parse_label_commands_same_label_added_and_removed() {
    let commands = parse_label_commands("/kind bug\n/remove-kind bug");

    assert_eq!(commands.to_add, vec!["kind/bug".to_string()]);
    assert_eq!(commands.to_remove, vec!["kind/bug".to_string()]);
}

#[test]
fn test_parse_label_commands_empty_comment() {
    assert!(parse_label_commands("").is_empty());
    assert!(parse_label_commands("\n\n   \n").is_empty());
}

#[test]
fn test_canonical_label() {
    assert_eq!(canonical_label("kind", "bug"), "kind/bug");
    assert_eq!(canonical_label("priority", "high"), "priority/high");
    assert_eq!(canonical_label("sig", "docs"), "sig/docs");
    assert_eq!(canonical_label("good", "first-issue"), "goodfirst-issue");
}

#[test]
fn test_is_reopen_command() {
    assert!(is_reopen_command("/reopen"));
    assert!(is_reopen_command("/REOPEN   "));
    assert!(is_reopen_command("This was fixed too early.\n/reopen\nThanks"));
    assert!(is_reopen_command("/reopen\r\n"));

    assert!(!is_reopen_command("/reopen please"));
    assert!(!is_reopen_command(" /reopen"));
    assert!(!is_reopen_command("please /reopen"));
    assert!(!is_reopen_command("/close"));
}

#[test]
fn test_is_close_command() {
    assert!(is_close_command("/close"));
    assert!(is_close_command("/Close"));
    assert!(is_close_command("Fixed in main.\n/close"));

    assert!(!is_close_command("/closed"));
    assert!(!is_close_command("/close now"));
    assert!(!is_close_command("/reopen"));
}

proptest! {
    #[test]
    fn test_parse_label_commands_add_for_any_value(
        category in prop::sample::select(LABEL_CATEGORIES.to_vec()),
        value in "[A-Za-z0-9_-]{1,20}",
        spacing in "[ \t]{1,4}",
    ) {
        let comment = format!("/{}{}{}", category, spacing, value);
        let commands = parse_label_commands(&comment);

        prop_assert_eq!(commands.to_add, vec![canonical_label(category, &value)]);
        prop_assert!(commands.to_remove.is_empty());
    }

    #[test]
    fn test_parse_label_commands_ignores_lines_without_leading_slash(
        lines in prop::collection::vec("[A-Za-z0-9_.,!?#@-][^\n/]{0,30}(/kind bug)?", 0..6),
    ) {
        let commands = parse_label_commands(&lines.join("\n"));

        prop_assert!(commands.to_add.is_empty());
        prop_assert!(commands.to_remove.is_empty());
    }

    #[test]
    fn test_parse_label_commands_ignores_values_with_invalid_characters(
        category in prop::sample::select(LABEL_CATEGORIES.to_vec()),
        remove in any::<bool>(),
        prefix in "[A-Za-z0-9_-]{0,8}",
        invalid in "[!@#.:/+=~]",
        suffix in "[A-Za-z0-9_-]{0,8}",
    ) {
        let command = if remove { format!("/remove-{}", category) } else { format!("/{}", category) };
        let comment = format!("{} {}{}{}", command, prefix, invalid, suffix);
        let commands = parse_label_commands(&comment);

        prop_assert!(commands.to_add.is_empty());
        prop_assert!(commands.to_remove.is_empty());
    }

    #[test]
    fn test_parse_label_commands_never_panics(comment in "\\PC*") {
        let commands = parse_label_commands(&comment);
        for label in commands.to_add.iter().chain(commands.to_remove.iter()) {
            prop_assert!(!label.is_empty());
        }
    }
}
