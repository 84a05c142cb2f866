use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while turning raw platform input into bot events.
///
/// Event processing itself never fails; every problem the bot runs into while handling an
/// event is reported through [`crate::EventOutcome`] instead.
#[derive(Error, Debug)]
pub enum StewardError {
    #[error("Invalid webhook payload: {0}")]
    InvalidWebhookPayload(#[from] serde_json::Error),
}

/// Errors raised while loading or validating the bot configuration.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read the configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse the configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing the following config: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("the repositories configuration can not be empty")]
    EmptyRepositories,

    #[error("some org or org/repo exists in both repos and excluded_repos: {}", .0.join(", "))]
    ConflictingRepositories(Vec<String>),

    #[error("Invalid clear_labels_by_regexp '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
