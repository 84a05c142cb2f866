/// Bot configuration commands
pub mod config_cmd;
/// Dry run of comment commands
pub mod parse_comment;
/// Webhook server
pub mod serve;
