use thiserror::Error;

/// Errors produced by this crate. Transport failures stay in the layers
/// that own them (the Slack adapter reports through `anyhow`, the
/// prediction client through its own error enum); what remains here is
/// what can fail before the first event is handled.
#[derive(Debug, Error)]
pub enum HeronError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HeronError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_the_key() {
        let err = HeronError::Config("slack.bot_token must be set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: slack.bot_token must be set"
        );
    }
}
