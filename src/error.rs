use thiserror::Error;

/// Errors raised while handling a chat message.
///
/// `Invalid` and `NotFound` are shown to the user as-is. `Internal` is logged
/// and replaced with a generic message.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BotError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn chore_not_found(id: i64) -> Self {
        Self::NotFound(format!("Chore #{} not found.", id))
    }
}

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
