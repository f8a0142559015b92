//! Error types for ext-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from ext-manager
    #[error(transparent)]
    Manager(#[from] ext_manager::Error),

    /// JSON rendering error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Attach a hint to errors the user can fix with another command.
    pub fn with_hint(self) -> Self {
        match self {
            CliError::Manager(ext_manager::Error::Persistence(
                ext_store::Error::NotPrepared { path },
            )) => CliError::user(format!(
                "extension ledger {} does not exist; run `extmgr prepare` first",
                path.display()
            )),
            other => other,
        }
    }
}
