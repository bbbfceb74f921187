//! Failures surfaced by the `storage` binary

pub type Result<T> = std::result::Result<T, CliError>;

/// Everything a command can fail with. `main` prints the message and exits
/// with status 1.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Storage(#[from] storage_core::Error),

    #[error(transparent)]
    Content(#[from] storage_core::ContentError),

    /// Reading stdin
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// A confirmation was answered with no
    #[error("{action} cancelled by user.")]
    Cancelled { action: &'static str },

    /// Bad input that no lower layer reports, e.g. an unknown storage id
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    pub fn cancelled(action: &'static str) -> Self {
        Self::Cancelled { action }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_their_message() {
        let err = CliError::from(storage_core::Error::RootDeletion);
        assert_eq!(
            err.to_string(),
            "The root directory of a storage cannot be deleted"
        );
    }

    #[test]
    fn cancellation_names_the_action() {
        assert_eq!(CliError::cancelled("Removal").to_string(), "Removal cancelled by user.");
    }
}
