//! Error types for storage-core

use std::path::PathBuf;

use crate::kind::ProviderKind;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Operational failures raised by storages and their entries.
///
/// Every variant is recoverable by the caller. Absence of a child is not an
/// error at the [`Directory::entry`](crate::Directory::entry) level; it only
/// becomes [`Error::NotFound`] when a path walk requires the segment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Entry \"{name}\" in path \"{path}\" does not exist.")]
    NotFound { name: String, path: String },

    #[error("Entry \"{name}\" in path \"{path}\" is not a directory.")]
    NotADirectory { name: String, path: String },

    #[error("Entry \"{name}\" in path \"{path}\" is not a file.")]
    NotAFile { name: String, path: String },

    #[error("Entry \"{name}\" already exists in \"{parent}\".")]
    AlreadyExists { name: String, parent: String },

    #[error("Permission denied: cannot {operation} in {storage} storage")]
    PermissionDenied { storage: String, operation: String },

    #[error("Invalid entry name: {name:?}")]
    InvalidName { name: String },

    #[error("The root directory of a storage cannot be deleted")]
    RootDeletion,

    #[error("Entry \"{name}\" is no longer present in its storage")]
    Stale { name: String },

    #[error("File \"{path}\" was modified outside of this session")]
    Conflict { path: String },

    #[error("No backend registered for provider kind {kind}")]
    UnregisteredProvider { kind: ProviderKind },

    #[error("Invalid {kind} storage configuration: {message}")]
    InvalidConfig { kind: ProviderKind, message: String },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Failed to render tree: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Coarse classification of an [`Error`], used to pick a user-facing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Something along the path is absent or no longer exists
    Missing,
    /// A directory was found where a file was required, or vice versa
    WrongType,
    /// A name collision on create
    Exists,
    /// Access rights are missing
    Denied,
    /// Content changed underneath the caller
    Conflict,
    /// Malformed input: names, configuration, registrations
    Invalid,
    /// Lower-level I/O failure
    Io,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn denied(storage: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::PermissionDenied {
            storage: storage.into(),
            operation: operation.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::Stale { .. } => ErrorCategory::Missing,
            Self::NotADirectory { .. } | Self::NotAFile { .. } => ErrorCategory::WrongType,
            Self::AlreadyExists { .. } => ErrorCategory::Exists,
            Self::PermissionDenied { .. } => ErrorCategory::Denied,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::InvalidName { .. }
            | Self::RootDeletion
            | Self::UnregisteredProvider { .. }
            | Self::InvalidConfig { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigSerialize { .. }
            | Self::UnsupportedFormat { .. } => ErrorCategory::Invalid,
            Self::Io { .. } | Self::LockFailed { .. } | Self::Fmt(_) => ErrorCategory::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_segment_and_path() {
        let err = Error::NotFound {
            name: "a".into(),
            path: "a/b".into(),
        };
        assert_eq!(err.to_string(), "Entry \"a\" in path \"a/b\" does not exist.");
        assert_eq!(err.category(), ErrorCategory::Missing);
    }

    #[test]
    fn absent_denied_and_wrong_type_are_distinct() {
        let missing = Error::NotFound {
            name: "x".into(),
            path: "x".into(),
        };
        let denied = Error::denied("Memory", "write");
        let wrong = Error::NotAFile {
            name: "x".into(),
            path: "x".into(),
        };

        assert_ne!(missing.category(), denied.category());
        assert_ne!(denied.category(), wrong.category());
        assert_ne!(missing.category(), wrong.category());
    }

    #[test]
    fn permission_denied_display() {
        let err = Error::denied("Local", "create \"src\"");
        assert!(err.to_string().contains("Local"));
        assert!(err.to_string().contains("create"));
    }
}
