//! Location choice and permission prompts for the local backend
//!
//! Both are async traits so that a terminal, a GUI dialog, or a test can
//! answer them. The backend never talks to a human directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Access level requested on a storage root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Listing and reading only
    Read,
    /// Full access, including create, write, and delete
    #[default]
    ReadWrite,
}

impl AccessMode {
    pub fn allows_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ReadWrite => "readwrite",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory chosen as storage root, with the access asked for it.
///
/// This is also the persisted form of a local storage:
/// `{"root": "...", "access": "read" | "readwrite"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub root: PathBuf,
    #[serde(default)]
    pub access: AccessMode,
}

impl Location {
    pub fn new(root: impl Into<PathBuf>, access: AccessMode) -> Self {
        Self {
            root: root.into(),
            access,
        }
    }
}

/// Chooses the directory a new local storage is rooted at.
#[async_trait]
pub trait LocationPicker: Send + Sync {
    /// The chosen location, or `None` when the choice was cancelled.
    async fn pick(&self) -> Option<Location>;
}

/// Asks whether access to an already known location may be used.
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    async fn confirm(&self, location: &Location) -> bool;
}

/// Picker that always answers with the same location.
#[derive(Debug, Clone)]
pub struct FixedLocation(pub Location);

#[async_trait]
impl LocationPicker for FixedLocation {
    async fn pick(&self) -> Option<Location> {
        Some(self.0.clone())
    }
}

/// Picker that never chooses anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationPicker for NoLocation {
    async fn pick(&self) -> Option<Location> {
        None
    }
}

/// Prompt answering every request with the same decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoAnswer(pub bool);

impl AutoAnswer {
    pub const GRANT: Self = Self(true);
    pub const DECLINE: Self = Self(false);
}

#[async_trait]
impl PermissionPrompt for AutoAnswer {
    async fn confirm(&self, _location: &Location) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_mode_uses_config_spelling() {
        assert_eq!(serde_json::to_value(AccessMode::Read).unwrap(), json!("read"));
        assert_eq!(
            serde_json::to_value(AccessMode::ReadWrite).unwrap(),
            json!("readwrite")
        );
        assert_eq!(AccessMode::ReadWrite.to_string(), "readwrite");
    }

    #[test]
    fn location_defaults_to_read_write() {
        let location: Location = serde_json::from_value(json!({"root": "/srv/designs"})).unwrap();
        assert_eq!(location.access, AccessMode::ReadWrite);
        assert!(location.access.allows_write());
        assert!(!AccessMode::Read.allows_write());
    }
}
