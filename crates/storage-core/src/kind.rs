//! Entry and provider discriminators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an entry is a container or a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Directory,
    File,
}

impl EntryKind {
    /// One-letter tag used by tree printing.
    pub fn tag(self) -> char {
        match self {
            Self::Directory => 'D',
            Self::File => 'F',
        }
    }
}

/// Backend discriminator persisted alongside every storage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// A sandboxed directory on the local filesystem
    Local,
    /// An ephemeral in-process tree
    Memory,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Local, ProviderKind::Memory];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Memory => "memory",
        }
    }

    /// Parse the lowercase form used in configuration and on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-level facts a backend registers about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    /// Human-readable backend family name (e.g. "Local")
    pub display_name: &'static str,
}

impl ProviderDescriptor {
    pub const fn new(kind: ProviderKind, display_name: &'static str) -> Self {
        Self { kind, display_name }
    }

    /// Label for the "add this backend" action.
    pub fn add_prompt(&self) -> String {
        format!("Add {} storage", self.display_name)
    }
}
