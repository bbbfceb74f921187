//! Loaded file content with external-modification detection
//!
//! A [`Snapshot`] is what an editor holds: the file, the text it was given,
//! and a checksum of that text. Saving compares the checksum against the
//! backend's current content first, so a file changed by another program is
//! reported as [`Error::Conflict`] instead of being silently overwritten.

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::entry::File;
use crate::name::join_path;
use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// A file together with the content observed when it was loaded.
pub struct Snapshot<B: Backend> {
    file: File<B>,
    content: String,
    checksum: String,
}

impl<B: Backend> Snapshot<B> {
    pub(crate) fn new(file: File<B>, content: String) -> Self {
        let checksum = compute_content_checksum(&content);
        Self {
            file,
            content,
            checksum,
        }
    }

    pub fn file(&self) -> &File<B> {
        &self.file
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Whether the backend content still matches this snapshot.
    pub async fn is_current(&self) -> Result<bool> {
        let current = self.file.read().await?;
        Ok(compute_content_checksum(&current) == self.checksum)
    }

    /// Write `content` if the file is unchanged since it was loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] when the backend content no longer
    /// matches the snapshot; nothing is written in that case.
    pub async fn save(&mut self, content: impl Into<String>) -> Result<()> {
        if !self.is_current().await? {
            let path = join_path(&self.file.path());
            warn!(%path, "Refusing to save: file changed externally");
            return Err(Error::Conflict { path });
        }
        self.save_force(content).await
    }

    /// Write `content` unconditionally and adopt it as the new snapshot.
    pub async fn save_force(&mut self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        self.file.write(&content).await?;
        debug!(path = %join_path(&self.file.path()), "Saved snapshot");

        self.checksum = compute_content_checksum(&content);
        self.content = content;
        Ok(())
    }

    /// Re-read the backend content, discarding the held text.
    pub async fn reload(&mut self) -> Result<()> {
        let content = self.file.read().await?;
        self.checksum = compute_content_checksum(&content);
        self.content = content;
        Ok(())
    }
}
