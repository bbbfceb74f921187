//! The contract every storage backend implements.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::Result;
use crate::kind::ProviderDescriptor;

/// Backend-specific connection parameters, as persisted in configuration.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// A child handle returned by a backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child<D, F> {
    Directory(D),
    File(F),
}

/// Trait implemented by concrete storage providers.
///
/// The core never looks inside `DirHandle` or `FileHandle`; it only hands
/// them back to the backend that produced them. Handles are cloned freely
/// and never mutated, so they should be cheap descriptors (ids, paths).
///
/// Implementations are shared behind an `Arc` and called through `&self`,
/// so any mutable state (granted permission, chosen location, listing
/// caches) lives behind interior mutability.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    type DirHandle: Clone + Debug + Send + Sync + 'static;
    type FileHandle: Clone + Debug + Send + Sync + 'static;

    /// Provider kind and family name of this backend
    const DESCRIPTOR: ProviderDescriptor;

    /// Display name of a resolved directory.
    fn directory_name(&self, handle: &Self::DirHandle) -> String;

    /// Display name of a resolved file.
    fn file_name(&self, handle: &Self::FileHandle) -> String;

    /// Connection parameters sufficient to rebuild an equivalent backend
    /// without rerunning [`Backend::add`].
    fn serialize(&self) -> ConfigMap;

    /// Restore connection parameters produced by [`Backend::serialize`].
    fn deserialize(&self, data: &ConfigMap) -> Result<()>;

    /// Resolve the top-level directory.
    async fn root(&self) -> Result<Self::DirHandle>;

    /// Side-effect free check of the current access rights.
    async fn has_permission(&self) -> bool;

    /// Ask for access, possibly prompting a human. Must return `true`
    /// without prompting when access is already granted.
    async fn request_permission(&self) -> bool;

    /// Interactive first-time setup.
    async fn add(&self) -> Result<()>;

    /// List the immediate children of `dir`. With `force` the backend must
    /// bypass any listing it cached earlier.
    async fn list(
        &self,
        dir: &Self::DirHandle,
        force: bool,
    ) -> Result<Vec<Child<Self::DirHandle, Self::FileHandle>>>;

    /// Find a single child by exact name.
    async fn lookup(
        &self,
        dir: &Self::DirHandle,
        name: &str,
        force: bool,
    ) -> Result<Option<Child<Self::DirHandle, Self::FileHandle>>> {
        let children = self.list(dir, force).await?;
        Ok(children.into_iter().find(|child| match child {
            Child::Directory(handle) => self.directory_name(handle) == name,
            Child::File(handle) => self.file_name(handle) == name,
        }))
    }

    /// Create an immediate child directory. Fails with
    /// [`Error::AlreadyExists`](crate::Error::AlreadyExists) on collision.
    async fn create_directory(
        &self,
        parent: &Self::DirHandle,
        name: &str,
    ) -> Result<Self::DirHandle>;

    /// Create an empty immediate child file. Fails with
    /// [`Error::AlreadyExists`](crate::Error::AlreadyExists) on collision.
    async fn create_file(&self, parent: &Self::DirHandle, name: &str) -> Result<Self::FileHandle>;

    /// Remove `dir` and everything below it.
    async fn remove_directory(&self, parent: &Self::DirHandle, dir: &Self::DirHandle)
    -> Result<()>;

    async fn remove_file(&self, parent: &Self::DirHandle, file: &Self::FileHandle) -> Result<()>;

    /// Fetch the current text content.
    async fn read(&self, file: &Self::FileHandle) -> Result<String>;

    /// Replace the content wholesale.
    async fn write(&self, file: &Self::FileHandle, content: &str) -> Result<()>;
}
