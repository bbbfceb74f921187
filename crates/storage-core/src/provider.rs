//! Type-erased view of a storage, for heterogeneous collections.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{Backend, ConfigMap};
use crate::entry::Entry;
use crate::kind::{EntryKind, ProviderDescriptor};
use crate::storage::Storage;
use crate::{Error, Result};

/// Name and kind of a listed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub name: String,
    pub kind: EntryKind,
}

/// Object-safe operations over any `Storage<B>`.
///
/// Paths are sequences of names from the root, as in
/// [`Storage::entry`]. Unlike `Storage::entry`, an empty path is accepted
/// everywhere and names the root directory, since these calls are driven by
/// user input.
#[async_trait]
pub trait StorageProvider: Send + Sync + fmt::Debug {
    fn id(&self) -> Uuid;

    fn descriptor(&self) -> ProviderDescriptor;

    fn serialize(&self) -> ConfigMap;

    fn deserialize(&self, data: &ConfigMap) -> Result<()>;

    async fn has_permission(&self) -> bool;

    async fn request_permission(&self) -> bool;

    async fn add(&self) -> Result<()>;

    /// Print the whole tree from the root.
    async fn print_tree(&self, sink: &mut (dyn fmt::Write + Send)) -> Result<()>;

    /// Name and kind of the entry at `path`; the empty path is the root.
    async fn stat(&self, path: &[String]) -> Result<EntrySummary>;

    /// List a directory, with `force` passed through to the backend.
    async fn list(&self, path: &[String], force: bool) -> Result<Vec<EntrySummary>>;

    async fn read_text(&self, path: &[String]) -> Result<String>;

    async fn write_text(&self, path: &[String], content: &str) -> Result<()>;

    /// Create the last segment of `path` inside the directory named by the
    /// preceding segments.
    async fn create(&self, path: &[String], kind: EntryKind) -> Result<()>;

    async fn remove(&self, path: &[String]) -> Result<()>;
}

impl<B: Backend> Storage<B> {
    /// Erase the backend type.
    pub fn into_provider(self: Arc<Self>) -> Arc<dyn StorageProvider> {
        Arc::new(self)
    }
}

fn root_is_not_a_file() -> Error {
    Error::NotAFile {
        name: "/".to_string(),
        path: String::new(),
    }
}

#[async_trait]
impl<B: Backend> StorageProvider for Arc<Storage<B>> {
    fn id(&self) -> Uuid {
        Storage::id(self)
    }

    fn descriptor(&self) -> ProviderDescriptor {
        B::DESCRIPTOR
    }

    fn serialize(&self) -> ConfigMap {
        Storage::serialize(self)
    }

    fn deserialize(&self, data: &ConfigMap) -> Result<()> {
        Storage::deserialize(self, data)
    }

    async fn has_permission(&self) -> bool {
        Storage::has_permission(self).await
    }

    async fn request_permission(&self) -> bool {
        Storage::request_permission(self).await
    }

    async fn add(&self) -> Result<()> {
        Storage::add(self).await
    }

    async fn print_tree(&self, sink: &mut (dyn fmt::Write + Send)) -> Result<()> {
        self.root().await?.print(sink).await
    }

    async fn stat(&self, path: &[String]) -> Result<EntrySummary> {
        let entry = self.resolve(path).await?;
        Ok(EntrySummary {
            name: entry.name(),
            kind: entry.kind(),
        })
    }

    async fn list(&self, path: &[String], force: bool) -> Result<Vec<EntrySummary>> {
        let dir = match self.resolve(path).await? {
            Entry::Directory(dir) => dir,
            Entry::File(file) => {
                return Err(Error::NotADirectory {
                    name: file.name(),
                    path: crate::name::join_path(path),
                });
            }
        };

        Ok(dir
            .entries(force)
            .await?
            .iter()
            .map(|entry| EntrySummary {
                name: entry.name(),
                kind: entry.kind(),
            })
            .collect())
    }

    async fn read_text(&self, path: &[String]) -> Result<String> {
        if path.is_empty() {
            return Err(root_is_not_a_file());
        }
        self.entry(path).await?.read().await
    }

    async fn write_text(&self, path: &[String], content: &str) -> Result<()> {
        if path.is_empty() {
            return Err(root_is_not_a_file());
        }
        self.entry(path).await?.write(content).await
    }

    async fn create(&self, path: &[String], kind: EntryKind) -> Result<()> {
        let Some((name, parent)) = path.split_last() else {
            return Err(Error::InvalidName {
                name: String::new(),
            });
        };

        let parent = match self.resolve(parent).await? {
            Entry::Directory(dir) => dir,
            Entry::File(file) => {
                return Err(Error::NotADirectory {
                    name: file.name(),
                    path: crate::name::join_path(path),
                });
            }
        };

        match kind {
            EntryKind::Directory => parent.create_directory(name).await.map(drop),
            EntryKind::File => parent.create_file(name).await.map(drop),
        }
    }

    async fn remove(&self, path: &[String]) -> Result<()> {
        self.resolve(path).await?.delete().await
    }
}
