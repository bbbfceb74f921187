//! The backend root: identity, permission gate, and path resolution.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{Backend, ConfigMap};
use crate::entry::{Directory, Entry, File};
use crate::kind::{ProviderDescriptor, ProviderKind};
use crate::name::join_path;
use crate::{Error, Result};

/// A storage root owning one tree of entries.
///
/// Storages are shared as `Arc<Storage<B>>`; every entry carries a clone of
/// that `Arc` to reach the backend. The root handle is resolved on first use
/// and reused afterwards.
pub struct Storage<B: Backend> {
    id: Uuid,
    backend: B,
    root: Mutex<Option<B::DirHandle>>,
}

impl<B: Backend> Storage<B> {
    /// Create a storage with a freshly generated id.
    pub fn new(backend: B) -> Arc<Self> {
        Self::with_id(Uuid::new_v4(), backend)
    }

    /// Create a storage with a known id, e.g. when restoring configuration.
    pub fn with_id(id: Uuid, backend: B) -> Arc<Self> {
        Arc::new(Self {
            id,
            backend,
            root: Mutex::new(None),
        })
    }

    /// Rebuild a storage from a persisted id and connection parameters.
    pub fn restore(id: Uuid, backend: B, data: &ConfigMap) -> Result<Arc<Self>> {
        let storage = Self::with_id(id, backend);
        storage.deserialize(data)?;
        Ok(storage)
    }

    /// Type-level facts of the backend.
    pub fn descriptor() -> ProviderDescriptor {
        B::DESCRIPTOR
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ProviderKind {
        B::DESCRIPTOR.kind
    }

    pub fn display_name(&self) -> &'static str {
        B::DESCRIPTOR.display_name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn serialize(&self) -> ConfigMap {
        self.backend.serialize()
    }

    /// Restore connection parameters. Any cached root is dropped.
    pub fn deserialize(&self, data: &ConfigMap) -> Result<()> {
        self.backend.deserialize(data)?;
        self.forget_root();
        Ok(())
    }

    pub async fn has_permission(&self) -> bool {
        self.backend.has_permission().await
    }

    pub async fn request_permission(&self) -> bool {
        if self.backend.has_permission().await {
            return true;
        }
        let granted = self.backend.request_permission().await;
        info!(
            storage = %self.id,
            kind = %self.kind(),
            granted,
            "Permission requested"
        );
        granted
    }

    /// Run the backend's first-time setup. Any cached root is dropped.
    pub async fn add(&self) -> Result<()> {
        self.backend.add().await?;
        self.forget_root();
        info!(storage = %self.id, kind = %self.kind(), "Storage added");
        Ok(())
    }

    fn forget_root(&self) {
        *self.root.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The top-level directory, resolved on first call.
    pub async fn root(self: &Arc<Self>) -> Result<Directory<B>> {
        let cached = self
            .root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let handle = match cached {
            Some(handle) => handle,
            None => {
                debug!(storage = %self.id, "Resolving root directory");
                let handle = self.backend.root().await?;
                *self.root.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle.clone());
                handle
            }
        };

        Ok(Directory::new(Arc::clone(self), None, handle))
    }

    /// Resolve a path of names to a file.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when a segment does not exist,
    /// - [`Error::NotADirectory`] when an intermediate segment is a file,
    /// - [`Error::NotAFile`] when the final segment is a directory.
    ///
    /// # Panics
    ///
    /// Panics when `path` is empty; callers always name at least one
    /// segment.
    pub async fn entry<S: AsRef<str>>(self: &Arc<Self>, path: &[S]) -> Result<File<B>> {
        assert!(!path.is_empty(), "Storage::entry requires a non-empty path");

        match self.resolve(path).await? {
            Entry::File(file) => Ok(file),
            Entry::Directory(_) => Err(Error::NotAFile {
                name: path[path.len() - 1].as_ref().to_string(),
                path: join_path(path),
            }),
        }
    }

    /// Resolve a path of names to whatever entry it names. The empty path
    /// resolves to the root directory.
    pub async fn resolve<S: AsRef<str>>(self: &Arc<Self>, path: &[S]) -> Result<Entry<B>> {
        let mut current = Entry::Directory(self.root().await?);

        for segment in path {
            let segment = segment.as_ref();
            let dir = match current {
                Entry::Directory(dir) => dir,
                Entry::File(file) => {
                    return Err(Error::NotADirectory {
                        name: file.name(),
                        path: join_path(path),
                    });
                }
            };

            current = dir
                .entry(segment, false)
                .await?
                .ok_or_else(|| Error::NotFound {
                    name: segment.to_string(),
                    path: join_path(path),
                })?;
        }

        Ok(current)
    }
}

impl<B: Backend> fmt::Debug for Storage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}
