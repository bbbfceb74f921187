//! In-memory storage backend.
//!
//! Used for scratch trees and testing. All data is ephemeral; only the label
//! is persisted.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use storage_core::{
    Backend, Child, ConfigMap, Error, ProviderDescriptor, ProviderKind, Result, split_path,
};

use crate::tree::{Node, ROOT_ID, ROOT_NAME, Tree};

const DEFAULT_LABEL: &str = "scratch";

/// Handle of an in-memory directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryDir {
    id: u64,
    name: String,
}

/// Handle of an in-memory file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryFile {
    id: u64,
    name: String,
}

/// Counters of backend calls, for observing caching behavior.
#[derive(Debug, Default)]
pub struct MemoryStats {
    reads: AtomicUsize,
    listings: AtomicUsize,
    forced_listings: AtomicUsize,
}

impl MemoryStats {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Listings and single-child lookups.
    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Listings and lookups issued with `force = true`.
    pub fn forced_listings(&self) -> usize {
        self.forced_listings.load(Ordering::SeqCst)
    }

    fn record_listing(&self, force: bool) {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if force {
            self.forced_listings.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// An ephemeral tree held in process memory.
///
/// Thread-safe via internal `RwLock`. Permission is a simple flag: a new
/// backend starts granted unless built with
/// [`MemoryBackend::requiring_permission`], and
/// [`MemoryBackend::revoke`] withdraws it again.
#[derive(Debug)]
pub struct MemoryBackend {
    label: RwLock<String>,
    tree: RwLock<Tree>,
    granted: AtomicBool,
    grant_on_request: AtomicBool,
    read_only: AtomicBool,
    stats: MemoryStats,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// An empty, writable tree with access already granted.
    pub fn new() -> Self {
        Self {
            label: RwLock::new(DEFAULT_LABEL.to_string()),
            tree: RwLock::new(Tree::default()),
            granted: AtomicBool::new(true),
            grant_on_request: AtomicBool::new(true),
            read_only: AtomicBool::new(false),
            stats: MemoryStats::default(),
        }
    }

    /// An empty tree without access; requests are answered with `grant`.
    pub fn requiring_permission(grant: bool) -> Self {
        let backend = Self::new();
        backend.granted.store(false, Ordering::SeqCst);
        backend.grant_on_request.store(grant, Ordering::SeqCst);
        backend
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        *self.label.write().unwrap_or_else(PoisonError::into_inner) = label.into();
        self
    }

    pub fn label(&self) -> String {
        self.label
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Withdraw access, as if the user revoked it.
    pub fn revoke(&self) {
        self.granted.store(false, Ordering::SeqCst);
    }

    /// Decide how future permission requests are answered.
    pub fn set_grant_on_request(&self, grant: bool) {
        self.grant_on_request.store(grant, Ordering::SeqCst);
    }

    /// Deny every mutation while still allowing reads.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn stats(&self) -> &MemoryStats {
        &self.stats
    }

    /// Seed a file at a `/`-separated path, creating missing directories.
    /// Bypasses the permission gate.
    pub fn insert_file(&self, path: &str, content: &str) -> Result<()> {
        let segments = split_path(path);
        let Some((file_name, dirs)) = segments.split_last() else {
            return Err(Error::InvalidName {
                name: path.to_string(),
            });
        };

        let mut tree = self.write_tree();
        let (dir_id, dir_name) = ensure_directories(&mut tree, dirs)?;
        match tree.child(dir_id, &dir_name, file_name)? {
            Some((id, false)) => tree.set_content(id, file_name, content),
            Some((_, true)) => Err(Error::AlreadyExists {
                name: file_name.clone(),
                parent: dir_name,
            }),
            None => tree
                .insert(
                    dir_id,
                    &dir_name,
                    Node::File {
                        name: file_name.clone(),
                        content: content.to_string(),
                    },
                )
                .map(drop),
        }
    }

    /// Seed a directory at a `/`-separated path, creating missing parents.
    pub fn insert_directory(&self, path: &str) -> Result<()> {
        let mut tree = self.write_tree();
        ensure_directories(&mut tree, &split_path(path)).map(drop)
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.read_tree().len()
    }

    fn read_tree(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tree(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_read(&self, operation: &str) -> Result<()> {
        if !self.granted.load(Ordering::SeqCst) {
            warn!(operation, "Memory storage access without permission");
            return Err(Error::denied(Self::DESCRIPTOR.display_name, operation));
        }
        Ok(())
    }

    fn check_write(&self, operation: &str) -> Result<()> {
        self.check_read(operation)?;
        if self.read_only.load(Ordering::SeqCst) {
            warn!(operation, "Memory storage is read-only");
            return Err(Error::denied(Self::DESCRIPTOR.display_name, operation));
        }
        Ok(())
    }
}

/// Walk `dirs` from the root, creating each missing directory. Returns the
/// id and name of the last one.
fn ensure_directories(tree: &mut Tree, dirs: &[String]) -> Result<(u64, String)> {
    let mut current = (ROOT_ID, ROOT_NAME.to_string());
    for name in dirs {
        let id = match tree.child(current.0, &current.1, name)? {
            Some((id, true)) => id,
            Some((_, false)) => {
                return Err(Error::NotADirectory {
                    name: name.clone(),
                    path: dirs.join("/"),
                });
            }
            None => tree.insert(
                current.0,
                &current.1,
                Node::Directory {
                    name: name.clone(),
                    children: BTreeMap::new(),
                },
            )?,
        };
        current = (id, name.clone());
    }
    Ok(current)
}

fn to_child(name: String, id: u64, is_dir: bool) -> Child<MemoryDir, MemoryFile> {
    if is_dir {
        Child::Directory(MemoryDir { id, name })
    } else {
        Child::File(MemoryFile { id, name })
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    type DirHandle = MemoryDir;
    type FileHandle = MemoryFile;

    const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor::new(ProviderKind::Memory, "Memory");

    fn directory_name(&self, handle: &MemoryDir) -> String {
        handle.name.clone()
    }

    fn file_name(&self, handle: &MemoryFile) -> String {
        handle.name.clone()
    }

    fn serialize(&self) -> ConfigMap {
        let mut data = ConfigMap::new();
        data.insert("label".into(), Value::String(self.label()));
        data
    }

    fn deserialize(&self, data: &ConfigMap) -> Result<()> {
        match data.get("label") {
            None => Ok(()),
            Some(Value::String(label)) => {
                *self.label.write().unwrap_or_else(PoisonError::into_inner) = label.clone();
                Ok(())
            }
            Some(other) => Err(Error::InvalidConfig {
                kind: ProviderKind::Memory,
                message: format!("\"label\" must be a string, got {other}"),
            }),
        }
    }

    async fn root(&self) -> Result<MemoryDir> {
        self.check_read("open root")?;
        Ok(MemoryDir {
            id: ROOT_ID,
            name: ROOT_NAME.to_string(),
        })
    }

    async fn has_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn request_permission(&self) -> bool {
        if self.granted.load(Ordering::SeqCst) {
            return true;
        }
        let grant = self.grant_on_request.load(Ordering::SeqCst);
        self.granted.store(grant, Ordering::SeqCst);
        grant
    }

    async fn add(&self) -> Result<()> {
        debug!(label = %self.label(), "Memory storage needs no setup");
        Ok(())
    }

    async fn list(&self, dir: &MemoryDir, force: bool) -> Result<Vec<Child<MemoryDir, MemoryFile>>> {
        self.check_read("list")?;
        self.stats.record_listing(force);
        debug!(dir = %dir.name, force, "Listing memory directory");

        let children = self.read_tree().children(dir.id, &dir.name)?;
        Ok(children
            .into_iter()
            .map(|(name, id, is_dir)| to_child(name, id, is_dir))
            .collect())
    }

    async fn lookup(
        &self,
        dir: &MemoryDir,
        name: &str,
        force: bool,
    ) -> Result<Option<Child<MemoryDir, MemoryFile>>> {
        self.check_read("list")?;
        self.stats.record_listing(force);

        let child = self.read_tree().child(dir.id, &dir.name, name)?;
        Ok(child.map(|(id, is_dir)| to_child(name.to_string(), id, is_dir)))
    }

    async fn create_directory(&self, parent: &MemoryDir, name: &str) -> Result<MemoryDir> {
        self.check_write("create a directory")?;
        let id = self.write_tree().insert(
            parent.id,
            &parent.name,
            Node::Directory {
                name: name.to_string(),
                children: BTreeMap::new(),
            },
        )?;
        Ok(MemoryDir {
            id,
            name: name.to_string(),
        })
    }

    async fn create_file(&self, parent: &MemoryDir, name: &str) -> Result<MemoryFile> {
        self.check_write("create a file")?;
        let id = self.write_tree().insert(
            parent.id,
            &parent.name,
            Node::File {
                name: name.to_string(),
                content: String::new(),
            },
        )?;
        Ok(MemoryFile {
            id,
            name: name.to_string(),
        })
    }

    async fn remove_directory(&self, parent: &MemoryDir, dir: &MemoryDir) -> Result<()> {
        self.check_write("delete a directory")?;
        self.write_tree().remove(parent.id, dir.id, &dir.name)
    }

    async fn remove_file(&self, parent: &MemoryDir, file: &MemoryFile) -> Result<()> {
        self.check_write("delete a file")?;
        self.write_tree().remove(parent.id, file.id, &file.name)
    }

    async fn read(&self, file: &MemoryFile) -> Result<String> {
        self.check_read("read")?;
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        debug!(file = %file.name, "Reading memory file");
        self.read_tree()
            .content(file.id, &file.name)
            .map(str::to_string)
    }

    async fn write(&self, file: &MemoryFile, content: &str) -> Result<()> {
        self.check_write("write")?;
        debug!(file = %file.name, bytes = content.len(), "Writing memory file");
        self.write_tree().set_content(file.id, &file.name, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_file_creates_parents() {
        let backend = MemoryBackend::new();
        backend.insert_file("src/rtl/top.v", "module top; endmodule").unwrap();

        // root + src + rtl + top.v
        assert_eq!(backend.node_count(), 4);
    }

    #[tokio::test]
    async fn insert_file_overwrites_existing_content() {
        let backend = MemoryBackend::new();
        backend.insert_file("a.v", "old").unwrap();
        backend.insert_file("a.v", "new").unwrap();

        let root = backend.root().await.unwrap();
        let Some(Child::File(file)) = backend.lookup(&root, "a.v", false).await.unwrap() else {
            panic!("a.v should be a file");
        };
        assert_eq!(backend.read(&file).await.unwrap(), "new");
    }

    #[test]
    fn insert_file_through_a_file_fails() {
        let backend = MemoryBackend::new();
        backend.insert_file("a", "").unwrap();

        let err = backend.insert_file("a/b", "").unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[test]
    fn label_round_trips_through_config() {
        let backend = MemoryBackend::new().with_label("fixtures");
        let data = backend.serialize();

        let restored = MemoryBackend::new();
        restored.deserialize(&data).unwrap();
        assert_eq!(restored.label(), "fixtures");
    }

    #[test]
    fn non_string_label_is_invalid_config() {
        let mut data = ConfigMap::new();
        data.insert("label".into(), Value::Bool(true));

        let err = MemoryBackend::new().deserialize(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn denied_request_leaves_permission_off() {
        let backend = MemoryBackend::requiring_permission(false);

        assert!(!backend.request_permission().await);
        assert!(!backend.has_permission().await);
        assert!(matches!(
            backend.root().await,
            Err(Error::PermissionDenied { .. })
        ));
    }
}
