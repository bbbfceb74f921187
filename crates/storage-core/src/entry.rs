//! Directories, files, and the tagged union over both.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::backend::{Backend, Child};
use crate::content::{ContentError, ContentResult};
use crate::kind::EntryKind;
use crate::name::{extension_of, join_path, validate_entry_name};
use crate::snapshot::Snapshot;
use crate::storage::Storage;
use crate::{Error, Result};

/// Indentation added per tree level by [`Directory::print`].
const TREE_INDENT: &str = "|  ";

/// Any addressable node in a storage tree.
pub enum Entry<B: Backend> {
    Directory(Directory<B>),
    File(File<B>),
}

impl<B: Backend> Entry<B> {
    pub(crate) fn from_child(
        storage: &Arc<Storage<B>>,
        parent: &Directory<B>,
        child: Child<B::DirHandle, B::FileHandle>,
    ) -> Self {
        match child {
            Child::Directory(handle) => {
                Entry::Directory(Directory::new(storage.clone(), Some(parent.clone()), handle))
            }
            Child::File(handle) => Entry::File(File::new(storage.clone(), parent.clone(), handle)),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Directory(_) => EntryKind::Directory,
            Entry::File(_) => EntryKind::File,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Entry::Directory(dir) => dir.name(),
            Entry::File(file) => file.name(),
        }
    }

    pub fn extension(&self) -> String {
        extension_of(&self.name()).to_string()
    }

    pub fn path(&self) -> Vec<String> {
        match self {
            Entry::Directory(dir) => dir.path(),
            Entry::File(file) => file.path(),
        }
    }

    pub fn storage(&self) -> &Arc<Storage<B>> {
        match self {
            Entry::Directory(dir) => dir.storage(),
            Entry::File(file) => file.storage(),
        }
    }

    /// The backend handle, tagged with the entry kind.
    pub fn handle(&self) -> Child<&B::DirHandle, &B::FileHandle> {
        match self {
            Entry::Directory(dir) => Child::Directory(dir.handle()),
            Entry::File(file) => Child::File(file.handle()),
        }
    }

    pub fn parent(&self) -> Option<&Directory<B>> {
        match self {
            Entry::Directory(dir) => dir.parent(),
            Entry::File(file) => Some(file.parent()),
        }
    }

    pub fn as_directory(&self) -> Option<&Directory<B>> {
        match self {
            Entry::Directory(dir) => Some(dir),
            Entry::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File<B>> {
        match self {
            Entry::Directory(_) => None,
            Entry::File(file) => Some(file),
        }
    }

    pub fn into_directory(self) -> Option<Directory<B>> {
        match self {
            Entry::Directory(dir) => Some(dir),
            Entry::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File<B>> {
        match self {
            Entry::Directory(_) => None,
            Entry::File(file) => Some(file),
        }
    }

    /// Remove the entry from its backend.
    pub async fn delete(self) -> Result<()> {
        match self {
            Entry::Directory(dir) => dir.delete().await,
            Entry::File(file) => file.delete().await,
        }
    }
}

impl<B: Backend> Clone for Entry<B> {
    fn clone(&self) -> Self {
        match self {
            Entry::Directory(dir) => Entry::Directory(dir.clone()),
            Entry::File(file) => Entry::File(file.clone()),
        }
    }
}

impl<B: Backend> fmt::Debug for Entry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Directory(dir) => dir.fmt(f),
            Entry::File(file) => file.fmt(f),
        }
    }
}

struct DirectoryInner<B: Backend> {
    storage: Arc<Storage<B>>,
    parent: Option<Directory<B>>,
    handle: B::DirHandle,
}

/// A container entry.
///
/// Cloning is cheap; clones share the same descriptor. The child set is
/// never cached here, every listing goes through the backend.
pub struct Directory<B: Backend> {
    inner: Arc<DirectoryInner<B>>,
}

impl<B: Backend> Clone for Directory<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> Directory<B> {
    pub(crate) fn new(
        storage: Arc<Storage<B>>,
        parent: Option<Directory<B>>,
        handle: B::DirHandle,
    ) -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                storage,
                parent,
                handle,
            }),
        }
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::Directory
    }

    pub fn storage(&self) -> &Arc<Storage<B>> {
        &self.inner.storage
    }

    pub fn parent(&self) -> Option<&Directory<B>> {
        self.inner.parent.as_ref()
    }

    pub fn handle(&self) -> &B::DirHandle {
        &self.inner.handle
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn name(&self) -> String {
        self.backend().directory_name(&self.inner.handle)
    }

    pub fn extension(&self) -> String {
        extension_of(&self.name()).to_string()
    }

    /// Names from the root (exclusive) down to this directory.
    pub fn path(&self) -> Vec<String> {
        match &self.inner.parent {
            None => Vec::new(),
            Some(parent) => {
                let mut path = parent.path();
                path.push(self.name());
                path
            }
        }
    }

    fn backend(&self) -> &B {
        self.inner.storage.backend()
    }

    fn child_path(&self, name: &str) -> String {
        let mut path = self.path();
        path.push(name.to_string());
        join_path(&path)
    }

    /// List immediate children. `force` bypasses any listing the backend
    /// cached earlier.
    pub async fn entries(&self, force: bool) -> Result<Vec<Entry<B>>> {
        let children = self.backend().list(&self.inner.handle, force).await?;
        Ok(children
            .into_iter()
            .map(|child| Entry::from_child(&self.inner.storage, self, child))
            .collect())
    }

    /// Look up a single child by exact name. Absence is `Ok(None)`.
    pub async fn entry(&self, name: &str, force: bool) -> Result<Option<Entry<B>>> {
        let child = self.backend().lookup(&self.inner.handle, name, force).await?;
        Ok(child.map(|child| Entry::from_child(&self.inner.storage, self, child)))
    }

    pub async fn create_directory(&self, name: &str) -> Result<Directory<B>> {
        validate_entry_name(name)?;
        debug!(path = %self.child_path(name), "Creating directory");

        let handle = self
            .backend()
            .create_directory(&self.inner.handle, name)
            .await?;
        Ok(Directory::new(
            self.inner.storage.clone(),
            Some(self.clone()),
            handle,
        ))
    }

    pub async fn create_file(&self, name: &str) -> Result<File<B>> {
        validate_entry_name(name)?;
        debug!(path = %self.child_path(name), "Creating file");

        let handle = self.backend().create_file(&self.inner.handle, name).await?;
        Ok(File::new(self.inner.storage.clone(), self.clone(), handle))
    }

    /// Remove this directory and its contents. The root cannot be deleted.
    pub async fn delete(self) -> Result<()> {
        let Some(parent) = &self.inner.parent else {
            return Err(Error::RootDeletion);
        };
        debug!(path = %join_path(&self.path()), "Deleting directory");
        self.backend()
            .remove_directory(&parent.inner.handle, &self.inner.handle)
            .await
    }

    /// Write the subtree depth-first to `sink`, one `name (D|F)` line per
    /// entry, indented by depth.
    pub async fn print<W>(&self, sink: &mut W) -> Result<()>
    where
        W: fmt::Write + Send + ?Sized,
    {
        writeln!(sink, "{} ({})", self.name(), EntryKind::Directory.tag())?;

        let mut stack: Vec<(Entry<B>, usize)> = Vec::new();
        push_children(&mut stack, self.entries(false).await?, 1);

        while let Some((entry, depth)) = stack.pop() {
            let indent = TREE_INDENT.repeat(depth);
            writeln!(sink, "{}{} ({})", indent, entry.name(), entry.kind().tag())?;

            match entry {
                Entry::Directory(dir) => {
                    push_children(&mut stack, dir.entries(false).await?, depth + 1);
                }
                Entry::File(_) => {}
            }
        }
        Ok(())
    }

    /// [`Directory::print`] into a string.
    pub async fn tree(&self) -> Result<String> {
        let mut out = String::new();
        self.print(&mut out).await?;
        Ok(out)
    }
}

/// Push in reverse so the stack pops children in listing order.
fn push_children<B: Backend>(stack: &mut Vec<(Entry<B>, usize)>, children: Vec<Entry<B>>, depth: usize) {
    stack.extend(children.into_iter().rev().map(|child| (child, depth)));
}

impl<B: Backend> fmt::Debug for Directory<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("name", &self.name())
            .field("path", &self.path())
            .field("handle", &self.inner.handle)
            .finish()
    }
}

/// A leaf entry. Holds no content; every read goes to the backend.
pub struct File<B: Backend> {
    storage: Arc<Storage<B>>,
    parent: Directory<B>,
    handle: B::FileHandle,
}

impl<B: Backend> Clone for File<B> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            parent: self.parent.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<B: Backend> File<B> {
    pub(crate) fn new(storage: Arc<Storage<B>>, parent: Directory<B>, handle: B::FileHandle) -> Self {
        Self {
            storage,
            parent,
            handle,
        }
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::File
    }

    pub fn storage(&self) -> &Arc<Storage<B>> {
        &self.storage
    }

    pub fn parent(&self) -> &Directory<B> {
        &self.parent
    }

    pub fn handle(&self) -> &B::FileHandle {
        &self.handle
    }

    pub fn name(&self) -> String {
        self.storage.backend().file_name(&self.handle)
    }

    /// Everything after the first `.` of the name, or the full name when
    /// it has no `.` (`"README"` reports `"README"`).
    pub fn extension(&self) -> String {
        extension_of(&self.name()).to_string()
    }

    pub fn path(&self) -> Vec<String> {
        let mut path = self.parent.path();
        path.push(self.name());
        path
    }

    pub async fn read(&self) -> Result<String> {
        self.storage.backend().read(&self.handle).await
    }

    pub async fn write(&self, content: &str) -> Result<()> {
        self.storage.backend().write(&self.handle, content).await
    }

    /// Parse the content as JSON.
    pub async fn read_structured<T: DeserializeOwned>(&self) -> ContentResult<T> {
        let text = self.read().await?;
        serde_json::from_str(&text).map_err(|source| ContentError::Parse {
            path: join_path(&self.path()),
            source,
        })
    }

    /// Serialize `value` as compact JSON and write it.
    pub async fn write_structured<T: Serialize + ?Sized>(&self, value: &T) -> ContentResult<()> {
        let text = serde_json::to_string(value).map_err(|source| ContentError::Serialize {
            path: join_path(&self.path()),
            source,
        })?;
        self.write(&text).await?;
        Ok(())
    }

    /// Read the content into a [`Snapshot`] that can later be saved back.
    pub async fn load(&self) -> Result<Snapshot<B>> {
        let content = self.read().await?;
        Ok(Snapshot::new(self.clone(), content))
    }

    pub async fn delete(self) -> Result<()> {
        debug!(path = %join_path(&self.path()), "Deleting file");
        self.storage
            .backend()
            .remove_file(self.parent.handle(), &self.handle)
            .await
    }
}

impl<B: Backend> fmt::Debug for File<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name())
            .field("path", &self.path())
            .field("handle", &self.handle)
            .finish()
    }
}
