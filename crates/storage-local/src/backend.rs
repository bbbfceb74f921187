//! Storage backend over one directory of the local filesystem
//!
//! Every path the backend touches is resolved through symlinks and must
//! stay below the canonical root. Listings only show links that resolve
//! inside it without pointing back up the walk.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::fs;
use tracing::{debug, info, warn};

use storage_core::io::write_atomic;
use storage_core::{Backend, Child, ConfigMap, Error, ProviderDescriptor, ProviderKind, Result};

use crate::access::{AccessMode, AutoAnswer, Location, LocationPicker, NoLocation, PermissionPrompt};

const DISPLAY_NAME: &str = "Local";

/// Handle of a directory below (or at) the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalDir {
    path: PathBuf,
}

impl LocalDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Handle of a regular file below the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

type LocalChild = Child<LocalDir, LocalFile>;

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn child_path(child: &LocalChild) -> &Path {
    match child {
        Child::Directory(dir) => &dir.path,
        Child::File(file) => &file.path,
    }
}

/// Map an I/O failure on an existing handle. A vanished path means the
/// handle went stale.
fn failure(err: io::Error, path: &Path) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::Stale {
            name: entry_name(path),
        },
        io::ErrorKind::PermissionDenied => {
            Error::denied(DISPLAY_NAME, format!("access \"{}\"", path.display()))
        }
        _ => Error::io(path, err),
    }
}

fn not_located() -> Error {
    Error::InvalidConfig {
        kind: ProviderKind::Local,
        message: "no root directory has been chosen".to_string(),
    }
}

/// A storage rooted at a directory of the local filesystem.
///
/// Nothing is reachable before a [`Location`] is chosen through
/// [`Backend::add`] or restored from configuration, and nothing is read
/// before permission is granted. A restored storage always starts without
/// permission and has to ask its [`PermissionPrompt`] again.
///
/// Directory listings are cached per path. A listing is served from the
/// cache until it is requested with `force`; entries created or removed
/// through this backend update the cache in place.
pub struct LocalBackend {
    location: RwLock<Option<Location>>,
    granted: AtomicBool,
    picker: Arc<dyn LocationPicker>,
    prompt: Arc<dyn PermissionPrompt>,
    listings: Mutex<HashMap<PathBuf, Vec<LocalChild>>>,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBackend {
    /// A backend with no location, no picker, and a prompt that declines.
    pub fn new() -> Self {
        Self {
            location: RwLock::new(None),
            granted: AtomicBool::new(false),
            picker: Arc::new(NoLocation),
            prompt: Arc::new(AutoAnswer::DECLINE),
            listings: Mutex::new(HashMap::new()),
        }
    }

    /// A backend already rooted at `location` with access granted, as if
    /// it had just been added.
    pub fn at(location: Location) -> Self {
        let root = std::fs::canonicalize(&location.root).unwrap_or(location.root);
        let backend = Self::new();
        *backend.location.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Location::new(root, location.access));
        backend.granted.store(true, Ordering::SeqCst);
        backend
    }

    pub fn with_picker(mut self, picker: impl LocationPicker + 'static) -> Self {
        self.picker = Arc::new(picker);
        self
    }

    pub fn with_prompt(mut self, prompt: impl PermissionPrompt + 'static) -> Self {
        self.prompt = Arc::new(prompt);
        self
    }

    /// The chosen root and access level, if any.
    pub fn location(&self) -> Option<Location> {
        self.location
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_location(&self, location: Option<Location>) {
        *self.location.write().unwrap_or_else(PoisonError::into_inner) = location;
        self.listings().clear();
    }

    fn listings(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<LocalChild>>> {
        self.listings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_readable(&self, operation: &str) -> Result<()> {
        if self.granted.load(Ordering::SeqCst) {
            return Ok(());
        }
        warn!(operation, "Local storage access has not been granted");
        Err(Error::denied(DISPLAY_NAME, operation))
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        self.ensure_readable(operation)?;
        let access = self.location().map(|l| l.access);
        if access.is_some_and(AccessMode::allows_write) {
            return Ok(());
        }
        warn!(operation, "Local storage is read-only");
        Err(Error::denied(DISPLAY_NAME, operation))
    }

    /// Insert a freshly created child into a cached listing of `parent`.
    fn remember(&self, parent: &Path, child: LocalChild) {
        if let Some(listing) = self.listings().get_mut(parent) {
            let pos = listing.partition_point(|c| child_path(c) < child_path(&child));
            listing.insert(pos, child);
        }
    }

    /// Drop `path` from the cached listing of `parent`, along with any
    /// cached listing at or below `path`.
    fn forget(&self, parent: &Path, path: &Path) {
        let mut listings = self.listings();
        if let Some(listing) = listings.get_mut(parent) {
            listing.retain(|c| child_path(c) != path);
        }
        listings.retain(|dir, _| !dir.starts_with(path));
    }

    /// Canonical form of the chosen root.
    async fn sandbox(&self) -> Result<PathBuf> {
        let location = self.location().ok_or_else(not_located)?;
        fs::canonicalize(&location.root)
            .await
            .map_err(|e| Error::io(&location.root, e))
    }

    /// Resolve `path` through any symlinks, refusing it when it lands
    /// outside the root.
    async fn confine(&self, path: &Path) -> Result<PathBuf> {
        let root = self.sandbox().await?;
        let resolved = fs::canonicalize(path).await.map_err(|e| failure(e, path))?;
        if resolved.starts_with(&root) {
            return Ok(resolved);
        }

        warn!(path = %path.display(), target = %resolved.display(), "Path leads outside the storage root");
        Err(Error::denied(
            DISPLAY_NAME,
            format!("reach \"{}\" outside the root", path.display()),
        ))
    }

    /// Canonical forms of `dir` and of every directory walked through from
    /// the root to reach it.
    async fn walked(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let location = self.location().ok_or_else(not_located)?;
        let mut canonical = Vec::new();
        for step in dir.ancestors().take_while(|p| p.starts_with(&location.root)) {
            canonical.push(fs::canonicalize(step).await.map_err(|e| failure(e, step))?);
        }
        Ok(canonical)
    }

    async fn read_listing(&self, dir: &Path) -> Result<Vec<LocalChild>> {
        self.confine(dir).await?;
        let root = self.sandbox().await?;
        let mut reader = fs::read_dir(dir).await.map_err(|e| failure(e, dir))?;
        let mut children = Vec::new();
        let mut walked: Option<Vec<PathBuf>> = None;

        while let Some(item) = reader.next_entry().await.map_err(|e| Error::io(dir, e))? {
            let path = item.path();
            let file_type = item.file_type().await.map_err(|e| Error::io(&path, e))?;
            let is_dir = if file_type.is_symlink() {
                let Ok(target) = fs::canonicalize(&path).await else {
                    debug!(link = %path.display(), "Skipping dangling link");
                    continue;
                };
                if !target.starts_with(&root) {
                    debug!(link = %path.display(), target = %target.display(), "Skipping link out of the storage root");
                    continue;
                }
                let meta = fs::metadata(&target).await.map_err(|e| Error::io(&target, e))?;
                if meta.is_dir() {
                    if walked.is_none() {
                        walked = Some(self.walked(dir).await?);
                    }
                    if walked.as_ref().is_some_and(|w| w.contains(&target)) {
                        debug!(link = %path.display(), "Skipping link back to an enclosing directory");
                        continue;
                    }
                }
                meta.is_dir()
            } else {
                file_type.is_dir()
            };
            children.push(if is_dir {
                Child::Directory(LocalDir { path })
            } else {
                Child::File(LocalFile { path })
            });
        }

        children.sort_by(|a, b| child_path(a).cmp(child_path(b)));
        Ok(children)
    }
}

impl fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBackend")
            .field("location", &self.location())
            .field("granted", &self.granted.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Backend for LocalBackend {
    type DirHandle = LocalDir;
    type FileHandle = LocalFile;

    const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor::new(ProviderKind::Local, DISPLAY_NAME);

    fn directory_name(&self, handle: &LocalDir) -> String {
        entry_name(&handle.path)
    }

    fn file_name(&self, handle: &LocalFile) -> String {
        entry_name(&handle.path)
    }

    fn serialize(&self) -> ConfigMap {
        match self.location().map(serde_json::to_value) {
            Some(Ok(Value::Object(map))) => map,
            _ => ConfigMap::new(),
        }
    }

    fn deserialize(&self, data: &ConfigMap) -> Result<()> {
        let location = if data.is_empty() {
            None
        } else {
            let location: Location = serde_json::from_value(Value::Object(data.clone()))
                .map_err(|e| Error::InvalidConfig {
                    kind: ProviderKind::Local,
                    message: e.to_string(),
                })?;
            Some(location)
        };
        self.set_location(location);
        self.granted.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn root(&self) -> Result<LocalDir> {
        let location = self.location().ok_or_else(not_located)?;
        self.ensure_readable("open the root directory")?;
        debug!(root = %location.root.display(), "Resolving local root");

        let meta = fs::metadata(&location.root)
            .await
            .map_err(|e| Error::io(&location.root, e))?;
        if !meta.is_dir() {
            return Err(Error::NotADirectory {
                name: entry_name(&location.root),
                path: String::new(),
            });
        }
        Ok(LocalDir {
            path: location.root,
        })
    }

    async fn has_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst) && self.location().is_some()
    }

    async fn request_permission(&self) -> bool {
        let Some(location) = self.location() else {
            return false;
        };
        if self.granted.load(Ordering::SeqCst) {
            return true;
        }
        if !self.prompt.confirm(&location).await {
            return false;
        }

        match fs::metadata(&location.root).await {
            Ok(meta) if meta.is_dir() => {
                self.granted.store(true, Ordering::SeqCst);
                true
            }
            _ => {
                warn!(root = %location.root.display(), "Storage root is not an accessible directory");
                false
            }
        }
    }

    async fn add(&self) -> Result<()> {
        let chosen = self.picker.pick().await.ok_or_else(not_located)?;
        let root = fs::canonicalize(&chosen.root)
            .await
            .map_err(|e| Error::io(&chosen.root, e))?;
        let meta = fs::metadata(&root).await.map_err(|e| Error::io(&root, e))?;
        if !meta.is_dir() {
            return Err(Error::InvalidConfig {
                kind: ProviderKind::Local,
                message: format!("{} is not a directory", root.display()),
            });
        }

        info!(root = %root.display(), access = %chosen.access, "Local storage location chosen");
        self.set_location(Some(Location::new(root, chosen.access)));
        // Choosing the location is the grant.
        self.granted.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self, dir: &LocalDir, force: bool) -> Result<Vec<LocalChild>> {
        self.ensure_readable("list")?;

        let cached = if force {
            None
        } else {
            self.listings().get(&dir.path).cloned()
        };
        if let Some(cached) = cached {
            debug!(path = %dir.path.display(), "Serving cached listing");
            return Ok(cached);
        }

        debug!(path = %dir.path.display(), force, "Listing directory");
        let children = self.read_listing(&dir.path).await?;
        self.listings().insert(dir.path.clone(), children.clone());
        Ok(children)
    }

    async fn create_directory(&self, parent: &LocalDir, name: &str) -> Result<LocalDir> {
        self.ensure_writable(&format!("create \"{name}\""))?;
        self.confine(&parent.path).await?;
        let path = parent.path.join(name);
        debug!(path = %path.display(), "Creating directory");

        match fs::create_dir(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::AlreadyExists {
                    name: name.to_string(),
                    parent: entry_name(&parent.path),
                });
            }
            Err(e) => return Err(failure(e, &parent.path)),
        }

        let handle = LocalDir { path };
        self.remember(&parent.path, Child::Directory(handle.clone()));
        Ok(handle)
    }

    async fn create_file(&self, parent: &LocalDir, name: &str) -> Result<LocalFile> {
        self.ensure_writable(&format!("create \"{name}\""))?;
        self.confine(&parent.path).await?;
        let path = parent.path.join(name);
        debug!(path = %path.display(), "Creating file");

        let created = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match created {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::AlreadyExists {
                    name: name.to_string(),
                    parent: entry_name(&parent.path),
                });
            }
            Err(e) => return Err(failure(e, &parent.path)),
        }

        let handle = LocalFile { path };
        self.remember(&parent.path, Child::File(handle.clone()));
        Ok(handle)
    }

    async fn remove_directory(&self, parent: &LocalDir, dir: &LocalDir) -> Result<()> {
        self.ensure_writable(&format!("delete \"{}\"", entry_name(&dir.path)))?;
        self.confine(&parent.path).await?;
        debug!(path = %dir.path.display(), "Removing directory");

        fs::remove_dir_all(&dir.path)
            .await
            .map_err(|e| failure(e, &dir.path))?;
        self.forget(&parent.path, &dir.path);
        Ok(())
    }

    async fn remove_file(&self, parent: &LocalDir, file: &LocalFile) -> Result<()> {
        self.ensure_writable(&format!("delete \"{}\"", entry_name(&file.path)))?;
        self.confine(&parent.path).await?;
        debug!(path = %file.path.display(), "Removing file");

        fs::remove_file(&file.path)
            .await
            .map_err(|e| failure(e, &file.path))?;
        self.forget(&parent.path, &file.path);
        Ok(())
    }

    async fn read(&self, file: &LocalFile) -> Result<String> {
        self.ensure_readable(&format!("read \"{}\"", entry_name(&file.path)))?;
        let target = self.confine(&file.path).await?;
        debug!(path = %target.display(), "Reading file");

        fs::read_to_string(&target)
            .await
            .map_err(|e| failure(e, &file.path))
    }

    async fn write(&self, file: &LocalFile, content: &str) -> Result<()> {
        self.ensure_writable(&format!("write \"{}\"", entry_name(&file.path)))?;
        // Resolving first also keeps the atomic write from recreating a
        // deleted file or replacing a link with a regular file.
        let target = self.confine(&file.path).await?;
        debug!(path = %target.display(), bytes = content.len(), "Writing file");

        let meta = fs::metadata(&target)
            .await
            .map_err(|e| failure(e, &file.path))?;
        if !meta.is_file() {
            return Err(Error::Stale {
                name: entry_name(&file.path),
            });
        }

        let path = target;
        let bytes = content.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| Error::io(&file.path, io::Error::other(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> LocalChild {
        Child::File(LocalFile { path: path.into() })
    }

    #[test]
    fn entry_name_is_the_last_component() {
        assert_eq!(entry_name(Path::new("/srv/designs/top.v")), "top.v");
        assert_eq!(entry_name(Path::new("/srv/designs")), "designs");
        assert_eq!(entry_name(Path::new("/")), "/");
    }

    #[test]
    fn remember_keeps_cached_listing_sorted() {
        let backend = LocalBackend::new();
        backend
            .listings()
            .insert("/root".into(), vec![file("/root/a.v"), file("/root/c.v")]);

        backend.remember(Path::new("/root"), file("/root/b.v"));

        let names: Vec<_> = backend.listings()[Path::new("/root")]
            .iter()
            .map(|c| entry_name(child_path(c)))
            .collect();
        assert_eq!(names, vec!["a.v", "b.v", "c.v"]);
    }

    #[test]
    fn remember_ignores_uncached_parents() {
        let backend = LocalBackend::new();
        backend.remember(Path::new("/root"), file("/root/a.v"));
        assert!(backend.listings().is_empty());
    }

    #[test]
    fn forget_drops_nested_listings() {
        let backend = LocalBackend::new();
        backend.listings().insert(
            "/root".into(),
            vec![
                Child::Directory(LocalDir {
                    path: "/root/src".into(),
                }),
                file("/root/top.v"),
            ],
        );
        backend
            .listings()
            .insert("/root/src".into(), vec![file("/root/src/alu.v")]);
        backend.listings().insert("/root/src/rtl".into(), Vec::new());

        backend.forget(Path::new("/root"), Path::new("/root/src"));

        let listings = backend.listings();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[Path::new("/root")], vec![file("/root/top.v")]);
    }

    #[test]
    fn serialize_without_location_is_empty() {
        assert!(LocalBackend::new().serialize().is_empty());
    }
}
