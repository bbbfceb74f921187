//! Backend-agnostic storage tree
//!
//! A [`Storage`] exposes one tree of [`Directory`] and [`File`] entries over
//! a pluggable [`Backend`]. Consumers ask the storage for permission, resolve
//! its root or a path, and then read, write, create, and delete entries
//! without knowing which backend they talk to.
//!
//! ```text
//!   StorageSet ── BackendRegistry ── StorageConfig (persisted)
//!       │
//!   dyn StorageProvider
//!       │
//!   Storage<B> ── Directory<B> ── File<B> ── Snapshot<B>
//!       │
//!   B: Backend (memory, local, ...)
//! ```

pub mod backend;
pub mod config;
pub mod content;
pub mod entry;
pub mod error;
pub mod io;
pub mod kind;
pub mod name;
pub mod provider;
pub mod registry;
pub mod snapshot;
pub mod storage;

pub use backend::{Backend, Child, ConfigMap};
pub use config::{StorageConfig, StorageRecord};
pub use content::{ContentError, ContentKind, ContentResult};
pub use entry::{Directory, Entry, File};
pub use error::{Error, ErrorCategory, Result};
pub use kind::{EntryKind, ProviderDescriptor, ProviderKind};
pub use name::{extension_of, join_path, split_path, validate_entry_name};
pub use provider::{EntrySummary, StorageProvider};
pub use registry::{BackendRegistry, StorageSet, record_of};
pub use snapshot::{Snapshot, compute_content_checksum};
pub use storage::Storage;
