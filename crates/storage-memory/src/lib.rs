//! In-memory storage backend
//!
//! An arena-backed tree implementing [`storage_core::Backend`]. Handles are
//! node ids, so a handle whose node was deleted reports
//! [`storage_core::Error::Stale`] instead of touching another entry.

mod backend;
mod tree;

pub use backend::{MemoryBackend, MemoryDir, MemoryFile, MemoryStats};
