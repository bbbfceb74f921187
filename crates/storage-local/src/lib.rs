//! Local filesystem storage backend
//!
//! [`LocalBackend`] exposes one directory of the local filesystem as a
//! storage tree. The directory is chosen through a [`LocationPicker`] and
//! access to it is confirmed through a [`PermissionPrompt`], so callers
//! decide how a human is asked.

mod access;
mod backend;

pub use access::{
    AccessMode, AutoAnswer, FixedLocation, Location, LocationPicker, NoLocation, PermissionPrompt,
};
pub use backend::{LocalBackend, LocalDir, LocalFile};
