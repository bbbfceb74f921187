//! Command implementations for storage-cli

pub mod files;
pub mod open;
pub mod storages;

pub use files::{run_cat, run_create, run_rm, run_tree, run_write};
pub use open::run_open;
pub use storages::{run_add, run_list, run_remove};
