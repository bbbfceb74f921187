//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storage - browse and edit files across configured storages
#[derive(Parser, Debug)]
#[command(name = "storage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Storage configuration file (.json, .toml, .yaml)
    #[arg(long, global = true, env = "STORAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Grant permission prompts without asking
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List configured storages
    List,

    /// Add a storage
    ///
    /// Without a backend, asks which kind of storage to add.
    ///
    /// Examples:
    ///   storage add local ./designs            # Read-write local folder
    ///   storage add local /srv/lib --read-only # Browse only
    ///   storage add memory --label scratch     # Throwaway tree
    Add {
        #[command(subcommand)]
        backend: Option<AddBackend>,
    },

    /// Remove a storage from the configuration
    ///
    /// The storage's files are left untouched.
    Remove {
        /// Storage id or a unique prefix of it
        id: String,
    },

    /// Print the tree of a storage
    Tree {
        /// Storage id or a unique prefix of it
        id: String,
    },

    /// Print the content of a file
    Cat {
        /// Storage id or a unique prefix of it
        id: String,
        /// Slash-separated path from the storage root
        path: String,
    },

    /// Replace the content of a file, creating it when missing
    Write {
        /// Storage id or a unique prefix of it
        id: String,
        /// Slash-separated path from the storage root
        path: String,
        /// New content; read from stdin when omitted
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Create a directory
    Mkdir {
        /// Storage id or a unique prefix of it
        id: String,
        /// Slash-separated path from the storage root
        path: String,
    },

    /// Create an empty file
    Touch {
        /// Storage id or a unique prefix of it
        id: String,
        /// Slash-separated path from the storage root
        path: String,
    },

    /// Delete a file or a directory with everything below it
    Rm {
        /// Storage id or a unique prefix of it
        id: String,
        /// Slash-separated path from the storage root
        path: String,
    },

    /// Open a file with the handler matching its extension
    Open {
        /// Storage id or a unique prefix of it
        id: String,
        /// Slash-separated path from the storage root
        path: String,
    },
}

/// Backends that can be added from the command line
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AddBackend {
    /// A folder on this machine
    Local {
        /// Folder to use as storage root
        path: PathBuf,

        /// Only allow listing and reading
        #[arg(long)]
        read_only: bool,
    },

    /// An in-memory tree that lives for one invocation
    Memory {
        /// Label shown in listings
        #[arg(short, long)]
        label: Option<String>,
    },
}
