//! Listing, adding, and removing configured storages

use colored::Colorize;
use std::sync::Arc;
use storage_core::{ProviderKind, Storage, StorageProvider};
use storage_local::{AccessMode, FixedLocation, LocalBackend, Location};
use storage_memory::MemoryBackend;

use crate::cli::AddBackend;
use crate::context::{self, Context};
use crate::error::{CliError, Result};
use crate::interactive;

/// Run the list command
pub fn run_list(ctx: &Context) -> Result<()> {
    let storages = ctx.load()?;

    if storages.is_empty() {
        println!(
            "No storages configured. Use {} to add one.",
            "storage add".cyan()
        );
        return Ok(());
    }

    println!("{}", "Storages".bold());
    println!();
    for storage in storages.iter() {
        println!(
            "  {}  {:<6}  {}",
            storage.id().to_string().green(),
            storage.descriptor().kind.as_str(),
            describe(storage.as_ref()).dimmed()
        );
    }
    println!();
    println!(
        "{} {} configured in {}",
        "Total:".dimmed(),
        storages.len(),
        ctx.config_path().display()
    );
    Ok(())
}

/// One-line summary of a storage's connection parameters.
fn describe(storage: &dyn StorageProvider) -> String {
    let data = storage.serialize();
    let field = |key: &str| data.get(key).and_then(|v| v.as_str()).unwrap_or_default();

    match storage.descriptor().kind {
        ProviderKind::Local if field("access") == AccessMode::Read.as_str() => {
            format!("{} (read-only)", field("root"))
        }
        ProviderKind::Local => field("root").to_string(),
        ProviderKind::Memory => field("label").to_string(),
    }
}

/// Run the add command
pub async fn run_add(ctx: &Context, backend: Option<AddBackend>) -> Result<()> {
    let backend = match backend {
        Some(backend) => backend,
        None => ask_backend(ctx)?,
    };

    let storage: Arc<dyn StorageProvider> = match backend {
        AddBackend::Local { path, read_only } => {
            let access = if read_only {
                AccessMode::Read
            } else {
                AccessMode::ReadWrite
            };
            let backend = LocalBackend::new()
                .with_picker(FixedLocation(Location::new(path, access)))
                .with_prompt(ctx.prompt());
            Storage::new(backend).into_provider()
        }
        AddBackend::Memory { label } => {
            let backend = match label {
                Some(label) => MemoryBackend::new().with_label(label),
                None => MemoryBackend::new(),
            };
            Storage::new(backend).into_provider()
        }
    };

    storage.add().await?;

    let mut storages = ctx.load()?;
    storages.insert(Arc::clone(&storage));
    ctx.save(&storages)?;

    println!(
        "{} {} storage {}",
        "Added".green().bold(),
        storage.descriptor().display_name,
        storage.id().to_string().cyan()
    );
    Ok(())
}

fn ask_backend(ctx: &Context) -> Result<AddBackend> {
    let descriptors = ctx.registry().descriptors();
    let Some(descriptor) = interactive::choose_backend(&descriptors)? else {
        return Err(CliError::cancelled("Add"));
    };

    match descriptor.kind {
        ProviderKind::Local => {
            let path = interactive::ask_text("Folder", ".")?;
            let read_only = !interactive::confirm("Allow changes to this folder?", true)?;
            Ok(AddBackend::Local {
                path: path.into(),
                read_only,
            })
        }
        ProviderKind::Memory => {
            let label = interactive::ask_text("Label", "scratch")?;
            Ok(AddBackend::Memory { label: Some(label) })
        }
    }
}

/// Run the remove command
pub fn run_remove(ctx: &Context, id: &str) -> Result<()> {
    let mut storages = ctx.load()?;
    let id = context::find(&storages, id)?.id();

    storages.remove(id);
    ctx.save(&storages)?;

    println!("{} storage {}", "Removed".green().bold(), id.to_string().cyan());
    Ok(())
}
