//! Commands that browse and edit the tree of one storage

use colored::Colorize;
use storage_core::{EntryKind, Error, join_path, split_path};
use tokio::io::AsyncReadExt;

use crate::context::Context;
use crate::error::{CliError, Result};
use crate::interactive;

/// Run the tree command
pub async fn run_tree(ctx: &Context, id: &str) -> Result<()> {
    let storages = ctx.load()?;
    let storage = ctx.open(&storages, id).await?;

    let mut out = String::new();
    storage.print_tree(&mut out).await?;
    print!("{out}");
    Ok(())
}

/// Run the cat command
pub async fn run_cat(ctx: &Context, id: &str, path: &str) -> Result<()> {
    let storages = ctx.load()?;
    let storage = ctx.open(&storages, id).await?;

    let content = storage.read_text(&split_path(path)).await?;
    print!("{content}");
    Ok(())
}

/// Run the write command
pub async fn run_write(ctx: &Context, id: &str, path: &str, content: Option<String>) -> Result<()> {
    let storages = ctx.load()?;
    let storage = ctx.open(&storages, id).await?;
    let segments = split_path(path);

    let content = match content {
        Some(content) => content,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    match storage.write_text(&segments, &content).await {
        Err(Error::NotFound { name, .. }) if segments.last() == Some(&name) => {
            storage.create(&segments, EntryKind::File).await?;
            storage.write_text(&segments, &content).await?;
        }
        written => written?,
    }

    println!("{} {}", "Wrote".green().bold(), join_path(&segments));
    Ok(())
}

/// Run the mkdir and touch commands
pub async fn run_create(ctx: &Context, id: &str, path: &str, kind: EntryKind) -> Result<()> {
    let storages = ctx.load()?;
    let storage = ctx.open(&storages, id).await?;
    let segments = split_path(path);

    storage.create(&segments, kind).await?;

    println!("{} {}", "Created".green().bold(), join_path(&segments));
    Ok(())
}

/// Run the rm command
pub async fn run_rm(ctx: &Context, id: &str, path: &str) -> Result<()> {
    let storages = ctx.load()?;
    let storage = ctx.open(&storages, id).await?;
    let segments = split_path(path);
    let shown = join_path(&segments);

    let entry = storage.stat(&segments).await?;
    if entry.kind == EntryKind::Directory && !ctx.assume_yes() {
        let question = format!("Delete {} and everything below it?", entry.name);
        if !interactive::confirm(&question, false)? {
            return Err(CliError::cancelled("Removal"));
        }
    }

    storage.remove(&segments).await?;

    println!("{} {}", "Deleted".green().bold(), shown);
    Ok(())
}
