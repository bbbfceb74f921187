//! Storage CLI
//!
//! Browse and edit files in configured storages: local folders and
//! in-memory trees.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;
mod logging;

use clap::Parser;
use colored::Colorize;
use storage_core::EntryKind;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    let Some(command) = cli.command else {
        // No command provided - show help hint
        println!("{} Storage CLI", "storage".green().bold());
        println!();
        println!("Run {} for available commands.", "storage --help".cyan());
        return Ok(());
    };

    let ctx = Context::new(cli.config, cli.yes)?;
    execute_command(&ctx, command).await
}

async fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::List => commands::run_list(ctx),
        Commands::Add { backend } => commands::run_add(ctx, backend).await,
        Commands::Remove { id } => commands::run_remove(ctx, &id),
        Commands::Tree { id } => commands::run_tree(ctx, &id).await,
        Commands::Cat { id, path } => commands::run_cat(ctx, &id, &path).await,
        Commands::Write { id, path, content } => {
            commands::run_write(ctx, &id, &path, content).await
        }
        Commands::Mkdir { id, path } => {
            commands::run_create(ctx, &id, &path, EntryKind::Directory).await
        }
        Commands::Touch { id, path } => commands::run_create(ctx, &id, &path, EntryKind::File).await,
        Commands::Rm { id, path } => commands::run_rm(ctx, &id, &path).await,
        Commands::Open { id, path } => commands::run_open(ctx, &id, &path).await,
    }
}
