//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based confirmation, selection, and input.

use async_trait::async_trait;
use dialoguer::{Confirm, Input, Select};
use storage_core::ProviderDescriptor;
use storage_local::{Location, PermissionPrompt};
use tracing::warn;

use crate::error::Result;

/// Ask a yes/no question.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Ask for a line of text.
pub fn ask_text(prompt: &str, default: &str) -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?)
}

/// Let the user pick which kind of storage to add. `None` when cancelled.
pub fn choose_backend(descriptors: &[ProviderDescriptor]) -> Result<Option<ProviderDescriptor>> {
    let items: Vec<String> = descriptors.iter().map(ProviderDescriptor::add_prompt).collect();
    let choice = Select::new()
        .with_prompt("What would you like to add?")
        .items(&items)
        .default(0)
        .interact_opt()?;
    Ok(choice.map(|i| descriptors[i]))
}

/// Permission prompt for local storages, answered on the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    /// Grant without asking (`--yes`)
    pub assume_yes: bool,
}

#[async_trait]
impl PermissionPrompt for TerminalPrompt {
    async fn confirm(&self, location: &Location) -> bool {
        if self.assume_yes {
            return true;
        }

        let question = format!(
            "Allow {} access to {}?",
            location.access,
            location.root.display()
        );
        match tokio::task::spawn_blocking(move || confirm(&question, false)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(error = %e, "Permission prompt failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Permission prompt was interrupted");
                false
            }
        }
    }
}
