//! Configuration location and the storages it describes

use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage_core::{BackendRegistry, StorageConfig, StorageProvider, StorageSet};
use storage_local::LocalBackend;
use storage_memory::MemoryBackend;
use tracing::debug;

use crate::error::{CliError, Result};
use crate::interactive::TerminalPrompt;

/// Where the storage list lives when `--config` is not given.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("storage").join("storages.json"))
        .ok_or_else(|| {
            CliError::user("Could not determine the configuration directory; pass --config")
        })
}

/// Global options shared by every command.
#[derive(Debug)]
pub struct Context {
    config_path: PathBuf,
    assume_yes: bool,
}

impl Context {
    pub fn new(config: Option<PathBuf>, assume_yes: bool) -> Result<Self> {
        let config_path = match config {
            Some(path) => path,
            None => default_config_path()?,
        };
        debug!(config = %config_path.display(), "Using storage configuration");
        Ok(Self {
            config_path,
            assume_yes,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn assume_yes(&self) -> bool {
        self.assume_yes
    }

    pub fn prompt(&self) -> TerminalPrompt {
        TerminalPrompt {
            assume_yes: self.assume_yes,
        }
    }

    /// Every backend this binary knows how to restore.
    pub fn registry(&self) -> BackendRegistry {
        let prompt = self.prompt();
        BackendRegistry::new()
            .with(move || LocalBackend::new().with_prompt(prompt))
            .with(MemoryBackend::new)
    }

    pub fn load(&self) -> Result<StorageSet> {
        let config = StorageConfig::load_or_default(&self.config_path)?;
        Ok(StorageSet::from_config(&config, &self.registry())?)
    }

    pub fn save(&self, storages: &StorageSet) -> Result<()> {
        storages.to_config().save(&self.config_path)?;
        Ok(())
    }

    /// Find a storage by id or prefix and make sure it may be accessed.
    pub async fn open<'a>(
        &self,
        storages: &'a StorageSet,
        id: &str,
    ) -> Result<&'a Arc<dyn StorageProvider>> {
        let storage = find(storages, id)?;
        if !storage.request_permission().await {
            return Err(CliError::user(format!(
                "Access to {} storage {} was not granted",
                storage.descriptor().display_name,
                storage.id()
            )));
        }
        Ok(storage)
    }
}

/// Find a storage by id or unique id prefix.
pub fn find<'a>(storages: &'a StorageSet, id: &str) -> Result<&'a Arc<dyn StorageProvider>> {
    storages.find(id).ok_or_else(|| {
        CliError::user(format!(
            "No storage matches \"{id}\". Run `storage list` to see configured storages."
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_core::ProviderKind;

    #[test]
    fn default_config_is_a_json_file() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("storage/storages.json"));
        }
    }

    #[test]
    fn registry_knows_every_provider_kind() {
        let ctx = Context::new(Some("storages.json".into()), true).unwrap();
        let kinds: Vec<_> = ctx.registry().descriptors().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, ProviderKind::ALL.to_vec());
    }

    #[test]
    fn missing_config_loads_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = Context::new(Some(dir.path().join("storages.json")), false).unwrap();
        assert!(ctx.load().unwrap().is_empty());
    }
}
