//! Persisted storage configuration
//!
//! The configuration is a list of records, one per storage, each holding
//! the provider kind, the storage id, and the backend's own serialized
//! connection parameters. The file format is picked from the extension:
//!
//! - `.json` -> JSON
//! - `.toml` -> TOML
//! - `.yaml`, `.yml` -> YAML

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::ConfigMap;
use crate::kind::ProviderKind;
use crate::{Error, Result, io};

/// Current configuration format version
pub const CONFIG_VERSION: &str = "1.0";

/// One persisted storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    pub id: Uuid,
    #[serde(default)]
    pub data: ConfigMap,
}

/// The full persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub storages: Vec<StorageRecord>,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            storages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let format = Format::detect(path)?;
        let content = io::read_text(path)?;

        let parse_error = |message: String| Error::ConfigParse {
            path: path.to_path_buf(),
            format: format.name().into(),
            message,
        };

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            Format::Yaml => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        };

        debug!(path = %path.display(), storages = config.storages.len(), "Loaded storage config");
        Ok(config)
    }

    /// Load configuration, treating a missing file as an empty one.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No storage config yet, starting empty");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = Format::detect(path)?;

        let serialize_error = |message: String| Error::ConfigSerialize {
            path: path.to_path_buf(),
            format: format.name().into(),
            message,
        };

        let content = match format {
            Format::Json => {
                serde_json::to_string_pretty(self).map_err(|e| serialize_error(e.to_string()))?
            }
            Format::Toml => toml::to_string_pretty(self).map_err(|e| serialize_error(e.to_string()))?,
            Format::Yaml => serde_yaml::to_string(self).map_err(|e| serialize_error(e.to_string()))?,
        };

        io::write_atomic(path, content.as_bytes())?;
        info!(path = %path.display(), storages = self.storages.len(), "Saved storage config");
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&StorageRecord> {
        self.storages.iter().find(|r| r.id == id)
    }

    /// Insert a record, replacing any existing record with the same id.
    pub fn upsert(&mut self, record: StorageRecord) {
        match self.storages.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.storages.push(record),
        }
    }

    /// Remove a record by id, returning it if present.
    pub fn remove(&mut self, id: Uuid) -> Option<StorageRecord> {
        let pos = self.storages.iter().position(|r| r.id == id)?;
        Some(self.storages.remove(pos))
    }
}
