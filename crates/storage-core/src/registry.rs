//! Backend registration and restoring storages from configuration

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::backend::Backend;
use crate::config::{StorageConfig, StorageRecord};
use crate::kind::{ProviderDescriptor, ProviderKind};
use crate::provider::StorageProvider;
use crate::storage::Storage;
use crate::{Error, Result};

type Factory = Box<dyn Fn(Uuid) -> Arc<dyn StorageProvider> + Send + Sync>;

struct Registration {
    descriptor: ProviderDescriptor,
    factory: Factory,
}

/// Maps provider kinds to constructors for their backends.
#[derive(Default)]
pub struct BackendRegistry {
    registrations: BTreeMap<ProviderKind, Registration>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend constructor. A later registration for the same
    /// kind replaces the earlier one.
    pub fn register<B, F>(&mut self, make: F)
    where
        B: Backend,
        F: Fn() -> B + Send + Sync + 'static,
    {
        let descriptor = B::DESCRIPTOR;
        debug!(kind = %descriptor.kind, "Registering storage backend");
        self.registrations.insert(
            descriptor.kind,
            Registration {
                descriptor,
                factory: Box::new(move |id| Storage::with_id(id, make()).into_provider()),
            },
        );
    }

    /// Builder form of [`BackendRegistry::register`].
    pub fn with<B, F>(mut self, make: F) -> Self
    where
        B: Backend,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.register(make);
        self
    }

    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.registrations.values().map(|r| r.descriptor).collect()
    }

    pub fn descriptor(&self, kind: ProviderKind) -> Option<ProviderDescriptor> {
        self.registrations.get(&kind).map(|r| r.descriptor)
    }

    fn registration(&self, kind: ProviderKind) -> Result<&Registration> {
        self.registrations
            .get(&kind)
            .ok_or(Error::UnregisteredProvider { kind })
    }

    /// A new, not yet added storage with a fresh id.
    pub fn create(&self, kind: ProviderKind) -> Result<Arc<dyn StorageProvider>> {
        Ok((self.registration(kind)?.factory)(Uuid::new_v4()))
    }

    /// Rebuild a storage from its persisted record.
    pub fn restore(&self, record: &StorageRecord) -> Result<Arc<dyn StorageProvider>> {
        let storage = (self.registration(record.kind)?.factory)(record.id);
        storage.deserialize(&record.data)?;
        Ok(storage)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.registrations.keys())
            .finish()
    }
}

/// The live set of configured storages.
#[derive(Debug, Default)]
pub struct StorageSet {
    storages: Vec<Arc<dyn StorageProvider>>,
}

impl StorageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore every record of `config`.
    ///
    /// # Errors
    ///
    /// Fails on the first record whose kind is not registered or whose
    /// data the backend rejects.
    pub fn from_config(config: &StorageConfig, registry: &BackendRegistry) -> Result<Self> {
        let storages = config
            .storages
            .iter()
            .map(|record| registry.restore(record))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { storages })
    }

    /// Snapshot every storage's connection parameters.
    pub fn to_config(&self) -> StorageConfig {
        StorageConfig {
            storages: self.storages.iter().map(|s| record_of(s.as_ref())).collect(),
            ..StorageConfig::default()
        }
    }

    pub fn insert(&mut self, storage: Arc<dyn StorageProvider>) {
        self.storages.retain(|s| s.id() != storage.id());
        self.storages.push(storage);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Arc<dyn StorageProvider>> {
        let pos = self.storages.iter().position(|s| s.id() == id)?;
        Some(self.storages.remove(pos))
    }

    pub fn get(&self, id: Uuid) -> Option<&Arc<dyn StorageProvider>> {
        self.storages.iter().find(|s| s.id() == id)
    }

    /// Find a storage by full id or by a unique id prefix.
    pub fn find(&self, needle: &str) -> Option<&Arc<dyn StorageProvider>> {
        if let Ok(id) = Uuid::parse_str(needle) {
            return self.get(id);
        }

        let mut matches = self
            .storages
            .iter()
            .filter(|s| s.id().to_string().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Some(found),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StorageProvider>> {
        self.storages.iter()
    }

    pub fn len(&self) -> usize {
        self.storages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }
}

/// The persisted record for a live storage.
pub fn record_of(storage: &dyn StorageProvider) -> StorageRecord {
    StorageRecord {
        kind: storage.descriptor().kind,
        id: storage.id(),
        data: storage.serialize(),
    }
}
