//! Restoring heterogeneous storage sets from persisted configuration

use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use uuid::Uuid;

use storage_core::{
    BackendRegistry, Error, ProviderKind, Storage, StorageConfig, StorageRecord, StorageSet,
    record_of, split_path,
};
use storage_local::{AccessMode, AutoAnswer, LocalBackend, Location};
use storage_memory::MemoryBackend;

fn registry(prompt: AutoAnswer) -> BackendRegistry {
    BackendRegistry::new()
        .with(move || LocalBackend::new().with_prompt(prompt))
        .with(MemoryBackend::new)
}

fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

#[tokio::test]
async fn mixed_set_survives_a_save_and_load() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    fs::create_dir(&project).unwrap();
    fs::write(project.join("design.v"), "module top; endmodule").unwrap();

    let mut set = StorageSet::new();
    set.insert(
        Storage::with_id(
            id(1),
            LocalBackend::at(Location::new(&project, AccessMode::ReadWrite)),
        )
        .into_provider(),
    );
    set.insert(Storage::with_id(id(2), MemoryBackend::new().with_label("scratchpad")).into_provider());

    let config_path = temp.path().join("storages.yaml");
    set.to_config().save(&config_path).unwrap();

    let config = StorageConfig::load(&config_path).unwrap();
    let restored = StorageSet::from_config(&config, &registry(AutoAnswer::GRANT)).unwrap();

    assert_eq!(restored.len(), 2);
    let ids: Vec<_> = restored.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec![id(1), id(2)]);

    let memory = restored.get(id(2)).unwrap();
    assert_eq!(memory.descriptor().kind, ProviderKind::Memory);
    assert_eq!(memory.serialize()["label"], json!("scratchpad"));

    let local = restored.get(id(1)).unwrap();
    assert!(!local.has_permission().await, "restored local storages start locked");
    assert!(local.request_permission().await);
    assert_eq!(
        local.read_text(&split_path("design.v")).await.unwrap(),
        "module top; endmodule"
    );
}

#[tokio::test]
async fn declined_prompt_keeps_a_restored_storage_locked() {
    let temp = TempDir::new().unwrap();
    let record = StorageRecord {
        kind: ProviderKind::Local,
        id: id(7),
        data: match json!({"root": temp.path(), "access": "read"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        },
    };

    let storage = registry(AutoAnswer::DECLINE).restore(&record).unwrap();

    assert!(!storage.request_permission().await);
    let err = storage.list(&[], false).await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied { .. }));
}

#[test]
fn unregistered_kind_fails_the_whole_restore() {
    let mut config = StorageConfig::default();
    config.upsert(StorageRecord {
        kind: ProviderKind::Memory,
        id: id(1),
        data: Default::default(),
    });
    config.upsert(StorageRecord {
        kind: ProviderKind::Local,
        id: id(2),
        data: Default::default(),
    });
    let memory_only = BackendRegistry::new().with(MemoryBackend::new);

    let err = StorageSet::from_config(&config, &memory_only).unwrap_err();

    assert!(matches!(
        err,
        Error::UnregisteredProvider {
            kind: ProviderKind::Local
        }
    ));
}

#[test]
fn created_storages_get_fresh_ids() {
    let registry = registry(AutoAnswer::GRANT);
    let a = registry.create(ProviderKind::Memory).unwrap();
    let b = registry.create(ProviderKind::Memory).unwrap();

    assert_ne!(a.id(), b.id());
    assert_eq!(a.descriptor().add_prompt(), "Add Memory storage");
    assert_eq!(
        registry.descriptor(ProviderKind::Local).map(|d| d.display_name),
        Some("Local")
    );
}

#[test]
fn find_accepts_unique_prefixes_only() {
    let mut set = StorageSet::new();
    let first = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000001").unwrap();
    let second = Uuid::parse_str("a1b2ffff-0000-4000-8000-000000000002").unwrap();
    set.insert(Storage::with_id(first, MemoryBackend::new()).into_provider());
    set.insert(Storage::with_id(second, MemoryBackend::new()).into_provider());

    assert_eq!(set.find("a1b2c3").map(|s| s.id()), Some(first));
    assert_eq!(set.find(&second.to_string()).map(|s| s.id()), Some(second));
    assert!(set.find("a1b2").is_none(), "ambiguous prefix");
    assert!(set.find("ffff").is_none());
}

#[test]
fn inserting_an_existing_id_replaces_it() {
    let mut set = StorageSet::new();
    set.insert(Storage::with_id(id(3), MemoryBackend::new().with_label("old")).into_provider());
    set.insert(Storage::with_id(id(3), MemoryBackend::new().with_label("new")).into_provider());

    assert_eq!(set.len(), 1);
    let record = record_of(set.get(id(3)).unwrap().as_ref());
    assert_eq!(record.data["label"], json!("new"));

    assert!(set.remove(id(3)).is_some());
    assert!(set.is_empty());
    assert!(set.remove(id(3)).is_none());
}
