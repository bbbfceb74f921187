//! Backend contract tests
//!
//! Every property here must hold for every backend. Each test body is a
//! generic function over `B: Backend`, instantiated once per backend by the
//! `contract!` macro below, against the same starting tree:
//!
//! ```text
//! design.v      "module top; endmodule"
//! src/alu.v     "module alu; endmodule"
//! ```

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use storage_core::{Backend, Child, EntryKind, EntrySummary, Error, ErrorCategory, Storage};
use storage_local::{AccessMode, LocalBackend, Location};
use storage_memory::MemoryBackend;

const TOP: &str = "module top; endmodule";
const ALU: &str = "module alu; endmodule";

fn memory_storage() -> Arc<Storage<MemoryBackend>> {
    let backend = MemoryBackend::new();
    backend.insert_file("design.v", TOP).unwrap();
    backend.insert_file("src/alu.v", ALU).unwrap();
    Storage::new(backend)
}

fn local_storage() -> (Arc<Storage<LocalBackend>>, TempDir) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("design.v"), TOP).unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src").join("alu.v"), ALU).unwrap();

    let backend = LocalBackend::at(Location::new(dir.path(), AccessMode::ReadWrite));
    (Storage::new(backend), dir)
}

macro_rules! contract {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::memory_storage()).await;
                }
            )*
        }

        mod local {
            $(
                #[tokio::test]
                async fn $name() {
                    let (storage, _dir) = super::local_storage();
                    super::$name(storage).await;
                }
            )*
        }
    };
}

contract!(
    read_write_scenario,
    paths_and_extensions,
    path_walk_errors,
    duplicate_create_keeps_existing_child,
    created_entries_are_listed_without_force,
    deleted_entries_go_stale,
    permission_checks_are_stable,
    tree_covers_every_entry,
    structured_content_round_trips,
    erased_provider_operations,
);

async fn read_write_scenario<B: Backend>(storage: Arc<Storage<B>>) {
    let file = storage.entry(&["design.v"]).await.unwrap();
    assert_eq!(file.name(), "design.v");
    assert_eq!(file.read().await.unwrap(), TOP);

    file.write("module top(input clk); endmodule").await.unwrap();

    assert_eq!(file.read().await.unwrap(), "module top(input clk); endmodule");
    let again = storage.entry(&["design.v"]).await.unwrap();
    assert_eq!(again.read().await.unwrap(), "module top(input clk); endmodule");
}

async fn paths_and_extensions<B: Backend>(storage: Arc<Storage<B>>) {
    let root = storage.root().await.unwrap();
    assert!(root.is_root());
    assert!(root.path().is_empty());
    assert!(root.parent().is_none());

    let alu = storage.entry(&["src", "alu.v"]).await.unwrap();
    assert_eq!(alu.path(), vec!["src", "alu.v"]);
    assert_eq!(alu.extension(), "v");
    assert_eq!(alu.parent().name(), "src");
    assert_eq!(alu.parent().parent().map(|p| p.is_root()), Some(true));

    let src = storage.resolve(&["src"]).await.unwrap();
    assert!(matches!(src.handle(), Child::Directory(_)));
    assert_eq!(src.kind(), EntryKind::Directory);
}

async fn path_walk_errors<B: Backend>(storage: Arc<Storage<B>>) {
    let through_file = storage.entry(&["design.v", "inner.v"]).await.unwrap_err();
    assert!(matches!(through_file, Error::NotADirectory { ref name, .. } if name == "design.v"));

    let absent = storage.entry(&["src", "missing.v"]).await.unwrap_err();
    assert_eq!(
        absent.to_string(),
        "Entry \"missing.v\" in path \"src/missing.v\" does not exist."
    );

    let directory = storage.entry(&["src"]).await.unwrap_err();
    assert_eq!(directory.category(), ErrorCategory::WrongType);
    assert!(directory.to_string().ends_with("is not a file."));
}

async fn duplicate_create_keeps_existing_child<B: Backend>(storage: Arc<Storage<B>>) {
    let root = storage.root().await.unwrap();

    let err = root.create_file("design.v").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Exists);
    assert!(matches!(
        root.create_directory("design.v").await,
        Err(Error::AlreadyExists { .. })
    ));
    assert!(matches!(
        root.create_file("src").await,
        Err(Error::AlreadyExists { .. })
    ));

    let file = storage.entry(&["design.v"]).await.unwrap();
    assert_eq!(file.read().await.unwrap(), TOP);
}

async fn created_entries_are_listed_without_force<B: Backend>(storage: Arc<Storage<B>>) {
    let root = storage.root().await.unwrap();
    root.entries(false).await.unwrap();

    let file = root.create_file("b.v").await.unwrap();
    let build = root.create_directory("build").await.unwrap();
    build.create_file("netlist.json").await.unwrap();

    assert_eq!(file.read().await.unwrap(), "");
    let names: Vec<_> = root
        .entries(false)
        .await
        .unwrap()
        .iter()
        .map(|e| e.name())
        .collect();
    assert_eq!(names, vec!["b.v", "build", "design.v", "src"]);
    assert!(storage.entry(&["build", "netlist.json"]).await.is_ok());
}

async fn deleted_entries_go_stale<B: Backend>(storage: Arc<Storage<B>>) {
    let file = storage.entry(&["design.v"]).await.unwrap();
    let copy = file.clone();

    file.delete().await.unwrap();

    assert_eq!(copy.read().await.unwrap_err().category(), ErrorCategory::Missing);
    assert!(storage.root().await.unwrap().entry("design.v", false).await.unwrap().is_none());

    let src = storage.resolve(&["src"]).await.unwrap();
    src.delete().await.unwrap();
    assert!(matches!(
        storage.entry(&["src", "alu.v"]).await,
        Err(Error::NotFound { .. })
    ));

    let root = storage.root().await.unwrap();
    assert!(matches!(root.delete().await, Err(Error::RootDeletion)));
}

async fn permission_checks_are_stable<B: Backend>(storage: Arc<Storage<B>>) {
    let first = storage.has_permission().await;
    let second = storage.has_permission().await;
    assert_eq!(first, second);
    assert!(first);
    assert!(storage.request_permission().await);
}

async fn tree_covers_every_entry<B: Backend>(storage: Arc<Storage<B>>) {
    let root = storage.root().await.unwrap();
    let tree = root.tree().await.unwrap();

    assert_eq!(
        tree,
        format!(
            "{} (D)\n|  design.v (F)\n|  src (D)\n|  |  alu.v (F)\n",
            root.name()
        )
    );
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Cell {
    kind: String,
    inputs: Vec<String>,
    delay_ps: Option<u32>,
}

async fn structured_content_round_trips<B: Backend>(storage: Arc<Storage<B>>) {
    let root = storage.root().await.unwrap();
    let file = root.create_file("cells.json").await.unwrap();
    let cells = vec![
        Cell {
            kind: "AND".into(),
            inputs: vec!["a".into(), "b".into()],
            delay_ps: Some(12),
        },
        Cell {
            kind: "NOT".into(),
            inputs: vec!["c".into()],
            delay_ps: None,
        },
    ];

    file.write_structured(&cells).await.unwrap();
    let back: Vec<Cell> = file.read_structured().await.unwrap();
    assert_eq!(back, cells);

    file.write("[{\"kind\":").await.unwrap();
    let err = file.read_structured::<Vec<Cell>>().await.unwrap_err();
    assert!(err.is_parse());
}

async fn erased_provider_operations<B: Backend>(storage: Arc<Storage<B>>) {
    let provider = storage.into_provider();
    let path = |p: &str| storage_core::split_path(p);

    assert_eq!(
        provider.list(&[], false).await.unwrap(),
        vec![
            EntrySummary {
                name: "design.v".into(),
                kind: EntryKind::File,
            },
            EntrySummary {
                name: "src".into(),
                kind: EntryKind::Directory,
            },
        ]
    );
    assert_eq!(provider.stat(&path("src")).await.unwrap().kind, EntryKind::Directory);

    provider.create(&path("src/rtl"), EntryKind::Directory).await.unwrap();
    provider.create(&path("src/rtl/regs.v"), EntryKind::File).await.unwrap();
    provider
        .write_text(&path("src/rtl/regs.v"), "module regs; endmodule")
        .await
        .unwrap();
    assert_eq!(
        provider.read_text(&path("src/rtl/regs.v")).await.unwrap(),
        "module regs; endmodule"
    );

    provider.remove(&path("src/rtl")).await.unwrap();
    assert!(matches!(
        provider.read_text(&path("src/rtl/regs.v")).await,
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        provider.read_text(&[]).await,
        Err(Error::NotAFile { .. })
    ));

    let mut tree = String::new();
    provider.print_tree(&mut tree).await.unwrap();
    assert!(tree.ends_with("|  src (D)\n|  |  alu.v (F)\n"));
}
