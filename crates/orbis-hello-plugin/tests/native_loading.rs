// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loads real shared libraries from the build output through `NativeLoader`.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

use orbis_hello_plugin::{Greeting, Status};
use orbis_plugin::{BinaryLoader, Manifest, NativeLoader, PluginRegistry, RegistryOptions};
use orbis_test_utils::PluginTree;

/// Directories cargo writes build artifacts to for this test run.
fn artifact_dirs() -> Vec<PathBuf> {
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap().to_path_buf();
    let profile = deps.parent().unwrap().to_path_buf();
    vec![profile, deps]
}

/// First shared library named `<prefix><stem>[-hash]<suffix>` in the build output.
fn find_library(stem: &str) -> PathBuf {
    let exact = format!("{DLL_PREFIX}{stem}{DLL_SUFFIX}");
    let hashed = format!("{DLL_PREFIX}{stem}-");
    for dir in artifact_dirs() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut matches: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| {
                        n == exact || (n.starts_with(&hashed) && n.ends_with(DLL_SUFFIX))
                    })
            })
            .collect();
        matches.sort();
        if let Some(found) = matches.into_iter().next() {
            return found;
        }
    }
    panic!("no {exact} in {:?}", artifact_dirs());
}

fn hello_library() -> PathBuf {
    find_library("orbis_hello_plugin")
}

/// A proc-macro dependency: a real shared library with no plugin declaration.
fn foreign_library() -> PathBuf {
    find_library("async_trait")
}

#[test]
fn native_loader_reads_hello_declaration() {
    let path = hello_library();
    assert!(NativeLoader.is_candidate(&path));

    let binary = NativeLoader.load(&path).unwrap();
    assert_eq!(binary.path(), path.as_path());

    let manifest = Manifest::try_read(binary.as_ref()).expect("hello declares a manifest");
    assert_eq!(manifest.id, "hello");
    assert_eq!(manifest.version, env!("CARGO_PKG_VERSION"));

    let types: Vec<&str> = binary.factories().iter().map(|f| f.type_name).collect();
    assert_eq!(types, vec!["Greeter", "Uptime"]);
}

#[test]
fn library_without_entry_symbol_is_not_a_plugin() {
    let path = foreign_library();

    let binary = NativeLoader.load(&path).expect("opening a valid library succeeds");

    assert!(binary.metadata().is_empty());
    assert!(binary.factories().is_empty());
    assert!(Manifest::try_read(binary.as_ref()).is_none());
}

#[tokio::test]
async fn registry_loads_hello_from_plugin_root() {
    let tree = PluginTree::new().unwrap();
    let hello = hello_library();
    let foreign = foreign_library();
    tree.copy_in(&hello, &format!("hello/{}", file_name(&hello))).unwrap();
    tree.copy_in(&foreign, &format!("hello/{}", file_name(&foreign))).unwrap();
    tree.touch(&format!("junk/{DLL_PREFIX}junk{DLL_SUFFIX}")).unwrap();

    let registry = PluginRegistry::new(RegistryOptions::new(tree.root()));
    let report = registry.initialize().await;

    assert_eq!(report.discovery.candidates, 3);
    assert_eq!(report.discovery.plugins, 1);
    assert_eq!(report.discovery.not_plugins, 1);
    assert_eq!(report.discovery.failed, 1);
    assert_eq!(report.instances, 2);

    let unit = registry.get_plugin("hello").unwrap();
    assert_eq!(unit.plugin_dir, tree.root().join("hello"));

    let greeters = registry.instances_implementing::<dyn Greeting>();
    assert_eq!(greeters.len(), 1);
    assert_eq!(greeters[0].greet("host").unwrap(), "Hello, host!");
    assert_eq!(registry.instances_implementing::<dyn Status>().len(), 1);

    let unloaded = registry.unload().await;
    assert_eq!(unloaded.unloaded, 2);
    assert_eq!(unloaded.failed, 0);
    assert!(greeters[0].greet("host").is_err());
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
