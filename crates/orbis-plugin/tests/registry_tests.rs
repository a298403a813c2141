// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end registry behavior against fixture binaries on a temp plugin root.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use orbis_core::InstanceState;
use orbis_plugin::{DiscoveryStats, PluginRegistry, RegistryOptions};
use orbis_test_utils::{
    AuditPlugin, Auditor, FixtureLoader, Labelled, MockPlugin, PluginTree, StaticBinary,
};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

fn registry(tree: &PluginTree, loader: FixtureLoader) -> PluginRegistry {
    PluginRegistry::with_loader(RegistryOptions::new(tree.root()), loader.into_arc())
}

fn alpha() -> StaticBinary {
    StaticBinary::new("alpha.plugin")
        .with_manifest("p1", "Alpha")
        .with_factory("Healthy", MockPlugin::healthy)
}

#[tokio::test]
async fn missing_root_yields_empty_registry() {
    let tree = PluginTree::new().unwrap();
    let registry = PluginRegistry::with_loader(
        RegistryOptions::new(tree.root().join("does-not-exist")),
        FixtureLoader::new().into_arc(),
    );

    let report = registry.initialize().await;

    assert_eq!(report.discovery, DiscoveryStats::default());
    assert!(registry.is_empty());
    assert!(registry.all_manifests().is_empty());
    assert!(registry.loaded_binaries().is_empty());
    assert!(registry.instances().is_empty());
}

#[tokio::test]
async fn alpha_with_non_plugin_sibling() {
    let tree = PluginTree::new().unwrap();
    tree.touch("A/alpha.plugin").unwrap();
    tree.touch("B/helper.plugin").unwrap();
    let registry = registry(&tree, FixtureLoader::new().with_binary("alpha.plugin", alpha()));

    let report = registry.initialize().await;

    let manifests = registry.all_manifests();
    assert_eq!(manifests.len(), 1);
    assert_eq!(manifests[0].id, "p1");
    assert_eq!(manifests[0].name, "Alpha");

    let unit = registry.get_plugin("p1").expect("p1 should be loaded");
    assert_eq!(unit.instances.len(), 1);
    assert_eq!(unit.instances[0].state(), InstanceState::Initialized);
    assert_eq!(unit.plugin_dir, tree.root().join("A"));
    assert_eq!(unit.binary.path(), tree.root().join("A/alpha.plugin"));

    assert_eq!(report.discovery.candidates, 2);
    assert_eq!(report.discovery.not_plugins, 1);
    assert_eq!(report.plugins, 1);
    assert_eq!(report.instances, 1);
    assert!(registry.get_plugin("helper").is_none());
}

#[tokio::test]
async fn binaries_without_id_or_name_are_excluded() {
    let tree = PluginTree::new().unwrap();
    tree.touch("a/no-id.plugin").unwrap();
    tree.touch("b/no-name.plugin").unwrap();
    tree.touch("c/blank-id.plugin").unwrap();
    tree.touch("d/ok.plugin").unwrap();
    let loader = FixtureLoader::new()
        .with_binary(
            "no-id.plugin",
            StaticBinary::new("x").with_meta("Plugin.Name", "Nameless"),
        )
        .with_binary(
            "no-name.plugin",
            StaticBinary::new("x").with_meta("Plugin.Id", "anonymous"),
        )
        .with_binary("blank-id.plugin", StaticBinary::new("x").with_manifest("  ", "Blank"))
        .with_binary("ok.plugin", StaticBinary::new("x").with_manifest("ok", "Ok"));
    let registry = registry(&tree, loader);

    registry.initialize().await;

    let ids: Vec<String> = registry.all_manifests().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["ok"]);
}

#[tokio::test]
async fn manifest_without_capability_types_has_empty_unit() {
    let tree = PluginTree::new().unwrap();
    tree.touch("themes/dark.plugin").unwrap();
    let loader = FixtureLoader::new().with_binary(
        "dark.plugin",
        StaticBinary::new("x")
            .with_manifest("dark-theme", "Dark Theme")
            .with_meta("Plugin.Author", "Design Team")
            .with_meta("Plugin.Version", "3.1.0"),
    );
    let registry = registry(&tree, loader);

    registry.initialize().await;

    let unit = registry.get_plugin("dark-theme").unwrap();
    assert!(unit.instances.is_empty());
    assert_eq!(unit.manifest.author, "Design Team");
    assert_eq!(unit.manifest.version, "3.1.0");
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn throwing_constructor_leaves_empty_unit() {
    let tree = PluginTree::new().unwrap();
    tree.touch("a/broken.plugin").unwrap();
    let loader = FixtureLoader::new().with_binary(
        "broken.plugin",
        StaticBinary::new("x")
            .with_manifest("broken", "Broken")
            .with_factory("Refuses", MockPlugin::failing_construct)
            .with_factory("Panics", MockPlugin::panicking_construct),
    );
    let registry = registry(&tree, loader);

    registry.initialize().await;

    let unit = registry.get_plugin("broken").expect("manifest should still register");
    assert!(unit.instances.is_empty());
}

#[tokio::test]
async fn load_failures_are_isolated() {
    let tree = PluginTree::new().unwrap();
    tree.touch("a/alpha.plugin").unwrap();
    tree.touch("b/corrupt.plugin").unwrap();
    tree.touch("c/explodes.plugin").unwrap();
    let loader = FixtureLoader::new()
        .with_binary("alpha.plugin", alpha())
        .with_failure("corrupt.plugin", "unexpected end of file")
        .with_panic("explodes.plugin");
    let registry = registry(&tree, loader);

    let report = registry.initialize().await;

    assert_eq!(report.discovery.failed, 2);
    assert_eq!(report.plugins, 1);
    assert!(registry.get_plugin("p1").is_some());
}

#[tokio::test]
async fn capability_queries_skip_failed_instances() {
    let tree = PluginTree::new().unwrap();
    tree.touch("a/mixed.plugin").unwrap();
    tree.touch("b/audit.plugin").unwrap();
    let loader = FixtureLoader::new()
        .with_binary(
            "mixed.plugin",
            StaticBinary::new("x")
                .with_manifest("mixed", "Mixed")
                .with_factory("FailingInit", MockPlugin::failing_init)
                .with_factory("PanickingInit", MockPlugin::panicking_init)
                .with_factory("Companion", MockPlugin::companion),
        )
        .with_binary(
            "audit.plugin",
            StaticBinary::new("x")
                .with_manifest("audit", "Audit")
                .with_factory("AuditPlugin", AuditPlugin::construct),
        );
    let registry = registry(&tree, loader);

    registry.initialize().await;

    // Both concrete types provide `Labelled`; the failed mocks are excluded.
    let mut labels: Vec<String> = registry
        .instances_implementing::<dyn Labelled>()
        .iter()
        .map(|l| l.label())
        .collect();
    labels.sort();
    assert_eq!(labels, vec!["audit", "mock:companion"]);

    let auditors = registry.instances_implementing::<dyn Auditor>();
    assert_eq!(auditors.len(), 1);
    assert!(!auditors[0].calls_for("audit").is_empty());

    assert!(registry.instances_implementing::<dyn std::fmt::Display + Send + Sync>().is_empty());

    assert_eq!(registry.instances_of::<AuditPlugin>().len(), 1);
    let typed = registry.instances_of::<MockPlugin>();
    assert_eq!(typed.len(), 1);
    assert_eq!(orbis_core::Plugin::name(typed[0].as_ref()), "companion");
}

#[tokio::test]
async fn initialization_follows_discovery_order() {
    let tree = PluginTree::new().unwrap();
    tree.touch("b/second.plugin").unwrap();
    tree.touch("a/first.plugin").unwrap();
    let loader = FixtureLoader::new()
        .with_binary(
            "first.plugin",
            StaticBinary::new("x")
                .with_manifest("first", "First")
                .with_factory("Healthy", MockPlugin::healthy)
                .with_factory("Companion", MockPlugin::companion),
        )
        .with_binary(
            "second.plugin",
            StaticBinary::new("x")
                .with_manifest("second", "Second")
                .with_factory("AuditPlugin", AuditPlugin::construct),
        );
    let registry = registry(&tree, loader);

    registry.initialize().await;

    let ids: Vec<String> = registry.all_manifests().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["first", "second"]);
    let names: Vec<String> = registry
        .instances()
        .iter()
        .map(|i| i.name().to_string())
        .collect();
    assert_eq!(names, vec!["healthy", "companion", "audit"]);
}

#[tokio::test]
#[traced_test]
async fn initialize_twice_is_idempotent() {
    let tree = PluginTree::new().unwrap();
    tree.touch("A/alpha.plugin").unwrap();
    tree.touch("B/dark.plugin").unwrap();
    let loader = FixtureLoader::new()
        .with_binary("alpha.plugin", alpha())
        .with_binary("dark.plugin", StaticBinary::new("x").with_manifest("dark", "Dark"));
    let registry = registry(&tree, loader);

    registry.initialize().await;
    let first = registry.all_manifests();
    let first_instance = Arc::clone(&registry.get_plugin("p1").unwrap().instances[0]);

    registry.initialize().await;
    let second = registry.all_manifests();
    let second_instance = Arc::clone(&registry.get_plugin("p1").unwrap().instances[0]);

    assert_eq!(first, second);
    assert!(!Arc::ptr_eq(&first_instance, &second_instance));
    assert!(logs_contain("re-initializing without unload"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_partial_state() {
    let tree = PluginTree::new().unwrap();
    let mut loader = FixtureLoader::new();
    for i in 0..16 {
        let file = format!("p{i:02}.plugin");
        tree.touch(&format!("dir{i:02}/{file}")).unwrap();
        let id = format!("p{i:02}");
        loader = loader.with_binary(
            &file,
            StaticBinary::new("x")
                .with_manifest(&id, &id)
                .with_factory("Healthy", MockPlugin::healthy),
        );
    }
    let registry = Arc::new(registry(&tree, loader));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                let mut observed = 0usize;
                while !done.load(Ordering::Acquire) {
                    let count = registry.all_manifests().len();
                    assert!(count == 0 || count == 16, "observed partial registry: {count}");
                    observed += 1;
                    tokio::task::yield_now().await;
                }
                observed
            })
        })
        .collect();

    registry.initialize().await;
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
    assert_eq!(registry.len(), 16);
}

#[tokio::test(start_paused = true)]
async fn init_timeout_discards_hanging_instance() {
    let tree = PluginTree::new().unwrap();
    tree.touch("a/slow.plugin").unwrap();
    let loader = FixtureLoader::new().with_binary(
        "slow.plugin",
        StaticBinary::new("x")
            .with_manifest("slow", "Slow")
            .with_factory("Hanging", MockPlugin::hanging_init)
            .with_factory("Companion", MockPlugin::companion),
    );
    let mut options = RegistryOptions::new(tree.root());
    options.init_timeout = Some(Duration::from_secs(30));
    let registry = PluginRegistry::with_loader(options, loader.into_arc());

    registry.initialize().await;

    let unit = registry.get_plugin("slow").unwrap();
    assert_eq!(unit.instances.len(), 1);
    assert_eq!(unit.instances[0].name(), "companion");
}

#[tokio::test]
async fn cancellation_discards_pending_initialization() {
    let tree = PluginTree::new().unwrap();
    tree.touch("a/alpha.plugin").unwrap();
    tree.touch("z/slow.plugin").unwrap();
    let loader = FixtureLoader::new()
        .with_binary("alpha.plugin", alpha())
        .with_binary(
            "slow.plugin",
            StaticBinary::new("x")
                .with_manifest("slow", "Slow")
                .with_factory("Hanging", MockPlugin::hanging_init),
        );
    let registry = registry(&tree, loader);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        trigger.cancel();
    });
    let report = registry.initialize_with(&cancel).await;

    assert_eq!(report.plugins, 2);
    assert_eq!(registry.get_plugin("p1").unwrap().instances.len(), 1);
    assert!(registry.get_plugin("slow").unwrap().instances.is_empty());
}

#[tokio::test]
async fn loaded_binaries_expose_handles_in_order() {
    let tree = PluginTree::new().unwrap();
    tree.touch("A/alpha.plugin").unwrap();
    tree.touch("B/dark.plugin").unwrap();
    let loader = FixtureLoader::new()
        .with_binary("alpha.plugin", alpha())
        .with_binary("dark.plugin", StaticBinary::new("x").with_manifest("dark", "Dark"));
    let registry = registry(&tree, loader);

    registry.initialize().await;

    let paths: Vec<_> = registry
        .loaded_binaries()
        .iter()
        .map(|b| b.path().to_path_buf())
        .collect();
    assert_eq!(
        paths,
        vec![
            tree.root().join("A/alpha.plugin"),
            tree.root().join("B/dark.plugin"),
        ]
    );
}
