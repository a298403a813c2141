// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide plugin registry.
//!
//! `PluginRegistry` maps plugin id to [`LoadedUnit`]. Readers work against an
//! immutable snapshot published through [`ArcSwap`], so they never block and
//! never observe a half-built map. `initialize` and `unload` build or tear
//! down state under a single lifecycle lock and publish the result with one
//! pointer swap.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use orbis_config::PluginsConfig;
use orbis_core::Plugin;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::binary::{BinaryHandle, BinaryLoader, NativeLoader};
use crate::discovery::{DiscoveredPlugin, Discoverer, DiscoveryStats};
use crate::loader::{LoadOptions, Loader, PluginInstance};
use crate::manifest::Manifest;

/// One discovered binary after loading: its manifest, handle, and live instances.
#[derive(Debug)]
pub struct LoadedUnit {
    pub manifest: Manifest,
    /// Kept alive for the rest of the process; see [`crate::binary`].
    pub binary: BinaryHandle,
    /// Subdirectory of the plugin root the binary was found in.
    pub plugin_dir: PathBuf,
    /// Initialized instances in declaration order. May be empty.
    pub instances: Vec<Arc<PluginInstance>>,
}

/// Immutable registry contents. Units are kept in discovery order.
#[derive(Debug, Default)]
struct Snapshot {
    units: Vec<Arc<LoadedUnit>>,
    index: HashMap<String, usize>,
}

impl Snapshot {
    /// Insert keyed by manifest id. A duplicate id replaces the earlier unit
    /// in place and returns it.
    fn insert(&mut self, unit: LoadedUnit) -> Option<Arc<LoadedUnit>> {
        let unit = Arc::new(unit);
        match self.index.get(&unit.manifest.id) {
            Some(&slot) => Some(std::mem::replace(&mut self.units[slot], unit)),
            None => {
                self.index
                    .insert(unit.manifest.id.clone(), self.units.len());
                self.units.push(unit);
                None
            }
        }
    }

    fn instances(&self) -> impl Iterator<Item = &Arc<PluginInstance>> {
        self.units.iter().flat_map(|u| u.instances.iter())
    }
}

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Plugin root scanned on every `initialize`.
    pub root: PathBuf,
    pub init_timeout: Option<Duration>,
    pub unload_timeout: Option<Duration>,
}

impl RegistryOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            init_timeout: None,
            unload_timeout: None,
        }
    }
}

impl From<&PluginsConfig> for RegistryOptions {
    fn from(config: &PluginsConfig) -> Self {
        Self {
            root: config.directory.clone(),
            init_timeout: config.init_timeout(),
            unload_timeout: config.unload_timeout(),
        }
    }
}

/// Outcome of [`PluginRegistry::initialize`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InitializeReport {
    pub discovery: DiscoveryStats,
    /// Units in the registry after the swap.
    pub plugins: usize,
    /// Initialized instances across all units.
    pub instances: usize,
    /// Units dropped because a later binary declared the same id.
    pub replaced: usize,
}

/// Outcome of [`PluginRegistry::unload`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UnloadReport {
    /// Unload hooks that completed successfully.
    pub unloaded: usize,
    /// Unload hooks that failed, timed out, or were cancelled.
    pub failed: usize,
}

/// Authoritative store of loaded plugins.
pub struct PluginRegistry {
    options: RegistryOptions,
    discoverer: Discoverer,
    loader: Loader,
    state: ArcSwap<Snapshot>,
    lifecycle: Mutex<()>,
}

impl PluginRegistry {
    /// Create an empty registry that loads native shared libraries.
    pub fn new(options: RegistryOptions) -> Self {
        Self::with_loader(options, Arc::new(NativeLoader))
    }

    /// Create an empty registry with a custom binary loader.
    pub fn with_loader(options: RegistryOptions, loader: Arc<dyn BinaryLoader>) -> Self {
        let load_options = LoadOptions {
            init_timeout: options.init_timeout,
        };
        Self {
            options,
            discoverer: Discoverer::new(loader),
            loader: Loader::new(load_options),
            state: ArcSwap::from_pointee(Snapshot::default()),
            lifecycle: Mutex::new(()),
        }
    }

    /// Discover and load every plugin under the configured root, replacing
    /// the current contents.
    pub async fn initialize(&self) -> InitializeReport {
        self.initialize_with(&CancellationToken::new()).await
    }

    /// Like [`PluginRegistry::initialize`], abandoning pending plugin
    /// initialization when `cancel` fires. Plugins whose initialization was
    /// abandoned are treated as failed; everything else still loads.
    pub async fn initialize_with(&self, cancel: &CancellationToken) -> InitializeReport {
        let _guard = self.lifecycle.lock().await;

        if !self.state.load().units.is_empty() {
            warn!("re-initializing without unload; previous instances are dropped without their unload hook");
        }

        let (discovered, discovery) = self.scan().await;

        let mut next = Snapshot::default();
        let mut report = InitializeReport {
            discovery,
            ..InitializeReport::default()
        };

        for DiscoveredPlugin {
            manifest,
            binary,
            plugin_dir,
        } in discovered
        {
            let instances = self.loader.load_with(binary.as_ref(), cancel).await;
            let unit = LoadedUnit {
                manifest,
                binary,
                plugin_dir,
                instances,
            };

            let id = unit.manifest.id.clone();
            let path = unit.binary.path().to_path_buf();
            if let Some(previous) = next.insert(unit) {
                // Last write wins. The replaced unit's instances are not unloaded.
                warn!(
                    plugin_id = %id,
                    kept = %path.display(),
                    dropped = %previous.binary.path().display(),
                    dropped_instances = previous.instances.len(),
                    "duplicate plugin id, replacing earlier binary"
                );
                report.replaced += 1;
            }
        }

        report.plugins = next.units.len();
        report.instances = next.instances().count();
        self.state.store(Arc::new(next));

        info!(
            plugins = report.plugins,
            instances = report.instances,
            "plugin registry initialized"
        );
        report
    }

    /// Filesystem scanning is blocking; keep it off the async workers.
    async fn scan(&self) -> (Vec<DiscoveredPlugin>, DiscoveryStats) {
        let discoverer = self.discoverer.clone();
        let root = self.options.root.clone();
        match tokio::task::spawn_blocking(move || discoverer.discover_with_stats(&root)).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "plugin discovery task failed");
                (Vec::new(), DiscoveryStats::default())
            }
        }
    }

    /// Manifests of every loaded unit, in discovery order.
    pub fn all_manifests(&self) -> Vec<Manifest> {
        self.state
            .load()
            .units
            .iter()
            .map(|u| u.manifest.clone())
            .collect()
    }

    /// Handles of every loaded binary, in discovery order.
    ///
    /// Hosts use these to extend their own tables (routes, commands) from
    /// what the binaries export.
    pub fn loaded_binaries(&self) -> Vec<BinaryHandle> {
        self.state
            .load()
            .units
            .iter()
            .map(|u| Arc::clone(&u.binary))
            .collect()
    }

    /// Look up a unit by plugin id.
    pub fn get_plugin(&self, id: &str) -> Option<Arc<LoadedUnit>> {
        let snapshot = self.state.load();
        snapshot
            .index
            .get(id)
            .map(|&slot| Arc::clone(&snapshot.units[slot]))
    }

    /// Every live instance across every unit.
    pub fn instances(&self) -> Vec<Arc<PluginInstance>> {
        self.state.load().instances().cloned().collect()
    }

    /// Every live instance whose concrete type is `T`.
    pub fn instances_of<T: Plugin>(&self) -> Vec<Arc<T>> {
        self.state
            .load()
            .instances()
            .filter_map(|i| Arc::clone(i.plugin()).into_any_arc().downcast::<T>().ok())
            .collect()
    }

    /// Every live instance that provides the capability interface `C`,
    /// returned as that interface.
    ///
    /// `C` is a trait object type shared between host and plugin, such as
    /// `dyn Greeting`; the host never names the concrete plugin types.
    pub fn instances_implementing<C: ?Sized + 'static>(&self) -> Vec<Arc<C>> {
        self.state
            .load()
            .instances()
            .filter_map(|i| i.capability::<C>())
            .collect()
    }

    /// Number of loaded units.
    pub fn len(&self) -> usize {
        self.state.load().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.load().units.is_empty()
    }

    /// Run every instance's unload hook, then clear the registry.
    pub async fn unload(&self) -> UnloadReport {
        self.unload_with(&CancellationToken::new()).await
    }

    /// Like [`PluginRegistry::unload`], abandoning pending hooks when `cancel`
    /// fires. The registry is cleared regardless of hook outcomes.
    pub async fn unload_with(&self, cancel: &CancellationToken) -> UnloadReport {
        let _guard = self.lifecycle.lock().await;
        let snapshot = self.state.load_full();
        let mut report = UnloadReport::default();

        for unit in &snapshot.units {
            for instance in &unit.instances {
                match instance.unload(self.options.unload_timeout, cancel).await {
                    Ok(true) => report.unloaded += 1,
                    Ok(false) => {}
                    Err(e) => {
                        error!(
                            plugin_id = %unit.manifest.id,
                            type_name = instance.type_name(),
                            error = %e,
                            "error unloading plugin"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        self.state.store(Arc::new(Snapshot::default()));
        info!(
            unloaded = report.unloaded,
            failed = report.failed,
            "plugin registry unloaded"
        );
        report
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("options", &self.options)
            .field("plugins", &self.len())
            .finish()
    }
}
