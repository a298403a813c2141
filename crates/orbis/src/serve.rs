// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `orbis serve` command implementation.
//!
//! Loads every plugin under the configured root, keeps them running until
//! SIGINT or SIGTERM, then runs their unload hooks.

use orbis_config::OrbisConfig;
use orbis_plugin::{PluginRegistry, RegistryOptions};
use tracing::{info, warn};

use crate::shutdown;

pub async fn run_serve(config: OrbisConfig) {
    let shutdown = shutdown::install_signal_handler();
    let registry = PluginRegistry::new(RegistryOptions::from(&config.plugins));

    info!(root = %config.plugins.directory.display(), "starting orbis host");

    // A signal during startup abandons pending initialization hooks.
    let report = registry.initialize_with(&shutdown).await;
    if report.discovery.failed > 0 {
        warn!(failed = report.discovery.failed, "some plugin binaries failed to load");
    }

    for manifest in registry.all_manifests() {
        let instances = registry
            .get_plugin(&manifest.id)
            .map(|u| u.instances.len())
            .unwrap_or_default();
        info!(
            plugin_id = %manifest.id,
            name = %manifest.name,
            version = %manifest.version,
            instances,
            "plugin active"
        );
    }

    shutdown.cancelled().await;

    info!("unloading plugins");
    let unloaded = registry.unload().await;
    if unloaded.failed > 0 {
        warn!(failed = unloaded.failed, "some plugins failed to unload cleanly");
    }
    info!("orbis host stopped");
}
