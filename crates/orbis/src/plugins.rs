// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `orbis plugins` command implementation.

use orbis_config::OrbisConfig;
use orbis_plugin::{Manifest, PluginRegistry, RegistryOptions};
use serde::Serialize;

/// One row of the listing.
#[derive(Debug, Serialize)]
pub struct PluginSummary {
    #[serde(flatten)]
    pub manifest: Manifest,
    /// Names of the initialized instances.
    pub instances: Vec<String>,
}

/// Load every plugin, print what was found, then unload again.
pub async fn run_plugins(config: OrbisConfig, json: bool) -> Result<(), serde_json::Error> {
    let registry = PluginRegistry::new(RegistryOptions::from(&config.plugins));
    registry.initialize().await;

    let summaries: Vec<PluginSummary> = registry
        .all_manifests()
        .into_iter()
        .map(|manifest| {
            let instances = registry
                .get_plugin(&manifest.id)
                .map(|u| u.instances.iter().map(|i| i.name().to_string()).collect())
                .unwrap_or_default();
            PluginSummary {
                manifest,
                instances,
            }
        })
        .collect();

    registry.unload().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print!("{}", render_table(&summaries));
    }
    Ok(())
}

/// Fixed-width text table, one plugin per line.
pub fn render_table(summaries: &[PluginSummary]) -> String {
    if summaries.is_empty() {
        return "no plugins found\n".to_string();
    }

    let id_width = summaries
        .iter()
        .map(|s| s.manifest.id.len())
        .max()
        .unwrap_or(0)
        .max("ID".len());
    let name_width = summaries
        .iter()
        .map(|s| s.manifest.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!(
        "{:<id_width$}  {:<name_width$}  {:<10}  {:<20}  INSTANCES\n",
        "ID", "NAME", "VERSION", "AUTHOR"
    );
    for s in summaries {
        out.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {:<10}  {:<20}  {}\n",
            s.manifest.id,
            s.manifest.name,
            s.manifest.version,
            s.manifest.author,
            if s.instances.is_empty() {
                "-".to_string()
            } else {
                s.instances.join(", ")
            }
        ));
    }
    out
}
