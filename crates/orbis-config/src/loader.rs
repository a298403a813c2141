// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./orbis.toml` > `~/.config/orbis/orbis.toml` > `/etc/orbis/orbis.toml`
//! with environment variable overrides via `ORBIS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OrbisConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/orbis/orbis.toml` (system-wide)
/// 3. `~/.config/orbis/orbis.toml` (user XDG config)
/// 4. `./orbis.toml` (local directory)
/// 5. `ORBIS_*` environment variables
pub fn load_config() -> Result<OrbisConfig, figment::Error> {
    let user = dirs::config_dir()
        .map(|d| d.join("orbis/orbis.toml"))
        .unwrap_or_default();
    let files = [
        Path::new("/etc/orbis/orbis.toml"),
        user.as_path(),
        Path::new("orbis.toml"),
    ];
    layered(files).merge(env_provider()).extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OrbisConfig, figment::Error> {
    layered([path]).merge(env_provider()).extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<OrbisConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(OrbisConfig::default()))
}

/// Defaults overlaid with each TOML file in turn. Missing files are skipped.
fn layered<'a>(files: impl IntoIterator<Item = &'a Path>) -> Figment {
    files
        .into_iter()
        .fold(defaults(), |figment, file| figment.merge(Toml::file(file)))
}

/// Environment provider mapping `ORBIS_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing keys survive:
/// `ORBIS_PLUGINS_INIT_TIMEOUT_SECS` maps to `plugins.init_timeout_secs`.
fn env_provider() -> Env {
    Env::prefixed("ORBIS_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("plugins_", "plugins.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
