// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Orbis host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Orbis configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrbisConfig {
    /// Plugin discovery and lifecycle settings.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OrbisConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Plugin discovery and lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Root directory scanned for plugin subdirectories.
    /// A missing directory means zero plugins.
    #[serde(default = "default_plugins_directory")]
    pub directory: PathBuf,

    /// Upper bound on each plugin's initialize hook. `None` waits indefinitely.
    #[serde(default)]
    pub init_timeout_secs: Option<u64>,

    /// Upper bound on each plugin's unload hook. `None` waits indefinitely.
    #[serde(default)]
    pub unload_timeout_secs: Option<u64>,
}

impl PluginsConfig {
    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_secs.map(Duration::from_secs)
    }

    pub fn unload_timeout(&self) -> Option<Duration> {
        self.unload_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            directory: default_plugins_directory(),
            init_timeout_secs: None,
            unload_timeout_secs: None,
        }
    }
}

fn default_plugins_directory() -> PathBuf {
    PathBuf::from("plugins")
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
