// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest extraction from a binary's embedded key/value metadata.
//!
//! Only keys under the `Plugin.` namespace are considered. A binary is a
//! plugin if and only if it declares non-empty `Plugin.Id` and `Plugin.Name`
//! values; anything else is silently "not a plugin".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::binary::LoadedBinary;

/// Namespace prefix for recognized metadata keys.
pub const KEY_PREFIX: &str = "Plugin.";

/// Recognized metadata keys.
pub mod keys {
    pub const ID: &str = "Plugin.Id";
    pub const NAME: &str = "Plugin.Name";
    pub const AUTHOR: &str = "Plugin.Author";
    pub const VERSION: &str = "Plugin.Version";
    pub const DESCRIPTION: &str = "Plugin.Description";
    pub const ICON: &str = "Plugin.Icon";
    pub const BASE_PATH: &str = "Plugin.BasePath";
}

/// Author reported when a binary does not declare one.
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Version reported when a binary does not declare one.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Immutable description of one plugin binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Unique registry key.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub base_path: Option<String>,
}

impl Manifest {
    /// Reads the manifest embedded in a loaded binary.
    ///
    /// Returns `None` when the binary is not a plugin.
    pub fn try_read(binary: &dyn LoadedBinary) -> Option<Self> {
        Self::from_metadata(binary.metadata())
    }

    /// Builds a manifest from raw metadata entries.
    ///
    /// Entries outside the `Plugin.` namespace are ignored. A recognized key
    /// declared twice is treated as malformed metadata and yields `None`.
    /// Empty or whitespace-only optional values fall back to their defaults.
    pub fn from_metadata<I, K, V>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut metadata: HashMap<String, String> = HashMap::new();
        for (key, value) in entries {
            let key = key.as_ref();
            if !key.starts_with(KEY_PREFIX) {
                continue;
            }
            if metadata
                .insert(key.to_string(), value.as_ref().to_string())
                .is_some()
            {
                return None;
            }
        }

        let lookup = |key: &str| {
            metadata
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };

        Some(Manifest {
            id: lookup(keys::ID)?,
            name: lookup(keys::NAME)?,
            author: lookup(keys::AUTHOR).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            version: lookup(keys::VERSION).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            description: lookup(keys::DESCRIPTION),
            icon: lookup(keys::ICON),
            base_path: lookup(keys::BASE_PATH),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_full_manifest() {
        let manifest = Manifest::from_metadata([
            ("Plugin.Id", "weather"),
            ("Plugin.Name", "Weather"),
            ("Plugin.Author", "Orbis Contributors"),
            ("Plugin.Version", "1.4.0"),
            ("Plugin.Description", "Forecasts"),
            ("Plugin.Icon", "cloud"),
            ("Plugin.BasePath", "/weather"),
        ])
        .unwrap();

        assert_eq!(manifest.id, "weather");
        assert_eq!(manifest.name, "Weather");
        assert_eq!(manifest.author, "Orbis Contributors");
        assert_eq!(manifest.version, "1.4.0");
        assert_eq!(manifest.description.as_deref(), Some("Forecasts"));
        assert_eq!(manifest.icon.as_deref(), Some("cloud"));
        assert_eq!(manifest.base_path.as_deref(), Some("/weather"));
    }

    #[test]
    fn optional_keys_take_defaults() {
        let manifest =
            Manifest::from_metadata([("Plugin.Id", "p1"), ("Plugin.Name", "Alpha")]).unwrap();
        assert_eq!(manifest.author, DEFAULT_AUTHOR);
        assert_eq!(manifest.version, DEFAULT_VERSION);
        assert!(manifest.description.is_none());
        assert!(manifest.icon.is_none());
        assert!(manifest.base_path.is_none());
    }

    #[test]
    fn empty_optional_value_takes_default() {
        let manifest = Manifest::from_metadata([
            ("Plugin.Id", "p1"),
            ("Plugin.Name", "Alpha"),
            ("Plugin.Author", ""),
            ("Plugin.Description", "  "),
        ])
        .unwrap();
        assert_eq!(manifest.author, DEFAULT_AUTHOR);
        assert!(manifest.description.is_none());
    }

    #[test]
    fn missing_id_is_not_a_plugin() {
        assert!(Manifest::from_metadata([("Plugin.Name", "Alpha")]).is_none());
    }

    #[test]
    fn missing_name_is_not_a_plugin() {
        assert!(Manifest::from_metadata([("Plugin.Id", "p1")]).is_none());
    }

    #[test]
    fn empty_required_value_is_not_a_plugin() {
        assert!(Manifest::from_metadata([("Plugin.Id", ""), ("Plugin.Name", "Alpha")]).is_none());
        assert!(Manifest::from_metadata([("Plugin.Id", "p1"), ("Plugin.Name", " ")]).is_none());
    }

    #[test]
    fn keys_outside_namespace_are_ignored() {
        let manifest = Manifest::from_metadata([
            ("Id", "wrong"),
            ("plugin.Id", "also-wrong"),
            ("Plugin.Id", "p1"),
            ("Plugin.Name", "Alpha"),
            ("RepositoryUrl", "https://example.invalid"),
        ])
        .unwrap();
        assert_eq!(manifest.id, "p1");

        assert!(Manifest::from_metadata([("Id", "p1"), ("Name", "Alpha")]).is_none());
    }

    #[test]
    fn duplicate_recognized_key_is_not_a_plugin() {
        let result = Manifest::from_metadata([
            ("Plugin.Id", "p1"),
            ("Plugin.Name", "Alpha"),
            ("Plugin.Id", "p2"),
        ]);
        assert!(result.is_none());
    }

    #[test]
    fn no_metadata_is_not_a_plugin() {
        let empty: [(&str, &str); 0] = [];
        assert!(Manifest::from_metadata(empty).is_none());
    }

    #[test]
    fn manifest_serializes_for_host_tooling() {
        let manifest =
            Manifest::from_metadata([("Plugin.Id", "p1"), ("Plugin.Name", "Alpha")]).unwrap();
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["author"], "Unknown");
        assert!(json["icon"].is_null());
    }
}
