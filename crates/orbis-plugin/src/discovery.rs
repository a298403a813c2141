// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin directory discovery.
//!
//! The root directory holds one subdirectory per plugin; each subdirectory
//! may hold any number of candidate binaries. Only one level is scanned.
//! A missing root means zero plugins, and a binary that fails to load is
//! logged and skipped without aborting the scan.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orbis_core::OrbisError;
use tracing::{debug, info, warn};

use crate::binary::{BinaryHandle, BinaryLoader};
use crate::manifest::Manifest;
use crate::panic_message;

/// A binary that loaded and declared a valid manifest.
#[derive(Debug, Clone)]
pub struct DiscoveredPlugin {
    pub manifest: Manifest,
    pub binary: BinaryHandle,
    /// The subdirectory of the root the binary was found in.
    pub plugin_dir: PathBuf,
}

/// Counters from one discovery scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Candidate binaries offered to the loader.
    pub candidates: usize,
    /// Candidates that loaded and declared a manifest.
    pub plugins: usize,
    /// Candidates that loaded but are not plugins.
    pub not_plugins: usize,
    /// Candidates that failed to load.
    pub failed: usize,
}

/// Walks a plugin root and opens every candidate binary.
#[derive(Clone)]
pub struct Discoverer {
    loader: Arc<dyn BinaryLoader>,
}

impl Discoverer {
    pub fn new(loader: Arc<dyn BinaryLoader>) -> Self {
        Self { loader }
    }

    /// Discover plugins under `root`.
    ///
    /// Subdirectories and files are visited in sorted path order. Duplicate
    /// manifest ids are passed through untouched.
    pub fn discover(&self, root: &Path) -> Vec<DiscoveredPlugin> {
        self.discover_with_stats(root).0
    }

    /// Like [`Discoverer::discover`], also returning scan counters.
    pub fn discover_with_stats(&self, root: &Path) -> (Vec<DiscoveredPlugin>, DiscoveryStats) {
        let mut stats = DiscoveryStats::default();
        let mut plugins = Vec::new();

        if !root.exists() {
            debug!(path = %root.display(), "plugin directory does not exist");
            return (plugins, stats);
        }

        let plugin_dirs = match sorted_entries(root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %root.display(), error = %e, "failed to read plugin directory");
                return (plugins, stats);
            }
        };

        for plugin_dir in plugin_dirs.into_iter().filter(|p| p.is_dir()) {
            let files = match sorted_entries(&plugin_dir) {
                Ok(files) => files,
                Err(e) => {
                    warn!(path = %plugin_dir.display(), error = %e, "failed to read plugin subdirectory");
                    continue;
                }
            };

            for path in files {
                if !self.loader.is_candidate(&path) {
                    continue;
                }
                stats.candidates += 1;

                match self.open(&path) {
                    Ok(binary) => match Manifest::try_read(binary.as_ref()) {
                        Some(manifest) => {
                            info!(
                                plugin_id = %manifest.id,
                                name = %manifest.name,
                                version = %manifest.version,
                                path = %path.display(),
                                "discovered plugin"
                            );
                            stats.plugins += 1;
                            plugins.push(DiscoveredPlugin {
                                manifest,
                                binary,
                                plugin_dir: plugin_dir.clone(),
                            });
                        }
                        None => {
                            debug!(path = %path.display(), "binary declares no plugin manifest, skipping");
                            stats.not_plugins += 1;
                        }
                    },
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping binary that failed to load");
                        stats.failed += 1;
                    }
                }
            }
        }

        info!(
            root = %root.display(),
            candidates = stats.candidates,
            plugins = stats.plugins,
            not_plugins = stats.not_plugins,
            failed = stats.failed,
            "plugin discovery complete"
        );

        (plugins, stats)
    }

    /// Load boundary: errors and panics from the loader both mean "skip this file".
    fn open(&self, path: &Path) -> Result<BinaryHandle, OrbisError> {
        catch_unwind(AssertUnwindSafe(|| self.loader.load(path))).unwrap_or_else(|payload| {
            Err(OrbisError::BinaryLoad {
                path: path.to_path_buf(),
                message: format!("loader panicked: {}", panic_message(payload.as_ref())),
            })
        })
    }
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .collect();
    entries.sort();
    Ok(entries)
}
