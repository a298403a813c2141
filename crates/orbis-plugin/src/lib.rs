// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin discovery, manifest reader, loader, and registry.
//!
//! The host points a [`PluginRegistry`] at a plugin root directory. On
//! `initialize` the registry discovers candidate binaries one level below the
//! root, reads each binary's embedded manifest, instantiates and initializes
//! every capability type the binary declares, and publishes the result as an
//! immutable snapshot that readers query without locking.

use std::any::Any;

pub mod binary;
pub mod discovery;
pub mod loader;
pub mod manifest;
pub mod registry;

pub use binary::{BinaryHandle, BinaryLoader, DeclaredBinary, LoadedBinary, NativeLoader};
pub use discovery::{DiscoveredPlugin, Discoverer, DiscoveryStats};
pub use loader::{LoadOptions, Loader, PluginInstance};
pub use manifest::Manifest;
pub use registry::{InitializeReport, LoadedUnit, PluginRegistry, RegistryOptions, UnloadReport};

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
