// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Orbis plugin host.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across the plugin pipeline and plugin lifecycle hooks.
///
/// None of these are fatal to the host: every variant describes why a single
/// binary, type, or instance is unavailable.
#[derive(Debug, Error)]
pub enum OrbisError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A candidate binary could not be opened (corrupt, unsupported format, missing dependency).
    #[error("failed to load binary {path}: {message}")]
    BinaryLoad { path: PathBuf, message: String },

    /// A binary opened but does not speak the host's plugin ABI.
    #[error("incompatible plugin binary {path}: {message}")]
    Abi { path: PathBuf, message: String },

    /// A capability type failed during construction.
    #[error("failed to construct {type_name}: {message}")]
    Instantiation { type_name: String, message: String },

    /// A plugin instance failed its initialize hook.
    #[error("plugin {plugin} failed to initialize: {message}")]
    Initialization { plugin: String, message: String },

    /// A plugin instance failed its unload hook.
    #[error("plugin {plugin} failed to unload: {message}")]
    Unload { plugin: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Filesystem errors while scanning the plugin root.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
