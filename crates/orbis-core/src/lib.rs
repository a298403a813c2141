// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Orbis plugin host.
//!
//! This crate is the only dependency a plugin binary needs. It provides the
//! [`Plugin`] capability trait, the shared [`OrbisError`] type, and the
//! binary ABI ([`abi`]) through which the host discovers a plugin's metadata
//! and capability types at runtime.

pub mod abi;
pub mod error;
pub mod plugin;

// Re-export key items at crate root for ergonomic imports.
pub use abi::{PluginDeclaration, PluginFactory};
pub use error::OrbisError;
pub use plugin::{AsAny, CapabilityHandle, InstanceState, Plugin, provide};
