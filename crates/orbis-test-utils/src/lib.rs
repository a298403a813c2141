// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Orbis integration tests.
//!
//! Provides in-memory plugin binaries and mock plugin types so registry
//! behavior can be exercised without compiling shared libraries.
//!
//! # Components
//!
//! - [`StaticBinary`] - In-memory binary with metadata and factories
//! - [`FixtureLoader`] - Binary loader that maps file names to fixtures
//! - [`PluginTree`] - Temporary plugin root directory
//! - [`MockPlugin`] - Plugin with scripted lifecycle behavior
//! - [`Labelled`], [`Auditor`] - Capability interfaces the mocks provide

pub mod fixture;
pub mod mock_plugin;

pub use fixture::{FixtureLoader, PluginTree, StaticBinary};
pub use mock_plugin::{
    AuditPlugin, Auditor, Hook, HookCall, Labelled, MockPlugin, hook_count, journal, reset_journal,
};
