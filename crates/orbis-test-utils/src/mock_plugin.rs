// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock plugin types with scripted lifecycle behavior.
//!
//! Factories are plain function pointers, so each behavior gets its own
//! constructor function. Every hook invocation is appended to a process-wide
//! journal; tests that assert on it should run serially.

use std::any::TypeId;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use orbis_core::{CapabilityHandle, OrbisError, Plugin, provide};

/// Capability interface provided by both [`MockPlugin`] and [`AuditPlugin`].
pub trait Labelled: Send + Sync {
    fn label(&self) -> String;
}

/// Capability interface provided only by [`AuditPlugin`].
pub trait Auditor: Send + Sync {
    /// Hook calls recorded so far for `plugin`.
    fn calls_for(&self, plugin: &str) -> Vec<HookCall>;
}

/// Which lifecycle hook ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Initialize,
    Unload,
}

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    pub plugin: &'static str,
    pub hook: Hook,
}

static JOURNAL: Mutex<Vec<HookCall>> = Mutex::new(Vec::new());

fn record(plugin: &'static str, hook: Hook) {
    JOURNAL
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(HookCall { plugin, hook });
}

/// Snapshot of every hook invocation since the last [`reset_journal`].
pub fn journal() -> Vec<HookCall> {
    JOURNAL.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Number of times `hook` ran for the named plugin.
pub fn hook_count(plugin: &str, hook: Hook) -> usize {
    journal()
        .iter()
        .filter(|c| c.plugin == plugin && c.hook == hook)
        .count()
}

pub fn reset_journal() {
    JOURNAL.lock().unwrap_or_else(|e| e.into_inner()).clear();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Ok,
    FailInit,
    PanicInit,
    HangInit,
    FailUnload,
    PanicUnload,
}

/// A plugin whose hooks follow a fixed script.
#[derive(Debug)]
pub struct MockPlugin {
    name: &'static str,
    script: Script,
}

impl MockPlugin {
    fn boxed(name: &'static str, script: Script) -> Result<Box<dyn Plugin>, OrbisError> {
        Ok(Box::new(Self { name, script }))
    }

    /// Initializes and unloads cleanly.
    pub fn healthy() -> Result<Box<dyn Plugin>, OrbisError> {
        Self::boxed("healthy", Script::Ok)
    }

    /// A second well-behaved mock, for binaries exporting several types.
    pub fn companion() -> Result<Box<dyn Plugin>, OrbisError> {
        Self::boxed("companion", Script::Ok)
    }

    /// `on_initialize` returns an error.
    pub fn failing_init() -> Result<Box<dyn Plugin>, OrbisError> {
        Self::boxed("failing-init", Script::FailInit)
    }

    /// `on_initialize` panics.
    pub fn panicking_init() -> Result<Box<dyn Plugin>, OrbisError> {
        Self::boxed("panicking-init", Script::PanicInit)
    }

    /// `on_initialize` never completes.
    pub fn hanging_init() -> Result<Box<dyn Plugin>, OrbisError> {
        Self::boxed("hanging-init", Script::HangInit)
    }

    /// `on_unload` returns an error.
    pub fn failing_unload() -> Result<Box<dyn Plugin>, OrbisError> {
        Self::boxed("failing-unload", Script::FailUnload)
    }

    /// `on_unload` panics.
    pub fn panicking_unload() -> Result<Box<dyn Plugin>, OrbisError> {
        Self::boxed("panicking-unload", Script::PanicUnload)
    }

    /// Construction fails with an error.
    pub fn failing_construct() -> Result<Box<dyn Plugin>, OrbisError> {
        Err(OrbisError::Internal("mock constructor refused".into()))
    }

    /// Construction panics.
    pub fn panicking_construct() -> Result<Box<dyn Plugin>, OrbisError> {
        panic!("mock constructor panicked")
    }
}

#[async_trait]
impl Plugin for MockPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn author(&self) -> &str {
        "Orbis Tests"
    }

    fn capability(self: Arc<Self>, requested: TypeId) -> Option<CapabilityHandle> {
        provide::<dyn Labelled>(requested, self)
    }

    async fn on_initialize(&self) -> Result<(), OrbisError> {
        record(self.name, Hook::Initialize);
        match self.script {
            Script::FailInit => Err(OrbisError::Internal("mock init failure".into())),
            Script::PanicInit => panic!("mock init panicked"),
            Script::HangInit => loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            },
            _ => Ok(()),
        }
    }

    async fn on_unload(&self) -> Result<(), OrbisError> {
        record(self.name, Hook::Unload);
        match self.script {
            Script::FailUnload => Err(OrbisError::Internal("mock unload failure".into())),
            Script::PanicUnload => panic!("mock unload panicked"),
            _ => Ok(()),
        }
    }
}

impl Labelled for MockPlugin {
    fn label(&self) -> String {
        format!("mock:{}", self.name)
    }
}

/// A distinct concrete type that also audits the hook journal.
#[derive(Debug, Default)]
pub struct AuditPlugin;

impl AuditPlugin {
    pub fn construct() -> Result<Box<dyn Plugin>, OrbisError> {
        Ok(Box::new(Self))
    }
}

#[async_trait]
impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    fn version(&self) -> &str {
        "2.0.0"
    }

    fn author(&self) -> &str {
        "Orbis Tests"
    }

    fn capability(self: Arc<Self>, requested: TypeId) -> Option<CapabilityHandle> {
        provide::<dyn Labelled>(requested, self.clone())
            .or_else(|| provide::<dyn Auditor>(requested, self))
    }

    async fn on_initialize(&self) -> Result<(), OrbisError> {
        record("audit", Hook::Initialize);
        Ok(())
    }

    async fn on_unload(&self) -> Result<(), OrbisError> {
        record("audit", Hook::Unload);
        Ok(())
    }
}

impl Labelled for AuditPlugin {
    fn label(&self) -> String {
        "audit".to_string()
    }
}

impl Auditor for AuditPlugin {
    fn calls_for(&self, plugin: &str) -> Vec<HookCall> {
        journal().into_iter().filter(|c| c.plugin == plugin).collect()
    }
}
