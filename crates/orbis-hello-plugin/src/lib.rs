// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample Orbis plugin.
//!
//! Built as a `cdylib`, this crate drops into a plugin root as
//! `<root>/hello/liborbis_hello_plugin.so` and exports two capability types.
//! It also serves as the reference for how a plugin crate declares itself.
//!
//! Hosts depend on this crate only for the [`Greeting`] and [`Status`]
//! interfaces and query them with
//! `registry.instances_implementing::<dyn Greeting>()`.

use std::any::TypeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use orbis_core::{CapabilityHandle, OrbisError, Plugin, provide};
use tracing::info;

/// Something that can greet.
pub trait Greeting: Send + Sync {
    fn greet(&self, who: &str) -> Result<String, OrbisError>;
}

/// Something that reports its own health.
pub trait Status: Send + Sync {
    /// Seconds since initialization, or `None` when not running.
    fn uptime_secs(&self) -> Option<u64>;
}

/// Says hello. Refuses to greet before initialization.
#[derive(Debug, Default)]
pub struct Greeter {
    ready: AtomicBool,
}

impl Greeting for Greeter {
    fn greet(&self, who: &str) -> Result<String, OrbisError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(OrbisError::Internal("greeter is not initialized".into()));
        }
        Ok(format!("Hello, {who}!"))
    }
}

#[async_trait]
impl Plugin for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn author(&self) -> &str {
        "Orbis Contributors"
    }

    fn capability(self: Arc<Self>, requested: TypeId) -> Option<CapabilityHandle> {
        provide::<dyn Greeting>(requested, self)
    }

    async fn on_initialize(&self) -> Result<(), OrbisError> {
        self.ready.store(true, Ordering::Release);
        info!("greeter ready");
        Ok(())
    }

    async fn on_unload(&self) -> Result<(), OrbisError> {
        self.ready.store(false, Ordering::Release);
        Ok(())
    }
}

/// Reports how long it has been initialized.
#[derive(Debug, Default)]
pub struct Uptime {
    started: Mutex<Option<Instant>>,
}

impl Status for Uptime {
    fn uptime_secs(&self) -> Option<u64> {
        self.started
            .lock()
            .ok()
            .and_then(|started| started.as_ref().map(|t| t.elapsed().as_secs()))
    }
}

#[async_trait]
impl Plugin for Uptime {
    fn name(&self) -> &str {
        "uptime"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn author(&self) -> &str {
        "Orbis Contributors"
    }

    fn capability(self: Arc<Self>, requested: TypeId) -> Option<CapabilityHandle> {
        provide::<dyn Status>(requested, self)
    }

    async fn on_initialize(&self) -> Result<(), OrbisError> {
        let mut started = self
            .started
            .lock()
            .map_err(|e| OrbisError::Internal(e.to_string()))?;
        *started = Some(Instant::now());
        Ok(())
    }

    async fn on_unload(&self) -> Result<(), OrbisError> {
        let mut started = self
            .started
            .lock()
            .map_err(|e| OrbisError::Internal(e.to_string()))?;
        if let Some(at) = started.take() {
            info!(uptime_secs = at.elapsed().as_secs(), "uptime tracker stopped");
        }
        Ok(())
    }
}

orbis_core::export_plugin! {
    metadata: {
        "Plugin.Id" => "hello",
        "Plugin.Name" => "Hello",
        "Plugin.Author" => "Orbis Contributors",
        "Plugin.Version" => env!("CARGO_PKG_VERSION"),
        "Plugin.Description" => "Greets people and reports its own uptime",
        "Plugin.BasePath" => "/hello",
    },
    types: [Greeter, Uptime],
}
