// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instantiation and initialization of a binary's capability types.
//!
//! Construction and initialization are separate fault boundaries: a type
//! that fails either step is logged and skipped, and never affects the other
//! types in the same binary or any other binary.

use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures::FutureExt;
use orbis_core::{InstanceState, OrbisError, Plugin, PluginFactory};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::binary::LoadedBinary;
use crate::panic_message;

/// A live plugin instance together with its lifecycle state.
pub struct PluginInstance {
    plugin: Arc<dyn Plugin>,
    type_name: String,
    state: AtomicU8,
}

impl PluginInstance {
    fn constructed(plugin: Box<dyn Plugin>, type_name: &str) -> Self {
        Self {
            plugin: Arc::from(plugin),
            type_name: type_name.to_string(),
            state: AtomicU8::new(InstanceState::Constructed.as_u8()),
        }
    }

    /// The plugin object.
    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    /// Factory name of the concrete type this instance was built from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn version(&self) -> &str {
        self.plugin.version()
    }

    pub fn author(&self) -> &str {
        self.plugin.author()
    }

    pub fn state(&self) -> InstanceState {
        InstanceState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// This instance viewed as the capability interface `C` (for example
    /// `dyn Greeting`), if its type provides it.
    pub fn capability<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        Arc::clone(&self.plugin)
            .capability(TypeId::of::<C>())
            .and_then(|handle| handle.downcast::<Arc<C>>().ok())
            .map(|handle| *handle)
    }

    fn advance(&self, from: InstanceState, to: InstanceState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Run the unload hook, at most once per instance.
    ///
    /// The instance is `Unloaded` afterwards whether or not the hook succeeds.
    /// Instances that were never initialized, or were already unloaded, are
    /// skipped.
    pub(crate) async fn unload(
        &self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<bool, OrbisError> {
        if !self.advance(InstanceState::Initialized, InstanceState::Unloaded) {
            return Ok(false);
        }
        run_hook(self.plugin.on_unload(), timeout, cancel)
            .await
            .map_err(|message| OrbisError::Unload {
                plugin: self.plugin.name().to_string(),
                message,
            })?;
        Ok(true)
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("type_name", &self.type_name)
            .field("name", &self.plugin.name())
            .field("version", &self.plugin.version())
            .field("state", &self.state())
            .finish()
    }
}

/// Knobs for [`Loader`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Upper bound on each `on_initialize` call. `None` waits indefinitely.
    pub init_timeout: Option<Duration>,
}

/// Instantiates and initializes the capability types of one binary.
///
/// Holds no mutable state; concurrent calls are independent.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Load every capability type of `binary`, in declaration order.
    pub async fn load(&self, binary: &dyn LoadedBinary) -> Vec<Arc<PluginInstance>> {
        self.load_with(binary, &CancellationToken::new()).await
    }

    /// Like [`Loader::load`], abandoning pending initialization when `cancel` fires.
    ///
    /// A cancelled initialization is treated as a failed one.
    pub async fn load_with(
        &self,
        binary: &dyn LoadedBinary,
        cancel: &CancellationToken,
    ) -> Vec<Arc<PluginInstance>> {
        let factories = binary.factories();
        if factories.is_empty() {
            debug!(path = %binary.path().display(), "binary declares no capability types");
        }

        let mut instances = Vec::with_capacity(factories.len());
        for factory in factories {
            let instance = match construct(&factory) {
                Ok(instance) => instance,
                Err(e) => {
                    warn!(
                        type_name = factory.type_name,
                        path = %binary.path().display(),
                        error = %e,
                        "failed to instantiate plugin type"
                    );
                    continue;
                }
            };

            match self.initialize(&instance, cancel).await {
                Ok(()) => {
                    info!(
                        name = %instance.name(),
                        version = %instance.version(),
                        type_name = factory.type_name,
                        "loaded plugin"
                    );
                    instances.push(Arc::new(instance));
                }
                Err(e) => {
                    warn!(
                        type_name = factory.type_name,
                        path = %binary.path().display(),
                        error = %e,
                        "plugin failed to initialize, discarding instance"
                    );
                }
            }
        }

        instances
    }

    async fn initialize(
        &self,
        instance: &PluginInstance,
        cancel: &CancellationToken,
    ) -> Result<(), OrbisError> {
        run_hook(
            instance.plugin.on_initialize(),
            self.options.init_timeout,
            cancel,
        )
        .await
        .map_err(|message| OrbisError::Initialization {
            plugin: instance.type_name.clone(),
            message,
        })?;
        instance.advance(InstanceState::Constructed, InstanceState::Initialized);
        Ok(())
    }
}

/// Construction boundary: errors and panics both mean "skip this type".
fn construct(factory: &PluginFactory) -> Result<PluginInstance, OrbisError> {
    let plugin = catch_unwind(factory.construct).unwrap_or_else(|payload| {
        Err(OrbisError::Instantiation {
            type_name: factory.type_name.to_string(),
            message: format!("constructor panicked: {}", panic_message(payload.as_ref())),
        })
    })?;
    Ok(PluginInstance::constructed(plugin, factory.type_name))
}

/// Await a lifecycle hook under an optional timeout and a cancellation token.
///
/// Failures of every kind (error, panic, timeout, cancellation) are flattened
/// into a message for the caller's error variant.
async fn run_hook<F>(
    hook: F,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<(), String>
where
    F: Future<Output = Result<(), OrbisError>>,
{
    let guarded = async {
        match AssertUnwindSafe(hook).catch_unwind().await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
        }
    };
    let bounded = async {
        match timeout {
            Some(duration) => tokio::time::timeout(duration, guarded)
                .await
                .unwrap_or_else(|_| Err(OrbisError::Timeout { duration }.to_string())),
            None => guarded.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OrbisError::Cancelled.to_string()),
        result = bounded => result,
    }
}
