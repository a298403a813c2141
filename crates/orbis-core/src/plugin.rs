// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability contract every loadable plugin type implements.

use std::any::{Any, TypeId};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::OrbisError;

/// Type-erasure helper used by the registry to filter instances by concrete type.
///
/// Blanket-implemented for every `Send + Sync + 'static` type; plugin authors
/// never implement this by hand.
pub trait AsAny: Any + Send + Sync {
    /// Convert a shared handle into an `Arc<dyn Any>` for downcasting.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// The base trait for all Orbis plugins.
///
/// Identity accessors are self-reported and independent of the binary's
/// embedded manifest. Both lifecycle hooks may suspend; the host imposes no
/// timeout unless one is configured.
#[async_trait]
pub trait Plugin: AsAny {
    /// Returns the human-readable name of this plugin.
    fn name(&self) -> &str;

    /// Returns the version string of this plugin.
    fn version(&self) -> &str;

    /// Returns the author of this plugin.
    fn author(&self) -> &str;

    /// Hand out this instance as the capability interface identified by
    /// `requested`, the `TypeId` of a trait object such as `dyn Greeting`.
    ///
    /// Implementations answer through [`provide`], once per interface they
    /// support. The default supports none beyond `Plugin` itself.
    fn capability(self: Arc<Self>, requested: TypeId) -> Option<CapabilityHandle> {
        let _ = requested;
        None
    }

    /// Called once after construction, before the instance becomes visible.
    async fn on_initialize(&self) -> Result<(), OrbisError>;

    /// Called once when the registry is unloaded.
    async fn on_unload(&self) -> Result<(), OrbisError>;
}

/// Type-erased `Arc<C>` returned by [`Plugin::capability`].
pub type CapabilityHandle = Box<dyn Any + Send + Sync>;

/// Answer a [`Plugin::capability`] request with `handle` when `requested`
/// names the interface `C`.
///
/// ```ignore
/// fn capability(self: Arc<Self>, requested: TypeId) -> Option<CapabilityHandle> {
///     provide::<dyn Greeting>(requested, self.clone())
///         .or_else(|| provide::<dyn Status>(requested, self))
/// }
/// ```
pub fn provide<C>(requested: TypeId, handle: Arc<C>) -> Option<CapabilityHandle>
where
    C: ?Sized + Send + Sync + 'static,
{
    (requested == TypeId::of::<C>()).then(|| Box::new(handle) as CapabilityHandle)
}

/// Lifecycle state of a plugin instance.
///
/// Transitions only move forward: `Constructed -> Initialized -> Unloaded`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Constructed,
    Initialized,
    Unloaded,
}

impl InstanceState {
    /// Compact representation for atomic storage.
    pub fn as_u8(self) -> u8 {
        match self {
            InstanceState::Constructed => 0,
            InstanceState::Initialized => 1,
            InstanceState::Unloaded => 2,
        }
    }

    /// Inverse of [`InstanceState::as_u8`]; unknown values read as `Unloaded`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => InstanceState::Constructed,
            1 => InstanceState::Initialized,
            _ => InstanceState::Unloaded,
        }
    }
}
