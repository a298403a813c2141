// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary-level contract between the host and a plugin shared library.
//!
//! Each plugin binary exports one well-known symbol, [`ENTRY_SYMBOL`], that
//! returns a pointer to a static [`PluginDeclaration`]. The declaration carries
//! the embedded manifest metadata and one [`PluginFactory`] per capability type
//! in the binary, so the host can discover types without knowing them ahead of
//! time.
//!
//! Plugin crates should not write the declaration by hand; use
//! [`export_plugin!`](crate::export_plugin):
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct Greeter;
//!
//! orbis_core::export_plugin! {
//!     metadata: {
//!         "Plugin.Id" => "greeter",
//!         "Plugin.Name" => "Greeter",
//!     },
//!     types: [Greeter],
//! }
//! ```
//!
//! # Safety
//!
//! Rust types cross this boundary, so host and plugin must be built with the
//! same toolchain and the same `orbis-core` version. [`ABI_VERSION`] and
//! [`CORE_VERSION`] are checked before any factory is called.

use crate::error::OrbisError;
use crate::plugin::Plugin;

/// Bumped whenever [`PluginDeclaration`] or [`PluginFactory`] change layout.
pub const ABI_VERSION: u32 = 1;

/// Version of `orbis-core` the binary was compiled against.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the entry point every plugin binary exports (NUL-terminated).
pub const ENTRY_SYMBOL: &[u8] = b"orbis_plugin_declaration\0";

/// Signature of the exported entry point.
pub type EntryFn = unsafe extern "C" fn() -> *const PluginDeclaration;

/// Constructor for one capability type.
pub type ConstructFn = fn() -> Result<Box<dyn Plugin>, OrbisError>;

/// One concrete capability type exported by a binary.
#[derive(Clone, Copy)]
pub struct PluginFactory {
    /// Identity used in diagnostics when construction or initialization fails.
    pub type_name: &'static str,
    /// Builds a fresh instance.
    pub construct: ConstructFn,
}

impl std::fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFactory")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Everything a plugin binary declares about itself.
///
/// `repr(C)` pins `abi_version` and `core_version` to the front so the host can
/// check them before trusting the rest of the layout.
#[derive(Debug)]
#[repr(C)]
pub struct PluginDeclaration {
    pub abi_version: u32,
    pub core_version: &'static str,
    /// Embedded key/value metadata; the manifest reader only looks at `Plugin.*` keys.
    pub metadata: &'static [(&'static str, &'static str)],
    /// Capability types in declaration order.
    pub factories: &'static [PluginFactory],
}

/// Default-constructs `T`. Used by [`export_plugin!`](crate::export_plugin) for `types: [...]`.
pub fn construct_default<T: Plugin + Default>() -> Result<Box<dyn Plugin>, OrbisError> {
    Ok(Box::new(T::default()))
}

/// Declares the plugin binary's metadata and capability types and exports the
/// entry point the host resolves.
///
/// `types` lists `Default`-constructible plugin types. The optional
/// `constructors` section maps a type name to a fallible constructor function
/// of type [`ConstructFn`](crate::abi::ConstructFn).
#[macro_export]
macro_rules! export_plugin {
    (
        metadata: { $($key:literal => $value:expr),* $(,)? },
        types: [ $($ty:ty),* $(,)? ]
        $(, constructors: { $($cname:literal => $ctor:path),* $(,)? })?
        $(,)?
    ) => {
        #[doc(hidden)]
        static __ORBIS_PLUGIN_DECLARATION: $crate::abi::PluginDeclaration =
            $crate::abi::PluginDeclaration {
                abi_version: $crate::abi::ABI_VERSION,
                core_version: $crate::abi::CORE_VERSION,
                metadata: &[$(($key, $value)),*],
                factories: &[
                    $(
                        $crate::abi::PluginFactory {
                            type_name: ::core::stringify!($ty),
                            construct: $crate::abi::construct_default::<$ty>,
                        },
                    )*
                    $($(
                        $crate::abi::PluginFactory {
                            type_name: $cname,
                            construct: $ctor,
                        },
                    )*)?
                ],
            };

        #[doc(hidden)]
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn orbis_plugin_declaration() -> *const $crate::abi::PluginDeclaration {
            &__ORBIS_PLUGIN_DECLARATION
        }
    };
}
