// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loadable plugin binaries.
//!
//! [`BinaryLoader`] decides which files are candidates and opens them;
//! [`LoadedBinary`] exposes what an opened binary declares: its embedded
//! metadata and the constructors for its capability types.
//!
//! The native backend opens shared libraries with `libloading` and resolves
//! [`ENTRY_SYMBOL`]. Opened plugin libraries are never closed: instances
//! created from them carry vtables that live inside the library, and the
//! registry cannot prove every instance handle has been dropped.

use std::fmt;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use orbis_core::OrbisError;
use orbis_core::abi::{ABI_VERSION, CORE_VERSION, ENTRY_SYMBOL, EntryFn, PluginDeclaration};
use orbis_core::PluginFactory;
use tracing::debug;

/// An opened binary.
pub trait LoadedBinary: Send + Sync + fmt::Debug {
    /// Filesystem location the binary was loaded from.
    fn path(&self) -> &Path;

    /// Embedded key/value metadata, in declaration order.
    fn metadata(&self) -> Vec<(String, String)>;

    /// Constructors for every concrete capability type, in declaration order.
    fn factories(&self) -> Vec<PluginFactory>;
}

/// Shared, opaque handle to an opened binary.
pub type BinaryHandle = Arc<dyn LoadedBinary>;

/// Strategy for recognizing and opening candidate binaries.
pub trait BinaryLoader: Send + Sync {
    /// Whether `path` should be offered to [`BinaryLoader::load`].
    fn is_candidate(&self, path: &Path) -> bool;

    /// Open the binary at `path`.
    fn load(&self, path: &Path) -> Result<BinaryHandle, OrbisError>;
}

/// A binary described by a static [`PluginDeclaration`].
///
/// Used for native libraries and for plugins linked into the host itself.
pub struct DeclaredBinary {
    path: PathBuf,
    declaration: Option<&'static PluginDeclaration>,
}

impl DeclaredBinary {
    pub fn new(path: impl Into<PathBuf>, declaration: &'static PluginDeclaration) -> Self {
        Self {
            path: path.into(),
            declaration: Some(declaration),
        }
    }

    /// A binary that opened fine but exports no plugin declaration.
    pub fn undeclared(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            declaration: None,
        }
    }
}

impl fmt::Debug for DeclaredBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredBinary")
            .field("path", &self.path)
            .field("declared", &self.declaration.is_some())
            .finish()
    }
}

impl LoadedBinary for DeclaredBinary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn metadata(&self) -> Vec<(String, String)> {
        self.declaration
            .map(|d| {
                d.metadata
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn factories(&self) -> Vec<PluginFactory> {
        self.declaration
            .map(|d| d.factories.to_vec())
            .unwrap_or_default()
    }
}

/// A shared library opened through `libloading`.
pub struct NativeBinary {
    inner: DeclaredBinary,
    // Never closed; see module docs.
    _library: Option<ManuallyDrop<Library>>,
}

impl fmt::Debug for NativeBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBinary")
            .field("path", &self.inner.path)
            .field("declared", &self.inner.declaration.is_some())
            .finish()
    }
}

impl LoadedBinary for NativeBinary {
    fn path(&self) -> &Path {
        self.inner.path()
    }

    fn metadata(&self) -> Vec<(String, String)> {
        self.inner.metadata()
    }

    fn factories(&self) -> Vec<PluginFactory> {
        self.inner.factories()
    }
}

/// File extensions recognized as shared libraries on this platform.
#[cfg(target_os = "macos")]
pub const NATIVE_EXTENSIONS: &[&str] = &["dylib"];

#[cfg(target_os = "windows")]
pub const NATIVE_EXTENSIONS: &[&str] = &["dll"];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const NATIVE_EXTENSIONS: &[&str] = &["so"];

/// Loads platform shared libraries exporting [`ENTRY_SYMBOL`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl BinaryLoader for NativeLoader {
    fn is_candidate(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| NATIVE_EXTENSIONS.contains(&ext))
    }

    fn load(&self, path: &Path) -> Result<BinaryHandle, OrbisError> {
        // SAFETY: opening a library runs its initializers. Plugins run with full
        // host privilege; the ABI checks below guard against layout mismatches.
        let library = unsafe { Library::new(path) }.map_err(|e| OrbisError::BinaryLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        // SAFETY: the symbol type matches `export_plugin!`'s generated entry point.
        let entry = unsafe { library.get::<EntryFn>(ENTRY_SYMBOL) }
            .ok()
            .map(|symbol| *symbol);
        let Some(entry) = entry else {
            debug!(path = %path.display(), "library exports no plugin declaration");
            return Ok(Arc::new(NativeBinary {
                inner: DeclaredBinary::undeclared(path),
                _library: None,
            }));
        };

        // SAFETY: the entry point returns a pointer to a static inside the library,
        // which stays mapped because the library is never closed on success.
        let declaration = unsafe { entry().as_ref() }.ok_or_else(|| OrbisError::Abi {
            path: path.to_path_buf(),
            message: "entry point returned null".to_string(),
        })?;

        check_abi(path, declaration)?;

        Ok(Arc::new(NativeBinary {
            inner: DeclaredBinary::new(path, declaration),
            _library: Some(ManuallyDrop::new(library)),
        }))
    }
}

fn check_abi(path: &Path, declaration: &PluginDeclaration) -> Result<(), OrbisError> {
    if declaration.abi_version != ABI_VERSION {
        return Err(OrbisError::Abi {
            path: path.to_path_buf(),
            message: format!(
                "ABI version mismatch: plugin={}, host={ABI_VERSION}",
                declaration.abi_version
            ),
        });
    }
    if declaration.core_version != CORE_VERSION {
        return Err(OrbisError::Abi {
            path: path.to_path_buf(),
            message: format!(
                "orbis-core version mismatch: plugin={}, host={CORE_VERSION}",
                declaration.core_version
            ),
        });
    }
    Ok(())
}
