// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory plugin binaries and an on-disk plugin tree to discover them from.
//!
//! [`FixtureLoader`] treats `*.plugin` files as binaries. The file contents are
//! ignored; what a file "declares" is looked up by file name among the
//! registered fixtures. Unregistered files load as binaries without any
//! metadata, which is how a helper library that is not a plugin looks.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orbis_core::abi::ConstructFn;
use orbis_core::{OrbisError, PluginFactory};
use orbis_plugin::manifest::keys;
use orbis_plugin::{BinaryHandle, BinaryLoader, DeclaredBinary, LoadedBinary};
use tempfile::TempDir;

/// Extension [`FixtureLoader`] recognizes.
pub const FIXTURE_EXTENSION: &str = "plugin";

/// A binary assembled in memory.
#[derive(Debug, Clone)]
pub struct StaticBinary {
    path: PathBuf,
    metadata: Vec<(String, String)>,
    factories: Vec<PluginFactory>,
}

impl StaticBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: Vec::new(),
            factories: Vec::new(),
        }
    }

    /// Declare the two required manifest keys.
    pub fn with_manifest(self, id: &str, name: &str) -> Self {
        self.with_meta(keys::ID, id).with_meta(keys::NAME, name)
    }

    /// Add one raw metadata entry.
    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    /// Export one capability type.
    pub fn with_factory(mut self, type_name: &'static str, construct: ConstructFn) -> Self {
        self.factories.push(PluginFactory {
            type_name,
            construct,
        });
        self
    }

    fn at(&self, path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..self.clone()
        }
    }
}

impl LoadedBinary for StaticBinary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn metadata(&self) -> Vec<(String, String)> {
        self.metadata.clone()
    }

    fn factories(&self) -> Vec<PluginFactory> {
        self.factories.clone()
    }
}

#[derive(Debug, Clone)]
enum Fixture {
    Binary(StaticBinary),
    Fail(String),
    Panic,
}

/// A [`BinaryLoader`] backed by registered fixtures.
#[derive(Debug, Clone, Default)]
pub struct FixtureLoader {
    fixtures: HashMap<String, Fixture>,
}

impl FixtureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files named `file_name` load as `binary`, rebased onto their real path.
    pub fn with_binary(mut self, file_name: &str, binary: StaticBinary) -> Self {
        self.fixtures
            .insert(file_name.to_string(), Fixture::Binary(binary));
        self
    }

    /// Files named `file_name` fail to load with `message`.
    pub fn with_failure(mut self, file_name: &str, message: &str) -> Self {
        self.fixtures
            .insert(file_name.to_string(), Fixture::Fail(message.to_string()));
        self
    }

    /// Loading files named `file_name` panics.
    pub fn with_panic(mut self, file_name: &str) -> Self {
        self.fixtures.insert(file_name.to_string(), Fixture::Panic);
        self
    }

    pub fn into_arc(self) -> Arc<dyn BinaryLoader> {
        Arc::new(self)
    }
}

impl BinaryLoader for FixtureLoader {
    fn is_candidate(&self, path: &Path) -> bool {
        path.is_file() && path.extension().is_some_and(|e| e == FIXTURE_EXTENSION)
    }

    fn load(&self, path: &Path) -> Result<BinaryHandle, OrbisError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.fixtures.get(file_name) {
            Some(Fixture::Binary(binary)) => Ok(Arc::new(binary.at(path))),
            Some(Fixture::Fail(message)) => Err(OrbisError::BinaryLoad {
                path: path.to_path_buf(),
                message: message.clone(),
            }),
            Some(Fixture::Panic) => panic!("fixture loader panicked on {file_name}"),
            None => Ok(Arc::new(DeclaredBinary::undeclared(path))),
        }
    }
}

/// A temporary plugin root populated with placeholder files.
#[derive(Debug)]
pub struct PluginTree {
    dir: TempDir,
}

impl PluginTree {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Create an empty file at `relative` below the root, with parents.
    pub fn touch(&self, relative: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, b"")?;
        Ok(path)
    }

    /// Copy an existing file to `relative` below the root, with parents.
    pub fn copy_in(&self, source: &Path, relative: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &path)?;
        Ok(path)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
