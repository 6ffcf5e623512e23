use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::prelude::*;


/// Name of the environment variable that [`CargoHost`] sets for the crate
/// being built. Points to the directory with the generated sources.
pub const SOURCE_DIR_ENV: &str = "GRAPHQL_CLIENT_DIR";

/// The build system a run is embedded in.
pub trait BuildHost {
    /// Makes `dir` part of the sources that are compiled.
    fn add_compile_source_root(&mut self, dir: &Path) -> Result<()>;

    /// Tells the host that the output depends on `path`.
    fn watch(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Only records the source roots. Useful when the caller wants to handle
/// them itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRoots {
    roots: Vec<PathBuf>,
    watched: Vec<PathBuf>,
}

impl SourceRoots {
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

impl BuildHost for SourceRoots {
    fn add_compile_source_root(&mut self, dir: &Path) -> Result<()> {
        if !self.roots.iter().any(|root| root == dir) {
            self.roots.push(dir.to_owned());
        }
        Ok(())
    }

    fn watch(&mut self, path: &Path) -> Result<()> {
        self.watched.push(path.to_owned());
        Ok(())
    }
}

/// Host for use inside a Cargo build script: source roots and watched paths
/// are printed as `cargo:` directives.
#[derive(Debug)]
pub struct CargoHost<W = io::Stdout> {
    out: W,
}

impl CargoHost {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> CargoHost<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn directive(&mut self, directive: &str, path: &Path) -> Result<()> {
        writeln!(self.out, "cargo:{directive}={}", path.display())
            .io_context("failed to write build script directive", path)
    }
}

impl<W: Write> BuildHost for CargoHost<W> {
    fn add_compile_source_root(&mut self, dir: &Path) -> Result<()> {
        self.directive(&format!("rustc-env={SOURCE_DIR_ENV}"), dir)
    }

    fn watch(&mut self, path: &Path) -> Result<()> {
        self.directive("rerun-if-changed", path)
    }
}
