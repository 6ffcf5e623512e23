//! The generator runtime (the external CLI and its dependencies) that is
//! embedded into this binary at build time and extracted before use.

use std::{
    fs,
    io,
    path::{Component, Path, PathBuf},
};
use serde::Deserialize;

use crate::prelude::*;


mod assets {
    include!(concat!(env!("OUT_DIR"), "/runtime_assets.rs"));
}

/// Describes the embedded runtime, read from its `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeManifest {
    pub name: String,
    pub version: String,
    /// Interpreter the entry script is written for.
    pub interpreter: String,
    /// Path of the CLI entry script, relative to the runtime root.
    pub entry: String,
}

type Files = &'static [(&'static str, &'static [u8])];

#[derive(Debug, Clone)]
pub struct RuntimeBundle {
    manifest: RuntimeManifest,
    files: Files,
}

/// A runtime written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRuntime {
    pub root: PathBuf,
    pub entry: PathBuf,
}

impl RuntimeBundle {
    /// The runtime embedded into this binary.
    pub fn embedded() -> Result<Self> {
        let manifest = serde_json::from_str(assets::MANIFEST).map_err(|e| {
            Error::GeneratorNotFound(format!("embedded runtime manifest is invalid: {e}"))
        })?;
        Ok(Self { manifest, files: assets::FILES })
    }

    #[cfg(test)]
    pub(crate) fn new(manifest: RuntimeManifest, files: Files) -> Self {
        Self { manifest, files }
    }

    pub fn manifest(&self) -> &RuntimeManifest {
        &self.manifest
    }

    /// Number of embedded files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether the bundle contains its entry script. Builds without the
    /// vendored runtime only carry the manifest.
    pub fn contains_entry(&self) -> bool {
        self.files.iter().any(|(path, _)| *path == self.manifest.entry)
    }

    /// Writes the bundle to `dest`. Anything that was in `dest` before is
    /// removed first, so stale files of a different runtime version never
    /// survive.
    pub fn extract(&self, dest: &Path) -> Result<ExtractedRuntime> {
        if !self.contains_entry() {
            return Err(Error::GeneratorNotFound(format!(
                "the embedded {} {} runtime does not contain its entry script '{}' \
                    (configure `generator.script` to use an installed generator)",
                self.manifest.name,
                self.manifest.version,
                self.manifest.entry,
            )));
        }

        match fs::remove_dir_all(dest) {
            Ok(()) => trace!("Removed old runtime at '{}'", dest.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io("failed to remove old runtime", dest, e)),
        }

        for (relative, contents) in self.files {
            let relative = checked_relative(relative)?;
            let path = dest.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).io_context("failed to create directory", parent)?;
            }
            fs::write(&path, contents).io_context("failed to extract runtime file", &path)?;
        }

        let entry = dest.join(checked_relative(&self.manifest.entry)?);
        make_executable(&entry)?;

        debug!(
            "Extracted {} {} ({} files) to '{}'",
            self.manifest.name,
            self.manifest.version,
            self.files.len(),
            dest.display(),
        );
        Ok(ExtractedRuntime { root: dest.to_owned(), entry })
    }
}

/// Bundle paths must stay inside the destination.
fn checked_relative(path: &str) -> Result<&Path> {
    let path = Path::new(path);
    if path.components().all(|c| matches!(c, Component::Normal(_))) {
        Ok(path)
    } else {
        Err(Error::GeneratorNotFound(format!(
            "embedded runtime contains invalid path '{}'",
            path.display(),
        )))
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .io_context("failed to read permissions", path)?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions).io_context("failed to set permissions", path)
}

#[cfg(not(unix))]
fn make_executable(_: &Path) -> Result<()> {
    Ok(())
}
