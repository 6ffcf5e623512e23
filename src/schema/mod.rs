//! Resolving the GraphQL schema: either from an existing file or by
//! introspecting a live endpoint.

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};
use tap::Pipe;

use crate::{config::GenerationConfig, prelude::*};


pub mod introspection;

#[cfg(test)]
mod tests;


/// The schema a run works with. Exactly one of the two strategies produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDescriptor {
    /// An existing schema description on disk.
    File(PathBuf),

    /// Payload fetched via introspection. `persisted_to` is the file it was
    /// written to, if any.
    Introspected {
        payload: String,
        persisted_to: Option<PathBuf>,
    },
}

impl SchemaDescriptor {
    /// The on-disk location of this schema, if it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Introspected { persisted_to, .. } => persisted_to.as_deref(),
        }
    }

    /// Returns the schema description as text, reading it from disk if
    /// necessary.
    pub fn text(&self) -> Result<Cow<'_, str>> {
        match self {
            Self::File(path) => fs::read_to_string(path)
                .io_context("failed to read schema file", path)
                .map(Cow::Owned),
            Self::Introspected { payload, .. } => Ok(Cow::Borrowed(payload)),
        }
    }

    /// Returns a path to a file containing the schema. If the schema only
    /// exists in memory, it is written to `dir` first.
    pub(crate) fn materialize(&self, dir: &Path) -> Result<PathBuf> {
        if let Some(path) = self.path() {
            return Ok(path.to_owned());
        }

        let path = dir.join("introspection.json");
        fs::create_dir_all(dir).io_context("failed to create directory", dir)?;
        fs::write(&path, self.text()?.as_bytes()).io_context("failed to write schema", &path)?;
        debug!("Wrote in-memory schema to '{}'", path.display());
        Ok(path)
    }
}

/// Resolves the schema according to `config`: introspects the configured
/// endpoint if introspection is enabled, otherwise checks that the schema file
/// exists.
pub fn resolve(config: &GenerationConfig) -> Result<SchemaDescriptor> {
    let Some(settings) = &config.introspection else {
        let path = &config.schema_file;
        if !path.is_file() {
            return Err(Error::SchemaUnavailable { path: path.clone() });
        }
        debug!("Using schema file '{}'", path.display());
        return path.clone().pipe(SchemaDescriptor::File).pipe(Ok);
    };

    info!("Fetching schema from '{}' via introspection", settings.endpoint);
    let payload = introspection::fetch_blocking(settings)?;

    let persisted_to = if settings.persist {
        let path = &config.schema_file;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).io_context("failed to create directory", parent)?;
        }
        fs::write(path, &payload).io_context("failed to write introspection result", path)?;
        info!("Wrote introspection result to '{}'", path.display());
        Some(path.clone())
    } else {
        None
    };

    Ok(SchemaDescriptor::Introspected { payload, persisted_to })
}

/// Returns the `__schema` object of an introspection result. It is accepted
/// both at the root and inside the `data` field of a GraphQL response.
pub fn schema_root(json: &serde_json::Value) -> Option<&serde_json::Value> {
    json.get("__schema")
        .or_else(|| json.get("data")?.get("__schema"))
        .filter(|schema| schema.is_object())
}
