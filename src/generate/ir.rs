//! The input handed to a [`CodeGenerator`](super::CodeGenerator).
//!
//! This is not a GraphQL type system: the schema is kept as the raw
//! `__schema` JSON object and operations as source text. Understanding both
//! is the generator's job.

use std::{
    fs,
    path::{Path, PathBuf},
};
use serde::Deserialize;

use crate::{
    config::GenerationConfig,
    error::GenerationFailure,
    prelude::*,
    queries::{QueryDocument, QuerySet},
    schema::{self, SchemaDescriptor},
};


#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateRepresentation {
    /// The `__schema` object of the introspection result.
    pub schema: serde_json::Value,

    /// One entry per query document, sorted by relative path.
    pub operations: Vec<OperationSource>,

    /// The document emitted by the external compiler, only present in
    /// process mode.
    pub compiled: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSource {
    /// Path relative to the query root.
    pub relative_path: PathBuf,
    /// Package the generated types for this document belong to.
    pub package_name: String,
    pub source: String,
}

impl IntermediateRepresentation {
    /// Combines the schema with the documents in `queries`.
    pub fn parse(
        schema: &SchemaDescriptor,
        queries: &QuerySet,
        config: &GenerationConfig,
    ) -> Result<Self> {
        let schema_json = parse_schema(schema, config)?;
        let operations = queries.documents()
            .iter()
            .map(|doc| {
                let path = doc.path_in(queries.root());
                let source = fs::read_to_string(&path)
                    .io_context("failed to read query document", &path)?;
                Ok(OperationSource {
                    relative_path: doc.relative_path.clone(),
                    package_name: package_name(config, doc),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { schema: schema_json, operations, compiled: None })
    }

    /// Builds the representation from the output of the external compiler
    /// (`--target json`). `staged` is the query set the compiler was called
    /// with; the compiler reports operations by their absolute path in it.
    pub fn from_compiled(
        schema: &SchemaDescriptor,
        compiled_path: &Path,
        staged: &QuerySet,
        config: &GenerationConfig,
    ) -> Result<Self> {
        let malformed = |reason: String| Error::GenerationFailed(GenerationFailure::MalformedIr {
            path: compiled_path.to_owned(),
            reason,
        });

        let text = fs::read_to_string(compiled_path)
            .io_context("failed to read compiled IR", compiled_path)?;
        let compiled: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| malformed(format!("invalid JSON: {e}")))?;
        let CompiledDocument { operations } = CompiledDocument::deserialize(&compiled)
            .map_err(|e| malformed(e.to_string()))?;

        let mut out = Vec::with_capacity(operations.len());
        for op in operations {
            let relative_path = Path::new(&op.file_path)
                .strip_prefix(staged.root())
                .map_err(|_| malformed(format!(
                    "operation file '{}' is not below '{}'",
                    op.file_path,
                    staged.root().display(),
                )))?
                .to_path_buf();
            let doc = QueryDocument { relative_path };
            let source = match op.source {
                Some(source) => source,
                None => {
                    let path = doc.path_in(staged.root());
                    fs::read_to_string(&path).io_context("failed to read query document", &path)?
                }
            };

            out.push(OperationSource {
                package_name: package_name(config, &doc),
                relative_path: doc.relative_path,
                source,
            });
        }
        out.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        Ok(Self {
            schema: parse_schema(schema, config)?,
            operations: out,
            compiled: Some(compiled),
        })
    }

    /// Names of all types of kind `SCALAR` in the schema.
    pub fn scalar_names(&self) -> impl Iterator<Item = &str> {
        self.schema.get("types")
            .and_then(|types| types.as_array())
            .into_iter()
            .flatten()
            .filter(|ty| ty.get("kind").and_then(|k| k.as_str()) == Some("SCALAR"))
            .filter_map(|ty| ty.get("name")?.as_str())
    }
}

#[derive(Deserialize)]
struct CompiledDocument {
    operations: Vec<CompiledOperation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompiledOperation {
    file_path: String,
    source: Option<String>,
}

fn parse_schema(schema: &SchemaDescriptor, config: &GenerationConfig) -> Result<serde_json::Value> {
    let location = schema.path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("<introspection result>"));
    let malformed = |reason: String| Error::GenerationFailed(GenerationFailure::MalformedSchema {
        path: location.clone(),
        reason,
    });

    let json: serde_json::Value = serde_json::from_str(&schema.text()?)
        .map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let root = schema::schema_root(&json)
        .ok_or_else(|| malformed("no `__schema` object found".into()))?
        .clone();

    // Mappings for scalars that don't exist are most likely typos.
    let ir = IntermediateRepresentation { schema: root, operations: vec![], compiled: None };
    let scalars = ir.scalar_names().collect::<Vec<_>>();
    for scalar in config.custom_type_map.keys() {
        if !scalars.contains(&scalar.as_str()) {
            warn!("Custom type mapping for '{scalar}', but the schema has no such scalar");
        }
    }

    Ok(ir.schema)
}

/// The package of generated types for `doc`: the root package plus one
/// sub-package per directory between the query root and the document.
pub fn package_name(config: &GenerationConfig, doc: &QueryDocument) -> String {
    std::iter::once(config.root_package_name.clone())
        .chain(doc.sub_packages().map(|segment| sanitize_segment(&segment)))
        .collect::<Vec<_>>()
        .join(".")
}

fn sanitize_segment(segment: &str) -> String {
    let mut out: String = segment.chars()
        .map(|c| if c == '_' || c.is_alphanumeric() { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
