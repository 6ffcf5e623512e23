//! Discovering query documents and staging them for the external generator.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::prelude::*;




/// File name suffix of query documents.
pub const QUERY_SUFFIX: &str = ".graphql";

/// A discovered query document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryDocument {
    /// Path relative to the query root, e.g. `books/GetBooks.graphql`.
    pub relative_path: PathBuf,
}

impl QueryDocument {
    /// The document's location below `root`.
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
    }

    /// Directory components between the root and the file. These become
    /// sub-packages of the generated code.
    pub fn sub_packages(&self) -> impl Iterator<Item = String> + '_ {
        self.relative_path.parent()
            .into_iter()
            .flat_map(|p| p.components())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
    }
}

/// All documents found below one root, sorted by relative path. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    root: PathBuf,
    documents: Vec<QueryDocument>,
}

impl QuerySet {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> &[QueryDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Absolute (if `root` is) paths of all documents.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.documents.iter().map(|doc| doc.path_in(&self.root))
    }

    /// Copies every document into `dir`, keeping its relative path and
    /// overwriting existing files. Returns the same set rooted at `dir`.
    pub fn stage(&self, dir: &Path) -> Result<QuerySet> {
        for doc in &self.documents {
            let src = doc.path_in(&self.root);
            let dest = doc.path_in(dir);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).io_context("failed to create staging directory", parent)?;
            }
            fs::copy(&src, &dest).io_context("failed to stage query document", &src)?;
            trace!("Staged '{}' -> '{}'", src.display(), dest.display());
        }

        debug!("Staged {} query documents into '{}'", self.documents.len(), dir.display());
        Ok(QuerySet {
            root: dir.to_owned(),
            documents: self.documents.clone(),
        })
    }
}

/// Recursively collects all regular files ending in `.graphql` below `root`.
///
/// The result is sorted lexicographically by relative path, so the output of
/// the generator does not depend on the directory iteration order of the
/// file system.
pub fn collect(root: &Path) -> Result<QuerySet> {
    if !root.is_dir() {
        return Err(Error::NoQueriesFound { root: root.to_owned() });
    }

    let mut documents = Vec::new();
    walk(root, root, &mut documents)?;
    if documents.is_empty() {
        return Err(Error::NoQueriesFound { root: root.to_owned() });
    }

    documents.sort();
    debug!("Found {} query documents under '{}'", documents.len(), root.display());
    Ok(QuerySet { root: root.to_owned(), documents })
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<QueryDocument>) -> Result<()> {
    let entries = fs::read_dir(dir).io_context("failed to read query directory", dir)?;
    for entry in entries {
        let entry = entry.io_context("failed to read query directory", dir)?;
        let path = entry.path();

        // Follows symlinks, like the checks in `collect`.
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if path.is_file() && is_query_file(&path) {
            let relative_path = path.strip_prefix(root)
                .expect("bug: walked path is not below root")
                .to_path_buf();
            out.push(QueryDocument { relative_path });
        }
    }

    Ok(())
}

fn is_query_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(QUERY_SUFFIX))
}
