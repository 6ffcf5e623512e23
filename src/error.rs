//! The error taxonomy of a generation run. Every variant is terminal: nothing
//! is retried, the run is aborted and the error is handed to the caller.

use std::{io, path::PathBuf, process::ExitStatus};


/// Type-erased error raised by a code generator implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("schema file '{}' does not exist or is not a regular file", path.display())]
    SchemaUnavailable { path: PathBuf },

    #[error("failed to introspect schema from '{endpoint}': {reason}")]
    IntrospectionFailed {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("no query documents (*.graphql) found under '{}'", root.display())]
    NoQueriesFound { root: PathBuf },

    #[error("generator not found: {0}")]
    GeneratorNotFound(String),

    #[error("code generation failed")]
    GenerationFailed(#[source] GenerationFailure),

    #[error("{context} ('{}')", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why the generator did not produce output.
#[derive(Debug, thiserror::Error)]
pub enum GenerationFailure {
    #[error("could not start '{}'", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' exited with {status}", program.display())]
    NonZeroExit { program: PathBuf, status: ExitStatus },

    #[error("compiled IR at '{}' is malformed: {reason}", path.display())]
    MalformedIr { path: PathBuf, reason: String },

    #[error("schema at '{}' is malformed: {reason}", path.display())]
    MalformedSchema { path: PathBuf, reason: String },

    #[error("the generator rejected its input")]
    Rejected(#[source] BoxError),
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { context, path: path.into(), source }
    }

    pub(crate) fn introspection(endpoint: impl ToString, reason: impl Into<String>) -> Self {
        Self::IntrospectionFailed {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Returns the exit code of the external generator if the run failed
    /// because of it.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::GenerationFailed(GenerationFailure::NonZeroExit { status, .. }) => status.code(),
            _ => None,
        }
    }
}

/// Shorthand for `map_err(|e| Error::io(...))`.
pub(crate) trait IoContext<T> {
    fn io_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| Error::io(context, path, e))
    }
}
