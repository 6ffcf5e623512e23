use std::path::PathBuf;

use crate::{config::GeneratorMode, prelude::*};


/// Stages of a run, reported to a [`Notifier`] in this order. A skipped run
/// only reports `Skipped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Skipped,
    SchemaResolved {
        /// Where the schema is on disk, if it is.
        path: Option<PathBuf>,
        introspected: bool,
    },
    QueriesDiscovered {
        root: PathBuf,
        count: usize,
    },
    GenerationStarted {
        mode: GeneratorMode,
    },
    GenerationFinished {
        mode: GeneratorMode,
        operations: usize,
    },
    SourceRootRegistered {
        dir: PathBuf,
    },
}

/// Receives user-facing progress notices.
pub trait Notifier {
    fn notify(&self, progress: &Progress);
}

impl<F: Fn(&Progress)> Notifier for F {
    fn notify(&self, progress: &Progress) {
        self(progress)
    }
}

/// Emits every notice as `info` log message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, progress: &Progress) {
        match progress {
            Progress::Skipped => info!("Skipping GraphQL client generation"),
            Progress::SchemaResolved { path: Some(path), introspected: true } => {
                info!("Introspected schema and stored it at '{}'", path.display());
            }
            Progress::SchemaResolved { path: None, .. } => {
                info!("Introspected schema (not persisted)");
            }
            Progress::SchemaResolved { path: Some(path), introspected: false } => {
                info!("Using schema '{}'", path.display());
            }
            Progress::QueriesDiscovered { root, count } => {
                info!("Found {count} query documents in '{}'", root.display());
            }
            Progress::GenerationStarted { mode } => {
                info!("Generating GraphQL client code ({mode})...");
            }
            Progress::GenerationFinished { operations, .. } => {
                info!("Generated GraphQL client code for {operations} query documents");
            }
            Progress::SourceRootRegistered { dir } => {
                info!("Registered '{}' as source root", dir.display());
            }
        }
    }
}
