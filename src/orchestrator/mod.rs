//! Ties everything together: one run resolves the schema, collects the query
//! documents, invokes the generator and registers the output with the build.

use std::{fs, path::PathBuf, time::Instant};

use crate::{
    config::{GenerationConfig, GeneratorMode},
    generate::{self, CodeGenerator, InvocationResult},
    prelude::*,
    queries,
    schema::{self, SchemaDescriptor},
};


mod host;
mod progress;


pub use self::{
    host::{BuildHost, CargoHost, SourceRoots, SOURCE_DIR_ENV},
    progress::{Notifier, Progress, TracingNotifier},
};


#[derive(Debug)]
pub enum Outcome {
    /// The run was disabled via `skip`. Nothing was touched.
    Skipped,
    Completed(GeneratedSources),
}

impl Outcome {
    pub fn generated(&self) -> Option<&GeneratedSources> {
        match self {
            Self::Skipped => None,
            Self::Completed(sources) => Some(sources),
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct GeneratedSources {
    /// Directory containing the generated sources.
    pub dir: PathBuf,
    pub schema: SchemaDescriptor,
    pub query_documents: usize,
    pub invocation: InvocationResult,
    pub source_root_registered: bool,
}

pub struct Orchestrator<'a> {
    config: GenerationConfig,
    generator: Option<&'a dyn CodeGenerator>,
    notifier: Box<dyn Notifier + 'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            generator: None,
            notifier: Box::new(TracingNotifier),
        }
    }

    /// Sets the native code generator. Required in in-process mode; in
    /// process mode, it is called with the output of the external generator.
    pub fn with_generator(mut self, generator: &'a dyn CodeGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'a) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Performs one run. Stops at the first error; nothing is retried and
    /// files written by earlier runs are left in place.
    pub fn run(&self, host: &mut dyn BuildHost) -> Result<Outcome> {
        let config = &self.config;
        if config.skip {
            self.notifier.notify(&Progress::Skipped);
            return Ok(Outcome::Skipped);
        }

        let before = Instant::now();
        if config.generator.mode == GeneratorMode::InProcess && self.generator.is_none() {
            return Err(Error::InvalidConfiguration(
                "generator mode 'in-process' requires a code generator, but none was provided".into(),
            ));
        }

        let schema = schema::resolve(config)?;
        self.notifier.notify(&Progress::SchemaResolved {
            path: schema.path().map(Into::into),
            introspected: matches!(schema, SchemaDescriptor::Introspected { .. }),
        });

        let queries = queries::collect(&config.query_dir)?;
        self.notifier.notify(&Progress::QueriesDiscovered {
            root: queries.root().to_owned(),
            count: queries.len(),
        });

        self.notifier.notify(&Progress::GenerationStarted { mode: config.generator.mode });
        let invocation = generate::invoke(&schema, &queries, config, self.generator)?;
        self.notifier.notify(&Progress::GenerationFinished {
            mode: invocation.mode,
            operations: invocation.operations,
        });

        // Without a native generator, process mode only produces the compiled
        // IR, but the registered root has to exist either way.
        fs::create_dir_all(&config.output_dir)
            .io_context("failed to create output directory", &config.output_dir)?;

        host.watch(&config.query_dir)?;
        if let SchemaDescriptor::File(path) = &schema {
            host.watch(path)?;
        }
        if config.add_source_root {
            host.add_compile_source_root(&config.output_dir)?;
            self.notifier.notify(&Progress::SourceRootRegistered {
                dir: config.output_dir.clone(),
            });
        }

        debug!("GraphQL client generation finished in {:.2?}", before.elapsed());
        Ok(Outcome::Completed(GeneratedSources {
            dir: config.output_dir.clone(),
            schema,
            query_documents: queries.len(),
            invocation,
            source_root_registered: config.add_source_root,
        }))
    }
}
