//! Generates typed GraphQL client code at build time.
//!
//! A run resolves the schema (from a file or by introspecting an endpoint),
//! collects the `*.graphql` query documents, invokes the code generator and
//! registers the generated sources with the build. See [`Orchestrator`].
//!
//! From a build script:
//!
//! ```no_run
//! use graphql_clientgen::{CargoHost, GenerationConfig, GeneratorMode, Orchestrator};
//! # fn my_generator(
//! #     _: &graphql_clientgen::IntermediateRepresentation,
//! #     _: &GenerationConfig,
//! # ) -> Result<(), graphql_clientgen::BoxError> { Ok(()) }
//!
//! let config = GenerationConfig::builder(std::env::var("CARGO_MANIFEST_DIR").unwrap())
//!     .root_package_name("org.example.books")
//!     .generator_mode(GeneratorMode::InProcess)
//!     .build()?;
//! Orchestrator::new(config)
//!     .with_generator(&my_generator)
//!     .run(&mut CargoHost::stdout())?;
//! # Ok::<(), graphql_clientgen::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod logger;
pub mod orchestrator;
pub mod queries;
pub mod schema;
pub mod version;

mod prelude;
mod util;

#[cfg(test)]
mod testutil;


pub use crate::{
    config::{Config, GenerationConfig, GenerationConfigBuilder, GeneratorMode, NullableValueType},
    error::{BoxError, Error, GenerationFailure, Result},
    generate::{CodeGenerator, IntermediateRepresentation, InvocationResult, OperationSource},
    orchestrator::{
        BuildHost, CargoHost, GeneratedSources, Notifier, Orchestrator, Outcome, Progress,
        SourceRoots, TracingNotifier,
    },
    queries::{QueryDocument, QuerySet},
    schema::SchemaDescriptor,
};
