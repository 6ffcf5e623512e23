//! Invoking the code generator, either in-process or as external process.

use std::{fs, path::PathBuf, time::{Duration, Instant}};

use crate::{
    config::{GenerationConfig, GeneratorMode},
    error::{BoxError, GenerationFailure},
    prelude::*,
    queries::QuerySet,
    schema::SchemaDescriptor,
};


mod ir;
mod process;
mod runtime;


pub use self::{
    ir::{package_name, IntermediateRepresentation, OperationSource},
    process::{arguments, find_interpreter, GeneratorCommand},
    runtime::{ExtractedRuntime, RuntimeBundle, RuntimeManifest},
};


/// File name of the compiled IR the external generator writes into the
/// staging directory.
pub const COMPILED_IR_FILE: &str = "ir.json";

/// A native code generator. Writes source files for `ir` below
/// `config.output_dir`.
///
/// Implementations must be deterministic: the same input has to produce the
/// same files.
pub trait CodeGenerator {
    fn write(&self, ir: &IntermediateRepresentation, config: &GenerationConfig) -> Result<(), BoxError>;
}

impl<F> CodeGenerator for F
where
    F: Fn(&IntermediateRepresentation, &GenerationConfig) -> Result<(), BoxError>,
{
    fn write(&self, ir: &IntermediateRepresentation, config: &GenerationConfig) -> Result<(), BoxError> {
        self(ir, config)
    }
}

#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub mode: GeneratorMode,
    /// Exit status of the external generator (process mode only).
    pub exit_status: Option<std::process::ExitStatus>,
    /// Location of the compiled IR (process mode only).
    pub compiled_ir: Option<PathBuf>,
    pub operations: usize,
    /// Whether a [`CodeGenerator`] was called.
    pub generator_called: bool,
    pub elapsed: Duration,
}

/// Runs code generation for `queries` against `schema`, in the mode
/// configured in `config.generator.mode`.
///
/// In process mode, `generator` is optional: if given, it is called with the
/// compiled output of the external generator. In in-process mode it is
/// required.
pub fn invoke(
    schema: &SchemaDescriptor,
    queries: &QuerySet,
    config: &GenerationConfig,
    generator: Option<&dyn CodeGenerator>,
) -> Result<InvocationResult> {
    let before = Instant::now();
    let mut result = match config.generator.mode {
        GeneratorMode::InProcess => {
            let generator = generator.ok_or_else(|| Error::InvalidConfiguration(
                "generator mode 'in-process' requires a code generator, but none was provided".into(),
            ))?;
            invoke_in_process(schema, queries, config, generator)?
        }
        GeneratorMode::Process => invoke_process(schema, queries, config, generator)?,
    };

    result.elapsed = before.elapsed();
    debug!(
        "Generator ({}) finished for {} operations in {:.2?}",
        result.mode,
        result.operations,
        result.elapsed,
    );
    Ok(result)
}

fn invoke_in_process(
    schema: &SchemaDescriptor,
    queries: &QuerySet,
    config: &GenerationConfig,
    generator: &dyn CodeGenerator,
) -> Result<InvocationResult> {
    let ir = IntermediateRepresentation::parse(schema, queries, config)?;
    run_generator(generator, &ir, config)?;

    Ok(InvocationResult {
        mode: GeneratorMode::InProcess,
        exit_status: None,
        compiled_ir: None,
        operations: ir.operations.len(),
        generator_called: true,
        elapsed: Duration::ZERO,
    })
}

fn invoke_process(
    schema: &SchemaDescriptor,
    queries: &QuerySet,
    config: &GenerationConfig,
    generator: Option<&dyn CodeGenerator>,
) -> Result<InvocationResult> {
    let command = GeneratorCommand::locate(config)?;

    let staged = queries.stage(&config.staging_dir)?;
    let schema_path = schema.materialize(&config.staging_dir)?;
    let compiled_ir = config.staging_dir.join(COMPILED_IR_FILE);
    let args = arguments(&staged, &schema_path, &compiled_ir);
    let status = command.run(&args)?;

    let mut operations = staged.len();
    if let Some(generator) = generator {
        let ir = IntermediateRepresentation::from_compiled(schema, &compiled_ir, &staged, config)?;
        run_generator(generator, &ir, config)?;
        operations = ir.operations.len();
    }

    Ok(InvocationResult {
        mode: GeneratorMode::Process,
        exit_status: Some(status),
        compiled_ir: Some(compiled_ir),
        operations,
        generator_called: generator.is_some(),
        elapsed: Duration::ZERO,
    })
}

fn run_generator(
    generator: &dyn CodeGenerator,
    ir: &IntermediateRepresentation,
    config: &GenerationConfig,
) -> Result<()> {
    fs::create_dir_all(&config.output_dir)
        .io_context("failed to create output directory", &config.output_dir)?;
    if let Some(dir) = &config.transformed_queries_dir {
        fs::create_dir_all(dir).io_context("failed to create directory", dir)?;
    }

    generator.write(ir, config)
        .map_err(|e| Error::GenerationFailed(GenerationFailure::Rejected(e)))
}
