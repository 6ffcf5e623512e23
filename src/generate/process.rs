//! Running the external generator CLI as a child process.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};

use crate::{
    config::{GenerationConfig, GeneratorSettings},
    error::GenerationFailure,
    prelude::*,
    queries::QuerySet,
};
use super::runtime::RuntimeBundle;


/// The fully resolved command line of the external generator, minus the
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    pub interpreter: PathBuf,
    pub script: PathBuf,
    pub working_dir: PathBuf,
}

impl GeneratorCommand {
    /// Finds the interpreter and the generator script. If no script is
    /// configured, the embedded runtime is extracted to
    /// `config.runtime_dir`.
    pub fn locate(config: &GenerationConfig) -> Result<Self> {
        let settings = &config.generator;
        let interpreter = find_interpreter(settings)?;

        let (script, working_dir) = match &settings.script {
            Some(script) => {
                let dir = script.parent().map(Path::to_path_buf).unwrap_or_default();
                (script.clone(), dir)
            }
            None => {
                let bundle = RuntimeBundle::embedded()?;
                if bundle.manifest().interpreter != settings.interpreter {
                    warn!(
                        "Embedded generator runtime expects interpreter '{}', but '{}' is configured",
                        bundle.manifest().interpreter,
                        settings.interpreter,
                    );
                }
                let runtime = bundle.extract(&config.runtime_dir)?;
                (runtime.entry, runtime.root)
            }
        };

        if !script.is_file() {
            return Err(Error::GeneratorNotFound(format!(
                "generator script '{}' does not exist",
                script.display(),
            )));
        }

        debug!("Using generator '{}' run by '{}'", script.display(), interpreter.display());
        Ok(Self { interpreter, script, working_dir })
    }

    /// Runs the generator with `args`, blocking until it exits. Its stdout
    /// and stderr are forwarded to ours.
    pub fn run(&self, args: &[OsString]) -> Result<ExitStatus> {
        info!(
            "Running generator: {} {} {}",
            self.interpreter.display(),
            self.script.display(),
            args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" "),
        );

        let status = Command::new(&self.interpreter)
            .arg(&self.script)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::GenerationFailed(GenerationFailure::Spawn {
                program: self.interpreter.clone(),
                source,
            }))?;

        if !status.success() {
            return Err(Error::GenerationFailed(GenerationFailure::NonZeroExit {
                program: self.script.clone(),
                status,
            }));
        }

        Ok(status)
    }
}

/// Arguments for the generator: every staged document, then the fixed
/// options.
pub fn arguments(queries: &QuerySet, schema: &Path, output: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from("generate")];
    args.extend(queries.paths().map(PathBuf::into_os_string));
    args.extend([
        OsString::from("--target"),
        OsString::from("json"),
        OsString::from("--schema"),
        schema.as_os_str().to_owned(),
        OsString::from("--output"),
        output.as_os_str().to_owned(),
    ]);
    args
}

/// Looks up the interpreter in the configured search path (or `PATH`). Only
/// executable files count.
pub fn find_interpreter(settings: &GeneratorSettings) -> Result<PathBuf> {
    let name = &settings.interpreter;
    let search_path = match &settings.search_path {
        Some(path) => path.clone(),
        None => env::var_os("PATH").unwrap_or_default(),
    };
    let cwd = env::current_dir().io_context("failed to determine current directory", ".")?;

    which::which_in(name, Some(&search_path), cwd).map_err(|e| {
        Error::GeneratorNotFound(format!("'{name}' not found on the search path ({e})"))
    })
}
