use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use anyhow::{anyhow, Context as _};
use confique::Config as _;
use tap::Pipe;

use crate::prelude::*;


mod codegen;
mod generation;
mod generator;
mod introspection;
mod paths;


pub use self::{
    codegen::CodegenConfig,
    generation::{
        GenerationConfig, GenerationConfigBuilder, GeneratorMode, GeneratorSettings,
        IntrospectionSettings, NullableValueType,
        DEFAULT_BUILD_DIR, DEFAULT_ENDPOINT, DEFAULT_INTERPRETER, DEFAULT_QUERY_DIR,
        DEFAULT_ROOT_PACKAGE, DEFAULT_SCHEMA_FILE, DEFAULT_SCHEMA_PACKAGE,
    },
    generator::GeneratorConfig,
    introspection::IntrospectionConfig,
    paths::PathsConfig,
};
pub(crate) use self::generation::is_graphql_name;


/// The locations where we look for a configuration file. The first existing
/// file in this list is used.
const DEFAULT_PATHS: &[&str] = &["graphql-clientgen.toml", ".config/graphql-clientgen.toml"];

const CONFIG_PATH_ENV: &str = "GRAPHQL_CLIENTGEN_CONFIG";

/// Configuration for `graphql-clientgen`.
///
/// All relative paths are relative to the location of this configuration file
/// (the "project directory").
#[derive(Debug, confique::Config)]
pub struct Config {
    /// If set to `true`, the whole generation is skipped and treated as
    /// success. Can also be set via `GRAPHQL_CLIENTGEN_SKIP=true`.
    #[config(default = false, env = "GRAPHQL_CLIENTGEN_SKIP")]
    pub skip: bool,

    /// Whether to register the output directory as source root with the
    /// build (e.g. as `cargo:rustc-env` when running in a build script).
    #[config(default = true)]
    pub add_source_root: bool,

    #[config(nested)]
    pub paths: PathsConfig,

    #[config(nested)]
    pub codegen: CodegenConfig,

    #[config(nested)]
    pub introspection: IntrospectionConfig,

    #[config(nested)]
    pub generator: GeneratorConfig,

    #[config(nested)]
    pub log: crate::logger::LogConfig,
}

impl Config {
    /// Tries to find a config file by checking `GRAPHQL_CLIENTGEN_CONFIG` and
    /// the list of default locations. If no file exists, only defaults and
    /// environment variables are used and the current directory is the
    /// project directory. Returns the config, the project directory and the
    /// path of the loaded file.
    pub fn from_env_or_default_locations() -> anyhow::Result<(Self, PathBuf, Option<PathBuf>)> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => DEFAULT_PATHS.iter().map(PathBuf::from).find(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let config = Self::load_from(&path)
                    .with_context(|| format!("failed to load configuration from '{}'", path.display()))?;
                let project_dir = project_dir_of(&path)?;
                Ok((config, project_dir, Some(path)))
            }
            None => {
                debug!(
                    "No configuration file found (checked: {}), using defaults",
                    DEFAULT_PATHS.join(", "),
                );
                let config = Self::builder().env().load()
                    .context("failed to load configuration from environment")?;
                let cwd = std::env::current_dir().context("failed to determine current directory")?;
                Ok((config, cwd, None))
            }
        }
    }

    /// Loads the configuration from a specific TOML file. Environment
    /// variables take precedence over the file.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        Self::builder()
            .env()
            .file(path)
            .load()
            .with_context(|| format!("failed to read config file '{}'", path.display()))
    }

    /// Loads the configuration from `path` and validates it, with the file's
    /// directory as project directory.
    pub fn load_validated(path: impl AsRef<Path>) -> anyhow::Result<GenerationConfig> {
        let path = path.as_ref();
        let config = Self::load_from(path)?;
        GenerationConfig::from_config(&config, project_dir_of(path)?).map_err(Into::into)
    }
}

/// The project directory is the (absolute) directory containing the config file.
pub fn project_dir_of(config_path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = config_path.canonicalize()
        .context("failed to canonicalize config path")?;
    absolute.parent()
        .ok_or_else(|| anyhow!("config file path '{}' has no parent", absolute.display()))?
        .to_path_buf()
        .pipe(Ok)
}

/// Writes the generated TOML config template file to the given destination or
/// stdout.
pub fn write_template(path: Option<&PathBuf>) -> anyhow::Result<()> {
    use confique::toml::FormatOptions;

    info!(
        "Writing configuration template to '{}'",
        path.map(|p| p.display().to_string()).unwrap_or("<stdout>".into()),
    );

    let mut options = FormatOptions::default();
    options.general.nested_field_gap = 2;
    let template = confique::toml::template::<Config>(options);
    match path {
        Some(path) => fs::write(path, template)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => io::stdout().write_all(template.as_bytes())?,
    }

    Ok(())
}
