use std::path::Path;

use graphql_clientgen::{Config, GenerationConfig};

use crate::prelude::*;

pub(crate) mod check;
pub(crate) mod generate;
pub(crate) mod introspect;


/// Validates the loaded configuration, with relative paths resolved against
/// `project_dir`.
pub(crate) fn validate(config: &Config, project_dir: &Path) -> Result<GenerationConfig> {
    let config = GenerationConfig::from_config(config, project_dir)
        .context("invalid configuration")?;
    trace!("Configuration: {:#?}", config);
    Ok(config)
}
