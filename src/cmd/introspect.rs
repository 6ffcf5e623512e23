use std::{fs, io::Write, path::{Path, PathBuf}};

use graphql_clientgen::{schema::introspection, Config};

use crate::prelude::*;


pub(crate) fn run(mut config: Config, project_dir: &Path, output: Option<&PathBuf>) -> Result<()> {
    config.introspection.enabled = true;
    let config = super::validate(&config, project_dir)?;
    let settings = config.introspection.as_ref()
        .ok_or_else(|| anyhow!("bug: introspection settings missing"))?;

    let payload = introspection::fetch_blocking(settings)?;
    match output {
        Some(path) => {
            fs::write(path, &payload)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!("Wrote schema from '{}' to '{}'", settings.endpoint, path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(payload.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
