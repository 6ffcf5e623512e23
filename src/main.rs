//! The `graphql-clientgen` command line tool.

use std::{env, path::PathBuf};
use clap::{FromArgMatches, CommandFactory};

use graphql_clientgen::{config, logger, version, Config};

use crate::{
    args::{Args, Command},
    prelude::*,
};

mod args;
mod cmd;

mod prelude {
    pub(crate) use anyhow::{anyhow, bail, Context as _, Result};
    pub(crate) use tracing::{error, warn, info, debug, trace};
}


fn main() {
    if let Err(e) = run() {
        // Log error in case stdout is not connected and it is logged into a file.
        error!("{:?}", e);

        // Show a somewhat nice representation of the error
        eprintln!();
        eprintln!();
        bunt::eprintln!("{$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
        eprintln!();
        if e.chain().len() > 1 {
            bunt::eprintln!("{$red+italic}Caused by:{/$}");
        }

        for (i, cause) in e.chain().skip(1).enumerate() {
            eprint!(" {: >1$}", "", i * 2);
            eprintln!("‣ {cause}");
        }

        std::process::exit(1);
    }
}

/// Main entry point.
fn run() -> Result<()> {
    // If `RUST_BACKTRACE` wasn't already set, we default to `1`. Backtraces are
    // almost always useful for debugging.
    if env::var("RUST_BACKTRACE") == Err(env::VarError::NotPresent) {
        env::set_var("RUST_BACKTRACE", "1");
    }

    // Parse CLI args.
    // This is a bit roundabout because we want to override the version
    // using some runtime code.
    let args = Args::from_arg_matches(
        &Args::command()
            .version(version::full())
            .get_matches(),
    )?;

    // Configure output via `bunt`
    bunt::set_stdout_color_choice(args.stdout_color());
    bunt::set_stderr_color_choice(args.stderr_color());


    // Dispatch subcommand.
    match &args.cmd {
        Command::Generate { cargo_directives, shared } => {
            let (config, project_dir) = load_config_and_init_logger(shared, &args)?;
            cmd::generate::run(&config, &project_dir, *cargo_directives)
                .context("GraphQL client generation failed")?;
        }
        Command::Introspect { output, shared } => {
            let (config, project_dir) = load_config_and_init_logger(shared, &args)?;
            cmd::introspect::run(config, &project_dir, output.as_ref())
                .context("failed to introspect schema")?;
        }
        Command::Check { shared } => {
            let (config, project_dir) = load_config_and_init_logger(shared, &args)
                .context("failed to load config: cannot proceed with `check` command")?;
            cmd::check::run(&config, &project_dir)?;
        }
        Command::WriteConfig { target } => config::write_template(target.as_ref())?,
    }

    Ok(())
}

/// Loads the configuration and returns it together with the project
/// directory.
fn load_config_and_init_logger(shared: &args::Shared, args: &Args) -> Result<(Config, PathBuf)> {
    // Load configuration.
    let (config, project_dir, path) = match &shared.config {
        Some(path) => {
            let config = Config::load_from(path)
                .context(format!("failed to load config from '{}'", path.display()))?;
            let project_dir = config::project_dir_of(path)?;
            (config, project_dir, Some(path.clone()))
        }
        None => Config::from_env_or_default_locations()?,
    };

    // Initialize logger. Unfortunately, we can only do this here
    // after reading the config.
    logger::init(&config.log, args.stdout_color())?;
    match path {
        Some(path) => info!("Loaded config from '{}'", path.display()),
        None => info!("No config file found, using defaults"),
    }
    debug!("Project directory: '{}'", project_dir.display());

    Ok((config, project_dir))
}
