//! This module defines the command line arguments `graphql-clientgen` accepts.

use std::{io::IsTerminal, path::PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use termcolor::ColorChoice;


#[derive(Debug, Parser)]
#[command(about = "Generates typed GraphQL client code from a schema and query documents.")]
pub(crate) struct Args {
    /// Whether to use colors in the output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub(crate) color: ColorMode,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Resolves the schema, collects all query documents and runs the
    /// external code generator.
    Generate {
        /// Print `cargo:` directives for the generated sources and all
        /// inputs. Use this when calling this tool from a build script.
        #[arg(long)]
        cargo_directives: bool,

        #[command(flatten)]
        shared: Shared,
    },

    /// Fetches the schema from the configured endpoint via introspection,
    /// even if `introspection.enabled` is `false`.
    Introspect {
        /// Target file. If not specified, the schema is written to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        shared: Shared,
    },

    /// Checks the configuration, the schema, the query documents and the
    /// generator without generating anything. Exits with 0 if everything is
    /// Ok, and with 1 otherwise.
    Check {
        #[command(flatten)]
        shared: Shared,
    },

    /// Outputs a template for the configuration file (which includes
    /// descriptions of all options).
    WriteConfig {
        /// Target file. If not specified, the template is written to stdout.
        target: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
pub(crate) struct Shared {
    /// Path to the configuration file. If this is not specified, the path in
    /// `GRAPHQL_CLIENTGEN_CONFIG` or `graphql-clientgen.toml` in the current
    /// directory is used.
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ColorMode {
    /// Use colors if the output is a terminal.
    Auto,
    Always,
    Never,
}

impl Args {
    pub(crate) fn stdout_color(&self) -> ColorChoice {
        self.color_choice(std::io::stdout().is_terminal())
    }

    pub(crate) fn stderr_color(&self) -> ColorChoice {
        self.color_choice(std::io::stderr().is_terminal())
    }

    fn color_choice(&self, is_terminal: bool) -> ColorChoice {
        match self.color {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if is_terminal => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}
