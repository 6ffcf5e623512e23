use std::path::Path;

use graphql_clientgen::{
    generate::InvocationResult, CargoHost, Config, GeneratorMode, Orchestrator, Outcome, SourceRoots,
};

use crate::prelude::*;


pub(crate) fn run(config: &Config, project_dir: &Path, cargo_directives: bool) -> Result<()> {
    let config = super::validate(config, project_dir)?;
    if config.generator.mode == GeneratorMode::InProcess {
        bail!("generator mode 'in-process' is only available when using graphql-clientgen \
            as a library. Use mode 'process' with the command line tool.");
    }

    let orchestrator = Orchestrator::new(config);
    let mut roots = SourceRoots::default();
    let outcome = if cargo_directives {
        orchestrator.run(&mut CargoHost::stdout())?
    } else {
        orchestrator.run(&mut roots)?
    };

    let sources = match outcome {
        Outcome::Skipped => {
            debug!("Generation was skipped");
            return Ok(());
        }
        Outcome::Completed(sources) => sources,
    };
    debug!(
        "Compiled {} query documents in {:.2?}",
        sources.query_documents,
        sources.invocation.elapsed,
    );

    // Stdout carries the cargo directives in that mode.
    let ir = sources.invocation.compiled_ir.as_ref();
    if cargo_directives {
        if let Some(ir) = ir {
            info!("Compiled IR written to '{}'", ir.display());
        }
        return Ok(());
    }

    if let Some(ir) = ir {
        bunt::println!("{$green}Compiled IR:{/$} {[bold]}", ir.display());
    }
    for root in roots.roots() {
        bunt::println!("{[green]} {[bold]}", source_root_label(&sources.invocation), root.display());
    }

    Ok(())
}

/// Without a native generator (always the case for the command line tool),
/// nothing is written into the source root.
fn source_root_label(invocation: &InvocationResult) -> &'static str {
    if invocation.generator_called {
        "Generated sources:"
    } else {
        "Registered source root (empty, no native generator attached):"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn invocation(generator_called: bool) -> InvocationResult {
        InvocationResult {
            mode: GeneratorMode::Process,
            exit_status: None,
            compiled_ir: Some("target/graphql-schema/ir.json".into()),
            operations: 2,
            generator_called,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn empty_source_root_is_not_reported_as_generated() {
        assert!(source_root_label(&invocation(false)).contains("empty"));
        assert_eq!(source_root_label(&invocation(true)), "Generated sources:");
    }
}
