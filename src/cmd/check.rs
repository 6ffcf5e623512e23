//! A subcommand verifying everything that can be verified without running
//! the generator. Useful in CI, as it reports all problems at once instead of
//! stopping at the first one.

use std::path::Path;

use graphql_clientgen::{
    generate::{self, RuntimeBundle}, queries, schema, Config, GenerationConfig, GeneratorMode,
};

use crate::prelude::*;


pub(crate) fn run(config: &Config, project_dir: &Path) -> Result<()> {
    info!("Starting to verify various things...");
    let validated = super::validate(config, project_dir);
    let (schema, queries, generator) = match &validated {
        Ok(config) => (check_schema(config), check_queries(config), check_generator(config)),
        Err(_) => {
            let skipped = || Err(anyhow!("skipped due to invalid configuration"));
            (skipped(), skipped(), skipped())
        }
    };
    info!("Done verifying various things");


    // Print summary after all log output
    let mut any_errors = false;
    println!();
    bunt::println!("{$bold+blue+intense}Summary{/$}");
    println!();
    print_outcome(&mut any_errors, "Load configuration", &validated);
    print_outcome(&mut any_errors, "Schema", &schema);
    print_outcome(&mut any_errors, "Query documents", &queries);
    print_outcome(&mut any_errors, "Code generator", &generator);

    println!();
    if any_errors {
        bunt::println!("{$red+intense}➡  Errors have occured!{/$}");
        std::process::exit(1);
    } else {
        bunt::println!("{$green+intense}⮕  Everything OK{/$} \
            {$dimmed}(generation will probably work in this environment){/$}");
        println!("   ");
        Ok(())
    }
}

fn print_outcome<T>(any_errors: &mut bool, label: &str, result: &Result<T>) {
    match result {
        Ok(_) => {
            bunt::println!(" ▸ {[bold+intense]}  {$green+bold}✔ ok{/$}", label);
        }
        Err(e) => {
            *any_errors = true;
            bunt::println!(" ▸ {[bold+intense]}  {$red+bold}✘ error{/$}", label);
            bunt::println!("      {$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
            println!();
            if e.chain().len() > 1 {
                bunt::println!("      {$red+italic}Caused by:{/$}");
            }

            for (i, cause) in e.chain().skip(1).enumerate() {
                print!("       {: >1$}", "", i * 2);
                println!("‣ {cause}");
            }
            println!();
        }
    }
}

fn check_schema(config: &GenerationConfig) -> Result<()> {
    // With introspection, this actually talks to the endpoint. The schema is
    // not persisted though.
    let mut config = config.clone();
    if let Some(settings) = &mut config.introspection {
        settings.persist = false;
    }

    let schema = schema::resolve(&config)?;
    let text = schema.text()?;
    let json: serde_json::Value = serde_json::from_str(&text).context("schema is not valid JSON")?;
    if schema::schema_root(&json).is_none() {
        bail!("schema does not contain a `__schema` object");
    }

    Ok(())
}

fn check_queries(config: &GenerationConfig) -> Result<()> {
    let queries = queries::collect(&config.query_dir)?;
    debug!("Found {} query documents", queries.len());
    Ok(())
}

fn check_generator(config: &GenerationConfig) -> Result<()> {
    if config.generator.mode == GeneratorMode::InProcess {
        bail!("generator mode 'in-process' cannot be used with the command line tool");
    }

    let interpreter = generate::find_interpreter(&config.generator)?;
    debug!("Found interpreter '{}'", interpreter.display());

    // Not extracting the embedded runtime here, `check` must not modify
    // anything.
    match &config.generator.script {
        Some(script) if !script.is_file() => {
            bail!("generator script '{}' does not exist", script.display());
        }
        Some(_) => {}
        None => {
            let bundle = RuntimeBundle::embedded()?;
            if !bundle.contains_entry() {
                bail!(
                    "the embedded generator runtime does not contain its entry script \
                        '{}', configure `generator.script`",
                    bundle.manifest().entry,
                );
            }
        }
    }

    Ok(())
}
