//! uv2compdb.
//!
//! Generates a clang compilation database from a Keil µVision project.
//!
//! Pipeline: load project → pick target → resolve toolchain and per-file
//!           arguments → assemble commands → write JSON.

mod cli;
mod config;
mod output;
mod verbose;

use std::process::ExitCode;

use anyhow::{Context, Result, bail, ensure};
use clap::Parser;
use uv2compdb_core::{Options, RenderOptions, Session};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &cli::Cli) -> Result<()> {
    let project = uv2compdb_core::load_project(&cli.project)
        .with_context(|| format!("failed to load {}", cli.project.display()))?;

    let targets: Vec<&str> = project.target_names().collect();
    ensure!(!targets.is_empty(), "no targets found in {}", cli.project.display());
    tracing::debug!("Project has target(s): {targets:?}");

    if cli.list_targets {
        for name in &targets {
            println!("{name}");
        }
        return Ok(());
    }

    let config = config::load(cli.config.as_deref(), &cli.project)?;

    let target = match cli.target.as_ref().or(config.defaults.target.as_ref()) {
        Some(name) if project.target(name).is_some() => name.clone(),
        Some(name) => bail!("target '{name}' not found (available: {})", targets.join(", ")),
        None => {
            let first = targets[0].to_owned();
            tracing::warn!("No target specified, using the first one '{first}'");
            first
        }
    };

    let options = Options {
        trigger_build: cli.build || config.defaults.build.unwrap_or(false),
        predefined_macros: cli.predefined || config.defaults.predefined.unwrap_or(false),
        extra_args: extra_args(cli, &config)?,
        render: RenderOptions {
            define_unescape: match cli.define_unescape {
                Some(mode) => mode,
                None => config.define_unescape()?.unwrap_or_default(),
            },
        },
        search_path: None,
    };

    let mut session = Session::new(&project, options);
    let commands = session.generate(&target)?;
    ensure!(
        !commands.is_empty(),
        "target '{target}' resolved to no source files, nothing written"
    );

    let path = output::resolve_path(cli.output.as_deref().unwrap_or(output::DEFAULT_OUTPUT));
    output::write(&path, &commands)?;

    let shown = std::path::absolute(&path).unwrap_or(path);
    tracing::info!(
        "Generated {} command(s) at {}",
        commands.len(),
        shown.display().to_string().replace('\\', "/")
    );
    Ok(())
}

/// Extra arguments from `-a`, falling back to the configuration file.
fn extra_args(cli: &cli::Cli, config: &config::Config) -> Result<Vec<String>> {
    match &cli.arguments {
        Some(raw) => shlex::split(raw)
            .with_context(|| format!("unbalanced quoting in --arguments: {raw}")),
        None => Ok(config.defaults.arguments.clone()),
    }
}
