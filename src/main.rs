//! Quahog - quilt patch series as Jujutsu commits
//!
//! Binary entry point for the command-line tool.

use clap::Parser;

use quahog::cli::{Cli, Commands};
use quahog::jj::JjExecutor;
use quahog::ops::{self, SeriesRoot};
use quahog::quilt::GitApply;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    quahog::logging::init(cli.verbose);
    run(cli)
}

/// Dispatch a parsed command line
fn run(cli: Cli) -> color_eyre::Result<()> {
    let jj = match cli.repository {
        Some(path) => JjExecutor::with_repo_path(path),
        None => JjExecutor::new(),
    };

    match cli.command {
        Commands::Fold(args) => {
            let root = SeriesRoot::resolve(&jj, &args.root)?;
            ops::fold(&jj, &root, &args.options())?;
        }
        Commands::Pop(args) => {
            let root = SeriesRoot::resolve(&jj, &args.root)?;
            let applier = GitApply::new(root.repo_root(), root.rel());
            ops::pop(&jj, &applier, &root, &args.options())?;
        }
    }
    Ok(())
}
