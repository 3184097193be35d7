//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ops::{FoldOptions, FoldSelection, PopOptions, PopSelection};

/// Move patches between a quilt series and jj patch commits
///
/// Quahog keeps each quilt patch of a `patches/` directory as a jj commit
/// whose description starts with `[PATCH] <name>`, stacked on a base commit
/// marked `QUAHOG`. `pop` turns the last patches of the series into such
/// commits for editing; `fold` writes them back and squashes them into the
/// base.
///
/// EXAMPLES:
///
///   # Edit the last patch of pkg/patches/series as a commit
///   quahog pop --root pkg
///
///   # Write the first patch commit above the base back to pkg/patches
///   quahog fold --root pkg
#[derive(Parser, Debug)]
#[command(name = "quahog")]
#[command(version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the jj repository (defaults to the current directory)
    #[arg(short = 'R', long, global = true, env = "QUAHOG_REPOSITORY")]
    pub repository: Option<PathBuf>,

    /// Log every jj invocation and chain-walk decision
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fold patch commits into quilt patch files
    ///
    /// Converts the first patch commits above the base into patch files,
    /// appends them to the series and squashes the commits into the base.
    Fold(FoldArgs),

    /// Pop quilt patches into patch commits
    ///
    /// Removes the last entries of the series, unapplies them from the
    /// working tree and recreates each one as a patch commit above the base.
    Pop(PopArgs),
}

#[derive(Args, Debug)]
pub struct FoldArgs {
    /// Directory containing the patches/ subdirectory
    #[arg(long)]
    pub root: PathBuf,

    /// Number of patches to fold
    #[arg(long, default_value_t = 1, conflicts_with_all = ["rev", "all"])]
    pub count: usize,

    /// Fold exactly these revisions, which must start the patch chain
    #[arg(long, conflicts_with = "all")]
    pub rev: Option<String>,

    /// Fold every patch in the chain
    #[arg(long)]
    pub all: bool,

    /// Base commit to fold into
    #[arg(long)]
    pub to: Option<String>,
}

impl FoldArgs {
    pub fn options(&self) -> FoldOptions {
        let selection = match (&self.rev, self.all) {
            (Some(revset), _) => FoldSelection::Revset(revset.clone()),
            (None, true) => FoldSelection::All,
            (None, false) => FoldSelection::Count(self.count),
        };
        FoldOptions {
            selection,
            to: self.to.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PopArgs {
    /// Directory containing the patches/ subdirectory
    #[arg(long)]
    pub root: PathBuf,

    /// Number of patches to pop
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pub count: usize,

    /// Pop every patch in the series
    #[arg(long)]
    pub all: bool,

    /// Base commit to pop onto
    #[arg(long)]
    pub from: Option<String>,
}

impl PopArgs {
    pub fn options(&self) -> PopOptions {
        PopOptions {
            selection: if self.all {
                PopSelection::All
            } else {
                PopSelection::Count(self.count)
            },
            from: self.from.clone(),
        }
    }
}
