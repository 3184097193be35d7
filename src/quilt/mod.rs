//! Quilt patch series on disk
//!
//! - [`PatchStore`]: the `patches/` directory and its `series` manifest
//! - [`format_git_diff`]: rewrite jj's git-style diff into quilt's layout
//! - [`PatchApplier`]: apply a patch (or its reverse) to the working tree

pub(crate) mod apply;
mod format;
mod store;

pub use apply::{GitApply, PatchApplier};
pub use format::format_git_diff;
pub use store::{PatchStore, StoreCheckpoint, check_patch_name, split_description};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Directory holding patch files, relative to the series root
pub const PATCHES_DIR: &str = "patches";

/// Manifest listing patches in application order
pub const SERIES_FILE: &str = "series";

/// Errors from the patch store and patch application
#[derive(Error, Debug)]
pub enum QuiltError {
    #[error("{0}: does not contain patches/ subdirectory")]
    MissingPatchesDir(PathBuf),

    #[error("{0}: no such file")]
    MissingSeries(PathBuf),

    #[error("invalid patch name {0:?}: must be a relative path inside patches/")]
    InvalidName(String),

    #[error("patch names and contents differ in length ({names} vs {contents})")]
    MismatchedBatch { names: usize, contents: usize },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to {action} patch: {stderr}")]
    ApplyFailed { action: &'static str, stderr: String },

    #[error("git is not installed or not in PATH")]
    GitNotFound,
}

impl QuiltError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
