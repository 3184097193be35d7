//! jj command execution layer
//!
//! This module handles executing jj commands and parsing their output.

pub mod constants;
mod executor;
#[cfg(test)]
pub(crate) mod fake;
/// Parser module (public for integration testing)
pub mod parser;
mod template;
mod vcs;

pub use executor::JjExecutor;
pub use vcs::Vcs;

use std::io;
use thiserror::Error;

/// Errors that can occur when executing jj commands
#[derive(Error, Debug)]
pub enum JjError {
    #[error("Not a jj repository")]
    NotARepository,

    #[error("jj command failed: jj {command} (exit code {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        stderr: String,
        exit_code: i32,
    },

    #[error("Failed to parse jj output: {0}")]
    ParseError(String),

    #[error("Expected exactly one change for revset {revset}, got {count}")]
    NotExactlyOne { revset: String, count: usize },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("jj is not installed or not in PATH")]
    JjNotFound,
}
