//! Applying patches to the working tree with `git apply`

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use super::QuiltError;

/// Applies a quilt patch body (paths relative to the series root) to the
/// working tree
pub trait PatchApplier {
    /// Apply `diff` forward
    fn apply(&self, diff: &str) -> Result<(), QuiltError>;

    /// Undo `diff`
    fn apply_reverse(&self, diff: &str) -> Result<(), QuiltError>;
}

/// [`PatchApplier`] backed by `git apply`
///
/// Runs from the repository root with `--directory <series root>`, so
/// quilt's root-relative `a/`/`b/` paths land under the series root.
#[derive(Debug, Clone)]
pub struct GitApply {
    repo_root: PathBuf,
    directory: String,
}

impl GitApply {
    /// `directory` is the series root relative to `repo_root` (`""` for the
    /// repository root)
    pub fn new(repo_root: impl Into<PathBuf>, directory: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            directory: directory.into(),
        }
    }

    fn run(&self, diff: &str, reverse: bool) -> Result<(), QuiltError> {
        let mut cmd = Command::new("git");
        cmd.arg("apply");
        if reverse {
            cmd.arg("--reverse");
        }
        if !self.directory.is_empty() && self.directory != "." {
            cmd.arg(format!("--directory={}", self.directory));
        }
        cmd.arg("-")
            .current_dir(&self.repo_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(reverse, directory = %self.directory, "running git apply");

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QuiltError::GitNotFound
            } else {
                QuiltError::io(&self.repo_root)(e)
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(diff.as_bytes())
                .map_err(QuiltError::io(&self.repo_root))?;
        }

        let output = child
            .wait_with_output()
            .map_err(QuiltError::io(&self.repo_root))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(QuiltError::ApplyFailed {
                action: if reverse { "reverse" } else { "apply" },
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            })
        }
    }
}

impl PatchApplier for GitApply {
    fn apply(&self, diff: &str) -> Result<(), QuiltError> {
        self.run(diff, false)
    }

    fn apply_reverse(&self, diff: &str) -> Result<(), QuiltError> {
        self.run(diff, true)
    }
}
