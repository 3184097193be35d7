//! jj command executor
//!
//! Handles running jj commands and capturing their output.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use super::constants::{self, commands, errors, flags, revsets};
use super::parser::Parser;
use super::template::Templates;
use super::{JjError, Vcs};
use crate::model::{Change, OperationId};

/// Executor for jj commands
#[derive(Debug, Clone)]
pub struct JjExecutor {
    /// Path to the repository (None = current directory)
    repo_path: Option<PathBuf>,
}

impl Default for JjExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl JjExecutor {
    /// Create a new executor for the current directory
    pub fn new() -> Self {
        Self { repo_path: None }
    }

    /// Create a new executor for a specific repository path
    pub fn with_repo_path(path: PathBuf) -> Self {
        Self {
            repo_path: Some(path),
        }
    }

    /// Run a jj command with the given arguments
    ///
    /// Automatically adds `--color=never` to ensure parseable output.
    pub fn run(&self, args: &[&str]) -> Result<String, JjError> {
        let mut cmd = Command::new(constants::JJ_COMMAND);

        // Add repository path if specified
        if let Some(ref path) = self.repo_path {
            cmd.arg(flags::REPO_PATH).arg(path);
        }

        // Always disable color for parsing
        cmd.arg(flags::NO_COLOR);

        // Add user-specified arguments
        cmd.args(args);

        debug!(args = ?args, "running jj");

        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JjError::JjNotFound
            } else {
                JjError::IoError(e)
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let exit_code = output.status.code().unwrap_or(-1);

            // Check for common error patterns
            if stderr.contains(errors::NOT_A_REPO) {
                return Err(JjError::NotARepository);
            }

            Err(JjError::CommandFailed {
                command: args.join(" "),
                stderr: stderr.trim_end().to_string(),
                exit_code,
            })
        }
    }
}

/// Fileset matching everything under a repository-relative path
fn root_fileset(path: &str) -> String {
    let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
    format!("root:\"{escaped}\"")
}

impl Vcs for JjExecutor {
    fn root(&self) -> Result<PathBuf, JjError> {
        let output = self.run(&[commands::ROOT])?;
        Ok(PathBuf::from(output.trim_end_matches(['\r', '\n'])))
    }

    fn changes(&self, revset: &str) -> Result<Vec<Change>, JjError> {
        let output = self.run(&[
            commands::LOG,
            flags::NO_GRAPH,
            flags::TEMPLATE,
            Templates::change(),
            flags::REVISION,
            revset,
        ])?;
        Parser::parse_changes(&output)
    }

    fn git_diff(&self, change_id: &str, path: Option<&str>) -> Result<String, JjError> {
        let mut args = vec![commands::DIFF, flags::GIT, flags::REVISION, change_id];
        let fileset = path.map(root_fileset);
        if let Some(ref fileset) = fileset {
            args.push(flags::END_OF_OPTIONS);
            args.push(fileset.as_str());
        }
        self.run(&args)
    }

    fn squash_into(&self, sources: &[&str], destination: &str) -> Result<(), JjError> {
        if sources.is_empty() {
            return Ok(());
        }
        let from = revsets::any_of(sources);
        self.run(&[
            commands::SQUASH,
            flags::USE_DESTINATION_MESSAGE,
            flags::INTO,
            destination,
            flags::FROM,
            from.as_str(),
        ])?;
        Ok(())
    }

    fn new_on(&self, parent: &str, message: Option<&str>) -> Result<(), JjError> {
        let mut args = vec![commands::NEW, parent];
        if let Some(message) = message {
            args.push(flags::MESSAGE);
            args.push(message);
        }
        self.run(&args)?;
        Ok(())
    }

    fn new_before(&self, before: &str, message: &str) -> Result<(), JjError> {
        self.run(&[
            commands::NEW,
            flags::MESSAGE,
            message,
            flags::INSERT_BEFORE,
            before,
        ])?;
        Ok(())
    }

    fn edit(&self, rev: &str) -> Result<(), JjError> {
        self.run(&[commands::EDIT, rev])?;
        Ok(())
    }

    fn rebase_before(&self, rev: &str, before: &str) -> Result<(), JjError> {
        self.run(&[
            commands::REBASE,
            flags::REVISION,
            rev,
            flags::INSERT_BEFORE,
            before,
        ])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), JjError> {
        self.run(&[commands::COMMIT, flags::MESSAGE, message])?;
        Ok(())
    }

    fn current_operation(&self) -> Result<OperationId, JjError> {
        let output = self.run(&[
            commands::OP,
            commands::OP_LOG,
            flags::NO_GRAPH,
            flags::TEMPLATE,
            Templates::op_id(),
            flags::LIMIT,
            "1",
        ])?;
        Parser::parse_op_id(&output)
    }

    fn op_restore(&self, op: &OperationId) -> Result<(), JjError> {
        self.run(&[commands::OP, commands::OP_RESTORE, op.as_str()])?;
        Ok(())
    }
}
