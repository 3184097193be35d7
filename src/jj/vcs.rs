//! Capability surface the patch-chain engine needs from a VCS
//!
//! [`JjExecutor`](super::JjExecutor) implements it against a real `jj`
//! binary; tests substitute an in-memory graph.

use std::path::PathBuf;

use super::JjError;
use crate::model::{Change, OperationId};

/// Operations on a jj repository used by chain discovery, fold and pop
pub trait Vcs {
    /// Absolute repository root
    fn root(&self) -> Result<PathBuf, JjError>;

    /// Metadata for every change matched by `revset`, newest first
    fn changes(&self, revset: &str) -> Result<Vec<Change>, JjError>;

    /// Metadata for the single change matched by `revset`
    fn change(&self, revset: &str) -> Result<Change, JjError> {
        let mut changes = self.changes(revset)?;
        if changes.len() != 1 {
            return Err(JjError::NotExactlyOne {
                revset: revset.to_string(),
                count: changes.len(),
            });
        }
        Ok(changes.remove(0))
    }

    /// Git-style diff of one change, optionally limited to a
    /// repository-relative path
    fn git_diff(&self, change_id: &str, path: Option<&str>) -> Result<String, JjError>;

    /// Move the content of `sources` into `destination`, keeping the
    /// destination's description
    fn squash_into(&self, sources: &[&str], destination: &str) -> Result<(), JjError>;

    /// Create a new working-copy change on top of `parent`
    fn new_on(&self, parent: &str, message: Option<&str>) -> Result<(), JjError>;

    /// Create a new working-copy change between `before` and its parents
    fn new_before(&self, before: &str, message: &str) -> Result<(), JjError>;

    /// Make `rev` the working-copy change
    fn edit(&self, rev: &str) -> Result<(), JjError>;

    /// Move the single change `rev` between `before` and its parents
    fn rebase_before(&self, rev: &str, before: &str) -> Result<(), JjError>;

    /// Describe the working-copy change and start a new one on top of it
    fn commit(&self, message: &str) -> Result<(), JjError>;

    /// Id of the latest operation in the operation log
    fn current_operation(&self) -> Result<OperationId, JjError>;

    /// Restore the repository to the state recorded by `op`
    fn op_restore(&self, op: &OperationId) -> Result<(), JjError>;
}
