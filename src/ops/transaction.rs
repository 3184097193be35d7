//! Snapshot-and-restore frame around a fold or pop
//!
//! ```text
//! Idle → ChainBuilt → Mutating → Committed
//!   └───────┴────────────┴─────→ RolledBack
//! ```
//!
//! Rollback restores the `patches/` directory first and then the jj
//! operation log, so jj's working-copy snapshot during `op restore` already
//! sees the original patch files.

use std::fmt;

use tracing::{debug, info, warn};

use super::{OpError, StepContext};
use crate::jj::Vcs;
use crate::model::OperationId;
use crate::quilt::{PatchStore, StoreCheckpoint};

/// Where an operation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    ChainBuilt,
    Mutating,
    Committed,
    RolledBack,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ChainBuilt => "chain-built",
            Self::Mutating => "mutating",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
        };
        f.write_str(name)
    }
}

/// Result of undoing a failed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// Nothing had been modified yet
    Unchanged,
    /// Repository restored to the snapshot operation
    Restored(OperationId),
    /// Restoring failed; the repository may be left half-modified
    Failed(String),
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "rollback: nothing to roll back"),
            Self::Restored(op) => write!(f, "rollback: restored operation {op}"),
            Self::Failed(reason) => write!(f, "rollback: failed: {reason}"),
        }
    }
}

pub(crate) struct Transaction<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    store: &'a PatchStore,
    snapshot: OperationId,
    checkpoint: Option<StoreCheckpoint>,
    state: TxState,
}

impl<'a, V: Vcs + ?Sized> Transaction<'a, V> {
    /// Record the current jj operation as the rollback point
    pub fn begin(vcs: &'a V, store: &'a PatchStore) -> Result<Self, OpError> {
        let snapshot = vcs
            .current_operation()
            .step("failed to determine base op")?;
        debug!(op = %snapshot, "recorded rollback point");
        Ok(Self {
            vcs,
            store,
            snapshot,
            checkpoint: None,
            state: TxState::Idle,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> TxState {
        self.state
    }

    fn transition(&mut self, next: TxState) {
        debug!(from = %self.state, to = %next, "transaction state");
        self.state = next;
    }

    pub fn chain_built(&mut self) {
        self.transition(TxState::ChainBuilt);
    }

    /// Save `patches/` and enter [`TxState::Mutating`]. Call right before
    /// the first write.
    pub fn start_mutating(&mut self) -> Result<(), OpError> {
        let checkpoint = self
            .store
            .checkpoint()
            .step("failed to snapshot patches directory")?;
        self.checkpoint = Some(checkpoint);
        self.transition(TxState::Mutating);
        Ok(())
    }

    pub fn commit(mut self) {
        self.transition(TxState::Committed);
    }

    /// Finish without applying anything, undoing side effects of chain
    /// discovery such as a created base commit
    pub fn abandon(mut self) -> RollbackOutcome {
        let outcome = self.restore();
        if let RollbackOutcome::Failed(reason) = &outcome {
            warn!("failed to restore repository: {reason}");
        }
        outcome
    }

    /// Undo everything since [`Transaction::begin`] and attach the outcome
    /// to `error`
    pub fn rollback(mut self, error: OpError) -> OpError {
        info!("encountered error, rolling back");
        let rollback = self.restore();
        match &rollback {
            RollbackOutcome::Failed(reason) => warn!("rollback failed: {reason}"),
            outcome => debug!(%outcome, "rollback finished"),
        }
        OpError::RolledBack {
            error: Box::new(error),
            rollback,
        }
    }

    fn restore(&mut self) -> RollbackOutcome {
        let mut failures = Vec::new();

        if let Some(checkpoint) = self.checkpoint.take()
            && let Err(e) = self.store.restore(&checkpoint)
        {
            failures.push(format!("restoring patches directory: {e}"));
        }

        let moved = self
            .vcs
            .current_operation()
            .map_or(true, |current| current != self.snapshot);
        let must_restore = moved || self.state == TxState::Mutating;
        self.transition(TxState::RolledBack);

        if !must_restore && failures.is_empty() {
            return RollbackOutcome::Unchanged;
        }
        if must_restore && let Err(e) = self.vcs.op_restore(&self.snapshot) {
            failures.push(format!("restoring operation {}: {e}", self.snapshot));
        }

        if failures.is_empty() {
            RollbackOutcome::Restored(self.snapshot.clone())
        } else {
            RollbackOutcome::Failed(failures.join("; "))
        }
    }
}
