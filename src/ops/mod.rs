//! Fold and pop orchestration
//!
//! Both operations run inside a [`transaction`]: the jj operation log and
//! the `patches/` directory are snapshotted first, and any failure restores
//! both before the error is returned.

mod fold;
mod pop;
mod position;
mod transaction;


pub use fold::{FoldOptions, FoldReport, FoldSelection, fold};
pub use pop::{PopOptions, PopReport, PopSelection, pop};
pub use transaction::{RollbackOutcome, TxState};

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::chain::ChainError;
use crate::jj::{JjError, Vcs};
use crate::model::Change;
use crate::quilt::{PatchStore, QuiltError};

/// Errors from fold and pop
#[derive(Error, Debug)]
pub enum OpError {
    #[error("{step}: {source}")]
    Jj {
        step: &'static str,
        #[source]
        source: JjError,
    },

    #[error("{step}: {source}")]
    Quilt {
        step: &'static str,
        #[source]
        source: QuiltError,
    },

    #[error("failed to build patch chain: {0}")]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Store(#[from] QuiltError),

    #[error("{path}: {source}")]
    RootUnresolvable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{root}: not inside repository {repo}")]
    RootOutsideRepository { root: PathBuf, repo: PathBuf },

    #[error("{flag} commit {id} is not a valid base commit (must contain QUAHOG marker)")]
    NotABase { flag: &'static str, id: String },

    #[error("unexpected patch chain base: {0}")]
    UnexpectedBase(String),

    #[error("revset empty: {0}")]
    EmptyRevset(String),

    #[error("--rev length of {requested} greater than patch chain length {available}")]
    RevsetTooLong { requested: usize, available: usize },

    #[error("--rev commits not found at start of patch chain")]
    RevsetNotAtChainStart,

    #[error("--count {requested} greater than patch chain length {available}")]
    CountTooLarge { requested: usize, available: usize },

    #[error("patch commit for {0} is conflicted")]
    PatchConflicted(String),

    #[error("patch commit for {0} is divergent")]
    PatchDivergent(String),

    #[error("[unimplemented] patch commit for {0} has multiple parents")]
    PatchHasMultipleParents(String),

    #[error("commit {0} is not a patch commit")]
    NotAPatch(String),

    #[error("generating patch for {0}: patch contains edits outside root")]
    EditsOutsideRoot(String),

    /// A failure after the rollback point, with what undoing it achieved
    #[error("{error}\n{rollback}")]
    RolledBack {
        error: Box<OpError>,
        rollback: RollbackOutcome,
    },
}

impl OpError {
    /// The error that started it all, looking through a rollback wrapper
    pub fn root_cause(&self) -> &OpError {
        match self {
            Self::RolledBack { error, .. } => error.root_cause(),
            other => other,
        }
    }
}

/// Attach the failing step to a lower-level error
pub(crate) trait StepContext<T> {
    fn step(self, step: &'static str) -> Result<T, OpError>;
}

impl<T> StepContext<T> for Result<T, JjError> {
    fn step(self, step: &'static str) -> Result<T, OpError> {
        self.map_err(|source| OpError::Jj { step, source })
    }
}

impl<T> StepContext<T> for Result<T, QuiltError> {
    fn step(self, step: &'static str) -> Result<T, OpError> {
        self.map_err(|source| OpError::Quilt { step, source })
    }
}

/// A directory holding `patches/`, located inside a jj repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRoot {
    repo_root: PathBuf,
    path: PathBuf,
    rel: String,
}

impl SeriesRoot {
    /// Resolve a user-supplied directory. The patches directory is checked
    /// before jj is consulted.
    pub fn resolve<V: Vcs + ?Sized>(vcs: &V, user_path: &Path) -> Result<Self, OpError> {
        let path = user_path
            .canonicalize()
            .map_err(|source| OpError::RootUnresolvable {
                path: user_path.to_path_buf(),
                source,
            })?;
        PatchStore::open(&path)?;

        let repo = vcs.root().step("failed to determine repository root")?;
        let repo_root = repo
            .canonicalize()
            .map_err(|source| OpError::RootUnresolvable {
                path: repo.clone(),
                source,
            })?;

        Self::new(repo_root, path)
    }

    /// Build from already-absolute paths
    pub fn new(repo_root: PathBuf, path: PathBuf) -> Result<Self, OpError> {
        let rel = path
            .strip_prefix(&repo_root)
            .map_err(|_| OpError::RootOutsideRepository {
                root: path.clone(),
                repo: repo_root.clone(),
            })?
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            repo_root,
            path,
            rel,
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Absolute path of the series root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the repository root with `/` separators, `""` for
    /// the repository root itself
    pub fn rel(&self) -> &str {
        &self.rel
    }

    /// [`SeriesRoot::rel`] for messages, `.` for the repository root
    pub fn display(&self) -> &str {
        if self.rel.is_empty() { "." } else { &self.rel }
    }

    pub fn store(&self) -> Result<PatchStore, OpError> {
        Ok(PatchStore::open(&self.path)?)
    }
}

/// Resolve `rev` and require it to be a base commit
fn require_base<V: Vcs + ?Sized>(
    vcs: &V,
    rev: &str,
    flag: &'static str,
) -> Result<Change, OpError> {
    let change = vcs.change(rev).step("failed to resolve base commit")?;
    if change.is_base() {
        Ok(change)
    } else {
        Err(OpError::NotABase {
            flag,
            id: change.change_id,
        })
    }
}

/// "patch" or "patches"
fn patches(count: usize) -> &'static str {
    if count == 1 { "patch" } else { "patches" }
}
