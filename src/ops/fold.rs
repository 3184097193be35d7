//! Fold: patch commits → patch files squashed into the base

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::position::Cursor;
use super::transaction::Transaction;
use super::{OpError, SeriesRoot, StepContext, patches, require_base};
use crate::chain::{ChainOptions, PatchChain, build_chain};
use crate::jj::Vcs;
use crate::model::Change;
use crate::quilt::{PatchStore, check_patch_name, format_git_diff};

/// Which patch commits to fold, counted from the base
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldSelection {
    /// The first `n` patches of the chain
    Count(usize),
    /// Exactly the commits of a revset, which must start the chain
    Revset(String),
    /// The whole chain
    All,
}

impl Default for FoldSelection {
    fn default() -> Self {
        Self::Count(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FoldOptions {
    pub selection: FoldSelection,
    /// Base commit the chain must be anchored on
    pub to: Option<String>,
}

/// What a fold did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldReport {
    /// Patch files written, in series order
    pub written: Vec<String>,
    /// Selected patches skipped because their commit was empty
    pub skipped: Vec<String>,
    /// Base commit the patch commits were squashed into
    pub base: Option<String>,
}

impl FoldReport {
    /// Number of patch commits squashed into the base
    pub fn folded(&self) -> usize {
        self.written.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folded() == 0
    }
}

/// Fold leading patch commits of the chain around `@` (or `--to`/`--rev`)
/// into `root`'s series.
///
/// Any failure after the rollback point is recorded restores the
/// repository and the `patches/` directory before returning.
pub fn fold<V: Vcs + ?Sized>(
    vcs: &V,
    root: &SeriesRoot,
    opts: &FoldOptions,
) -> Result<FoldReport, OpError> {
    let store = root.store()?;
    let cursor = Cursor::capture(vcs)?;

    let to = opts
        .to
        .as_deref()
        .map(|rev| require_base(vcs, rev, "--to"))
        .transpose()?;
    let revs = match &opts.selection {
        FoldSelection::Revset(revset) => {
            let revs = vcs.changes(revset).step("failed to resolve --rev")?;
            if revs.is_empty() {
                return Err(OpError::EmptyRevset(revset.clone()));
            }
            Some(revs)
        }
        _ => None,
    };

    // Start from the revision closest to the base
    let origin = match (&to, &revs) {
        (Some(base), _) => base.change_id.clone(),
        (None, Some(revs)) => revs
            .last()
            .map_or_else(|| cursor.origin_id().to_string(), |c| c.change_id.clone()),
        (None, None) => cursor.origin_id().to_string(),
    };

    let run = FoldRun {
        vcs,
        store: &store,
        root,
        cursor: &cursor,
        to: to.as_ref(),
        revs: revs.as_deref(),
        selection: &opts.selection,
    };

    let mut tx = Transaction::begin(vcs, &store)?;
    match run.execute(&origin, &mut tx) {
        Ok(report) if report.is_empty() => {
            info!("No patches to fold");
            tx.abandon();
            Ok(report)
        }
        Ok(report) => {
            tx.commit();
            Ok(report)
        }
        Err(e) => Err(tx.rollback(e)),
    }
}

struct FoldRun<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    store: &'a PatchStore,
    root: &'a SeriesRoot,
    cursor: &'a Cursor,
    to: Option<&'a Change>,
    revs: Option<&'a [Change]>,
    selection: &'a FoldSelection,
}

impl<V: Vcs + ?Sized> FoldRun<'_, V> {
    fn execute(&self, origin: &str, tx: &mut Transaction<'_, V>) -> Result<FoldReport, OpError> {
        let chain = build_chain(self.vcs, &ChainOptions::new(origin, self.root.rel()))?;
        tx.chain_built();

        if let Some(to) = self.to
            && to.change_id != chain.base.change_id
        {
            return Err(OpError::UnexpectedBase(chain.base.change_id.clone()));
        }

        let count = self.selected_count(&chain)?;
        let mut report = FoldReport {
            base: Some(chain.base.change_id.clone()),
            ..Default::default()
        };
        if count == 0 {
            return Ok(report);
        }

        let commits = &chain.patches[..count];
        info!(
            "Folding {} {} into \"{}\"",
            commits.len(),
            patches(commits.len()),
            self.root.display()
        );

        let mut names = Vec::with_capacity(commits.len());
        let mut contents = Vec::with_capacity(commits.len());
        for commit in commits {
            match patch_file(self.vcs, commit, self.root.rel())? {
                PatchFile::Written { name, content } => {
                    names.push(name);
                    contents.push(content);
                }
                PatchFile::Skipped { name } => report.skipped.push(name),
            }
        }

        tx.start_mutating()?;
        self.store
            .write_patches(&names, &contents)
            .step("failed to write patch files")?;

        let ids: Vec<&str> = commits.iter().map(|c| c.change_id.as_str()).collect();
        self.vcs
            .squash_into(&ids, &chain.base.change_id)
            .step("failed to squash commits")?;
        self.cursor
            .restore_after_fold(self.vcs, &chain.base, &ids)?;

        report.written = names;
        info!(
            "Successfully folded {} {}",
            report.folded(),
            patches(report.folded())
        );
        Ok(report)
    }

    fn selected_count(&self, chain: &PatchChain) -> Result<usize, OpError> {
        let available = chain.patches.len();
        if let Some(revs) = self.revs {
            if revs.len() > available {
                return Err(OpError::RevsetTooLong {
                    requested: revs.len(),
                    available,
                });
            }
            // jj lists the revset newest first, the chain is oldest first
            let wanted: HashSet<&str> = revs.iter().map(|c| c.change_id.as_str()).collect();
            let leading: HashSet<&str> = chain.patch_ids()[..revs.len()].iter().copied().collect();
            if wanted != leading {
                return Err(OpError::RevsetNotAtChainStart);
            }
            return Ok(revs.len());
        }

        match *self.selection {
            FoldSelection::All => Ok(available),
            FoldSelection::Count(requested) if requested > available => {
                Err(OpError::CountTooLarge {
                    requested,
                    available,
                })
            }
            FoldSelection::Count(requested) => Ok(requested),
            // Handled through `self.revs`
            FoldSelection::Revset(_) => Ok(0),
        }
    }
}

enum PatchFile {
    Written { name: String, content: String },
    Skipped { name: String },
}

/// Turn one patch commit into the content of its patch file
fn patch_file<V: Vcs + ?Sized>(
    vcs: &V,
    commit: &Change,
    root_rel: &str,
) -> Result<PatchFile, OpError> {
    let meta = commit
        .kind
        .as_patch()
        .ok_or_else(|| OpError::NotAPatch(commit.change_id.clone()))?;
    let name = meta.name.clone();
    check_patch_name(&name)?;

    if commit.has_conflict {
        return Err(OpError::PatchConflicted(name));
    }
    if commit.is_divergent {
        return Err(OpError::PatchDivergent(name));
    }
    if commit.is_empty {
        warn!("patch {name} is empty. excluding from series");
        return Ok(PatchFile::Skipped { name });
    }
    // Changes merged in from another parent can shift hunk positions without
    // conflicting, which the patch file could not express
    if commit.parents.len() > 1 {
        return Err(OpError::PatchHasMultipleParents(name));
    }

    let step = "failed to generate diff";
    let whole = vcs.git_diff(&commit.change_id, None).step(step)?;
    let scoped = if root_rel.is_empty() {
        whole.clone()
    } else {
        vcs.git_diff(&commit.change_id, Some(root_rel)).step(step)?
    };
    if whole != scoped {
        return Err(OpError::EditsOutsideRoot(name));
    }

    let mut content = String::new();
    if !meta.description.is_empty() {
        content.push_str(meta.description.trim_end_matches('\n'));
        content.push_str("\n\n");
    }
    content.push_str(&format_git_diff(&scoped, root_rel));
    debug!(patch = %name, bytes = content.len(), "generated patch");

    Ok(PatchFile::Written { name, content })
}
