//! Pop: trailing series entries → patch commits above the base

use tracing::{debug, info};

use super::position::Cursor;
use super::transaction::Transaction;
use super::{OpError, SeriesRoot, StepContext, patches, require_base};
use crate::chain::{ChainOptions, build_chain};
use crate::jj::Vcs;
use crate::jj::constants::revsets;
use crate::model::{Change, PatchMeta};
use crate::quilt::{PatchApplier, PatchStore};

/// Which series entries to pop, counted from the end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopSelection {
    /// The last `n` entries; more than the series holds pops everything
    Count(usize),
    All,
}

impl Default for PopSelection {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl PopSelection {
    fn limit(self) -> Option<usize> {
        match self {
            Self::Count(n) => Some(n),
            Self::All => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PopOptions {
    pub selection: PopSelection,
    /// Base commit the chain must be anchored on
    pub from: Option<String>,
}

/// What a pop did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopReport {
    /// Patches turned back into commits, in series order
    pub popped: Vec<String>,
    /// Base commit the new patch commits sit on
    pub base: Option<String>,
}

/// A patch file read back from the store
struct Popped {
    name: String,
    diff: String,
    description: String,
}

/// Pop trailing patches of `root`'s series back into patch commits.
///
/// Patches are unapplied newest first, then recreated oldest first directly
/// above the base, ahead of any patch commits already in the chain.
pub fn pop<V, A>(
    vcs: &V,
    applier: &A,
    root: &SeriesRoot,
    opts: &PopOptions,
) -> Result<PopReport, OpError>
where
    V: Vcs + ?Sized,
    A: PatchApplier + ?Sized,
{
    let store = root.store()?;
    store.require_series()?;
    let cursor = Cursor::capture(vcs)?;

    let from = opts
        .from
        .as_deref()
        .map(|rev| require_base(vcs, rev, "--from"))
        .transpose()?;

    let selected = store
        .select_tail(opts.selection.limit())
        .step("failed to get patches to pop")?;
    if selected.is_empty() {
        info!("No patches to pop");
        return Ok(PopReport::default());
    }

    let origin = from
        .as_ref()
        .map_or_else(|| cursor.origin_id().to_string(), |base| base.change_id.clone());

    let run = PopRun {
        vcs,
        applier,
        store: &store,
        root,
        cursor: &cursor,
        from: from.as_ref(),
    };

    let mut tx = Transaction::begin(vcs, &store)?;
    match run.execute(&origin, &selected, &mut tx) {
        Ok(report) => {
            tx.commit();
            Ok(report)
        }
        Err(e) => Err(tx.rollback(e)),
    }
}

struct PopRun<'a, V: Vcs + ?Sized, A: PatchApplier + ?Sized> {
    vcs: &'a V,
    applier: &'a A,
    store: &'a PatchStore,
    root: &'a SeriesRoot,
    cursor: &'a Cursor,
    from: Option<&'a Change>,
}

impl<V: Vcs + ?Sized, A: PatchApplier + ?Sized> PopRun<'_, V, A> {
    fn execute(
        &self,
        origin: &str,
        selected: &[String],
        tx: &mut Transaction<'_, V>,
    ) -> Result<PopReport, OpError> {
        let chain = build_chain(self.vcs, &ChainOptions::new(origin, self.root.rel()))?;
        tx.chain_built();

        if let Some(from) = self.from
            && from.change_id != chain.base.change_id
        {
            return Err(OpError::UnexpectedBase(chain.base.change_id.clone()));
        }

        info!(
            "Popping {} {} from \"{}\"",
            selected.len(),
            patches(selected.len()),
            self.root.display()
        );
        tx.start_mutating()?;

        // Unapply newest first; the working copy is the base here
        let mut popped = Vec::with_capacity(selected.len());
        for name in selected.iter().rev() {
            let (diff, description) = self
                .store
                .read_patch(name)
                .step("failed to read patch")?;
            self.applier
                .apply_reverse(&diff)
                .step("failed to reverse patch")?;
            self.store
                .remove_patch(name)
                .step("failed to remove patch")?;
            info!("Popping patch \"{name}\"");
            popped.push(Popped {
                name: name.clone(),
                diff,
                description,
            });
        }
        popped.reverse();

        self.vcs
            .new_on(&chain.base.change_id, None)
            .step("failed to create patch commit")?;

        // Recreate oldest first, each directly below the existing patches
        let first_remaining = chain.patches.first().map(|c| c.change_id.as_str());
        for patch in &popped {
            if let Some(first) = first_remaining {
                self.vcs
                    .rebase_before(revsets::WORKING_COPY, first)
                    .step("failed to move patch commit before the patch chain")?;
            }
            self.applier.apply(&patch.diff).step("failed to apply patch")?;
            self.vcs
                .commit(&PatchMeta::commit_message(&patch.name, &patch.description))
                .step("failed to commit patch")?;
            debug!(patch = %patch.name, "recreated patch commit");
        }

        self.cursor.restore_after_pop(self.vcs, &chain.base)?;
        info!(
            "Successfully popped {} {}",
            popped.len(),
            patches(popped.len())
        );

        Ok(PopReport {
            popped: popped.into_iter().map(|p| p.name).collect(),
            base: Some(chain.base.change_id),
        })
    }
}
