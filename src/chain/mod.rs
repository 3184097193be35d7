//! Patch-chain discovery
//!
//! Starting from any change, find the run of `[PATCH]` commits around it
//! and the single base commit that anchors them:
//!
//! 1. Walk towards the root, collecting patches until a base commit (or
//!    anything else) stops the walk. More than one eligible parent is an
//!    error.
//! 2. Walk towards the leaves while there is exactly one patch child. More
//!    than one patch child ends the walk with a warning.
//! 3. Create a base commit below the first patch if none was found,
//!    otherwise make the existing base the working copy.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::jj::constants::revsets;
use crate::jj::{JjError, Vcs};
use crate::model::{BASE_MARKER, Change};


/// Errors that can occur while discovering a patch chain
#[derive(Error, Debug)]
pub enum ChainError {
    #[error(transparent)]
    Jj(#[from] JjError),

    #[error("ambiguous patch chain: commit {0} has multiple patch/base parents")]
    AmbiguousParents(String),

    #[error("base commit {0} is conflicted")]
    BaseConflicted(String),

    #[error("base commit {0} is divergent")]
    BaseDivergent(String),

    #[error("failed to locate base commit")]
    MissingBase,

    #[error("change {0} is missing from its own ancestry query")]
    OriginMissing(String),
}

/// Where to start and how to treat a missing base
#[derive(Debug, Clone)]
pub struct ChainOptions<'a> {
    /// Revision to start the walk from
    pub origin: &'a str,
    /// Series root relative to the repository root, mentioned in the
    /// description of a created base commit
    pub root_rel: &'a str,
    /// Create a base commit when the walk finds none
    pub create_base: bool,
}

impl<'a> ChainOptions<'a> {
    pub fn new(origin: &'a str, root_rel: &'a str) -> Self {
        Self {
            origin,
            root_rel,
            create_base: true,
        }
    }
}

/// Patch commits in application order plus the base they are folded into
#[derive(Debug, Clone)]
pub struct PatchChain {
    /// Oldest first. Parent lists are as queried, before any base was
    /// inserted below the first patch.
    pub patches: Vec<Change>,
    pub base: Change,
}

impl PatchChain {
    /// Change ids of the patches, oldest first
    pub fn patch_ids(&self) -> Vec<&str> {
        self.patches.iter().map(|c| c.change_id.as_str()).collect()
    }
}

/// Description of a base commit created for `root_rel`
pub fn base_description(root_rel: &str) -> String {
    let root = if root_rel.is_empty() { "." } else { root_rel };
    format!("#{BASE_MARKER} Modify patches for {root}.")
}

/// Changes around the origin, indexed by id, with children derived from
/// parent lists
struct ChangeIndex {
    changes: HashMap<String, Change>,
    children: HashMap<String, Vec<String>>,
}

impl ChangeIndex {
    /// `changes` in jj's newest-first order; children lists end up oldest
    /// first
    fn build(changes: Vec<Change>) -> Self {
        let mut index = Self {
            changes: HashMap::with_capacity(changes.len()),
            children: HashMap::new(),
        };
        for change in changes.into_iter().rev() {
            for parent in &change.parents {
                index
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(change.change_id.clone());
            }
            index.changes.insert(change.change_id.clone(), change);
        }
        index
    }

    fn get(&self, id: &str) -> Option<&Change> {
        self.changes.get(id)
    }

    fn parents<'a>(&'a self, change: &'a Change) -> impl Iterator<Item = &'a Change> {
        change.parents.iter().filter_map(|id| self.get(id))
    }

    fn children<'a>(&'a self, change: &Change) -> impl Iterator<Item = &'a Change> {
        self.children
            .get(&change.change_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(id))
    }
}

/// Result of walking the graph, before any base commit is created
#[derive(Debug)]
struct Discovery {
    patches: Vec<Change>,
    base: Option<Change>,
}

/// Walk from `origin` towards the root while on patch commits
fn walk_to_root<'a>(
    index: &'a ChangeIndex,
    origin: &'a Change,
) -> Result<(Vec<&'a Change>, Option<&'a Change>), ChainError> {
    let mut path = Vec::new();
    let mut current = origin;

    loop {
        if current.is_patch() {
            path.push(current);
        } else if current.is_base() {
            if current.has_conflict {
                return Err(ChainError::BaseConflicted(current.change_id.clone()));
            }
            if current.is_divergent {
                return Err(ChainError::BaseDivergent(current.change_id.clone()));
            }
            debug!(base = %current.change_id, "found base commit");
            return Ok((path, Some(current)));
        } else {
            return Ok((path, None));
        }

        let mut candidates = index
            .parents(current)
            .filter(|parent| parent.is_patch() || parent.is_base() || !parent.is_mutable);
        let Some(next) = candidates.next() else {
            return Ok((path, None));
        };
        if candidates.next().is_some() {
            return Err(ChainError::AmbiguousParents(current.change_id.clone()));
        }
        current = next;
    }
}

/// Walk from `origin` towards the leaves while there is exactly one patch child
fn walk_to_leaf<'a>(index: &'a ChangeIndex, origin: &'a Change) -> Vec<&'a Change> {
    let mut path = Vec::new();
    let mut current = origin;

    loop {
        let mut candidates = index.children(current).filter(|child| child.is_patch());
        let Some(next) = candidates.next() else {
            return path;
        };
        if candidates.next().is_some() {
            warn!(
                "ambiguous patch chain: commit {} has multiple patch children",
                current.change_id
            );
            return path;
        }
        path.push(next);
        current = next;
    }
}

fn discover(index: &ChangeIndex, origin: &Change) -> Result<Discovery, ChainError> {
    let (to_root, base) = walk_to_root(index, origin)?;
    let to_leaf = walk_to_leaf(index, origin);

    let patches = to_root
        .into_iter()
        .rev()
        .chain(to_leaf)
        .cloned()
        .collect();

    Ok(Discovery {
        patches,
        base: base.cloned(),
    })
}

/// Discover the patch chain around `opts.origin` and make its base the
/// working copy, creating the base if needed.
pub fn build_chain<V: Vcs + ?Sized>(
    vcs: &V,
    opts: &ChainOptions<'_>,
) -> Result<PatchChain, ChainError> {
    // An empty placeholder on top of the intended change stands for its parent
    let origin = vcs.change(opts.origin)?;
    let origin_id = match origin.single_parent() {
        Some(parent) if origin.is_empty => parent.to_string(),
        _ => origin.change_id.clone(),
    };

    let index = ChangeIndex::build(vcs.changes(&revsets::chain_neighbourhood(&origin_id))?);
    let origin = index
        .get(&origin_id)
        .ok_or_else(|| ChainError::OriginMissing(origin_id.clone()))?;

    let Discovery { patches, base } = discover(&index, origin)?;
    debug!(
        origin = %origin_id,
        patches = patches.len(),
        has_base = base.is_some(),
        "walked patch chain"
    );

    let base = match base {
        Some(base) => {
            vcs.edit(&base.change_id)?;
            base
        }
        None if !opts.create_base => return Err(ChainError::MissingBase),
        None => {
            let message = base_description(opts.root_rel);
            match patches.first() {
                Some(first) => vcs.new_before(&first.change_id, &message)?,
                None => vcs.new_on(&origin_id, Some(&message))?,
            }
            let created = vcs.change(revsets::WORKING_COPY)?;
            debug!(base = %created.change_id, "created base commit");
            created
        }
    };

    Ok(PatchChain { patches, base })
}
