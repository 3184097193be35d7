//! Change (commit) data model

use super::kind::ChangeKind;

/// Represents a jj change (similar to a Git commit)
///
/// A snapshot of what jj reported at query time. Edits never mutate a
/// `Change`; callers query jj again after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Change {
    /// Short change ID (jj's unique identifier, stable across rewrites)
    pub change_id: String,

    /// Full description
    pub description: String,

    /// Parent change IDs (empty only for the root change)
    pub parents: Vec<String>,

    /// Can this change be rewritten?
    pub is_mutable: bool,

    /// Is this change empty (no file changes)?
    pub is_empty: bool,

    /// Does this change contain conflicts?
    pub has_conflict: bool,

    /// Do several visible commits share this change ID?
    pub is_divergent: bool,

    /// Role of this change in a patch chain, derived once from the
    /// description and mutability
    pub kind: ChangeKind,
}

impl Change {
    /// Build a change and classify it
    pub fn new(
        change_id: impl Into<String>,
        description: impl Into<String>,
        parents: Vec<String>,
        is_mutable: bool,
    ) -> Self {
        let mut change = Self {
            change_id: change_id.into(),
            description: description.into(),
            parents,
            is_mutable,
            ..Default::default()
        };
        change.reclassify();
        change
    }

    /// Recompute [`Change::kind`] after the description or mutability changed
    pub fn reclassify(&mut self) {
        self.kind = ChangeKind::classify(&self.description, self.is_mutable);
    }

    pub fn is_patch(&self) -> bool {
        matches!(self.kind, ChangeKind::Patch(_))
    }

    pub fn is_base(&self) -> bool {
        matches!(self.kind, ChangeKind::Base)
    }

    /// The only parent, if there is exactly one
    pub fn single_parent(&self) -> Option<&str> {
        match self.parents.as_slice() {
            [parent] => Some(parent),
            _ => None,
        }
    }

    /// An empty change sitting on exactly one parent, such as the working
    /// copy jj leaves after `jj new`
    pub fn is_placeholder(&self) -> bool {
        self.is_empty && self.parents.len() == 1
    }
}
