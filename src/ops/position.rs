//! The operator's working position before an operation, and putting it back

use tracing::debug;

use super::{OpError, StepContext};
use crate::jj::{JjError, Vcs};
use crate::jj::constants::revsets;
use crate::model::Change;

/// Where `@` was when the operation started
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    /// The change the operator is working on
    pub origin: Change,
    /// `@` was an empty placeholder on top of `origin`
    pub on_placeholder: bool,
}

impl Cursor {
    pub fn capture<V: Vcs + ?Sized>(vcs: &V) -> Result<Self, OpError> {
        let current = vcs
            .change(revsets::WORKING_COPY)
            .step("failed to resolve working copy")?;
        let cursor = match current.single_parent() {
            Some(parent) if current.is_placeholder() => Self {
                origin: vcs
                    .change(parent)
                    .step("failed to resolve working copy parent")?,
                on_placeholder: true,
            },
            _ => Self {
                origin: current,
                on_placeholder: false,
            },
        };
        debug!(
            origin = %cursor.origin.change_id,
            on_placeholder = cursor.on_placeholder,
            "captured working position"
        );
        Ok(cursor)
    }

    pub fn origin_id(&self) -> &str {
        &self.origin.change_id
    }

    /// After folding: the origin may have been squashed away, in which case
    /// the operator continues on top of the base
    pub fn restore_after_fold<V: Vcs + ?Sized>(
        &self,
        vcs: &V,
        base: &Change,
        folded: &[&str],
    ) -> Result<(), OpError> {
        let result = if folded.contains(&self.origin_id()) {
            vcs.new_on(&base.change_id, None)
        } else {
            self.restore(vcs)
        };
        result.step("failed to restore commit position")
    }

    /// After popping: an operator who sat on a placeholder above the base
    /// stays on the empty change left on top of the recreated patches
    pub fn restore_after_pop<V: Vcs + ?Sized>(
        &self,
        vcs: &V,
        base: &Change,
    ) -> Result<(), OpError> {
        if self.on_placeholder && self.origin.change_id == base.change_id {
            return Ok(());
        }
        self.restore(vcs).step("failed to restore commit position")
    }

    fn restore<V: Vcs + ?Sized>(&self, vcs: &V) -> Result<(), JjError> {
        if self.on_placeholder {
            vcs.new_on(self.origin_id(), None)
        } else {
            vcs.edit(self.origin_id())
        }
    }
}
