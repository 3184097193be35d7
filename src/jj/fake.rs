//! In-memory [`Vcs`] for unit tests
//!
//! Models a change graph plus an operation log: every mutation appends a
//! new state, and `op_restore` appends a copy of an older one, the way jj
//! records a restore as a new operation.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use super::{JjError, Vcs};
use crate::model::{Change, OperationId};

pub(crate) const ROOT_ID: &str = "zzzzzzzz";

/// One point in the fake operation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeState {
    pub changes: BTreeMap<String, Change>,
    /// Creation order, oldest first; used to emit jj's newest-first order
    pub order: Vec<String>,
    pub working_copy: String,
}

#[derive(Debug, Clone, Default)]
struct FakeDiff {
    whole: String,
    scoped: String,
}

pub(crate) struct FakeRepo {
    root: PathBuf,
    history: RefCell<Vec<FakeState>>,
    diffs: RefCell<HashMap<String, FakeDiff>>,
    fail_on: RefCell<Option<&'static str>>,
    calls: RefCell<Vec<String>>,
    next_id: RefCell<usize>,
}

impl FakeRepo {
    /// A repository holding only the immutable root change, which is also
    /// the working copy
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root_change = Change {
            is_empty: true,
            ..Change::new(ROOT_ID, "", Vec::new(), false)
        };
        let state = FakeState {
            changes: BTreeMap::from([(ROOT_ID.to_string(), root_change)]),
            order: vec![ROOT_ID.to_string()],
            working_copy: ROOT_ID.to_string(),
        };
        Self {
            root: root.into(),
            history: RefCell::new(vec![state]),
            diffs: RefCell::new(HashMap::new()),
            fail_on: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
            next_id: RefCell::new(0),
        }
    }

    /// Add a mutable, non-empty change without recording an operation
    pub fn add(&self, id: &str, description: &str, parents: &[&str]) -> &Self {
        let parents = parents.iter().map(|p| p.to_string()).collect();
        self.insert(Change::new(id, description, parents, true));
        self
    }

    /// Add an immutable change without recording an operation
    pub fn add_immutable(&self, id: &str, parents: &[&str]) -> &Self {
        let parents = parents.iter().map(|p| p.to_string()).collect();
        self.insert(Change::new(id, "", parents, false));
        self
    }

    /// Adjust a change in place without recording an operation
    pub fn update(&self, id: &str, f: impl FnOnce(&mut Change)) -> &Self {
        let mut history = self.history.borrow_mut();
        let state = history.last_mut().expect("fake history is never empty");
        let change = state.changes.get_mut(id).expect("unknown change id");
        f(change);
        change.reclassify();
        self
    }

    pub fn set_working_copy(&self, id: &str) -> &Self {
        let mut history = self.history.borrow_mut();
        history
            .last_mut()
            .expect("fake history is never empty")
            .working_copy = id.to_string();
        self
    }

    /// Diff output for `change_id`: `whole` unrestricted, `scoped` limited
    /// to the series root
    pub fn set_diff(&self, change_id: &str, whole: &str, scoped: &str) -> &Self {
        self.diffs.borrow_mut().insert(
            change_id.to_string(),
            FakeDiff {
                whole: whole.to_string(),
                scoped: scoped.to_string(),
            },
        );
        self
    }

    /// Make the next call of the named trait method fail
    pub fn fail_on(&self, method: &'static str) {
        *self.fail_on.borrow_mut() = Some(method);
    }

    pub fn state(&self) -> FakeState {
        self.history
            .borrow()
            .last()
            .cloned()
            .expect("fake history is never empty")
    }

    pub fn operation_count(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn get(&self, id: &str) -> Change {
        self.state().changes[id].clone()
    }

    pub fn working_copy(&self) -> Change {
        let state = self.state();
        state.changes[&state.working_copy].clone()
    }

    /// Children of `id`, oldest first
    pub fn children(&self, id: &str) -> Vec<Change> {
        let state = self.state();
        state
            .order
            .iter()
            .filter_map(|child| state.changes.get(child))
            .filter(|change| change.parents.iter().any(|p| p == id))
            .cloned()
            .collect()
    }

    /// Trait methods called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn insert(&self, change: Change) {
        let mut history = self.history.borrow_mut();
        let state = history.last_mut().expect("fake history is never empty");
        state.order.push(change.change_id.clone());
        state.changes.insert(change.change_id.clone(), change);
    }

    fn enter(&self, method: &'static str) -> Result<(), JjError> {
        self.calls.borrow_mut().push(method.to_string());
        if *self.fail_on.borrow() == Some(method) {
            self.fail_on.borrow_mut().take();
            return Err(JjError::CommandFailed {
                command: method.to_string(),
                stderr: format!("injected failure in {method}"),
                exit_code: 1,
            });
        }
        Ok(())
    }

    fn fresh_id(&self) -> String {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        format!("new{next}")
    }

    fn mutate(
        &self,
        f: impl FnOnce(&mut FakeState) -> Result<(), JjError>,
    ) -> Result<(), JjError> {
        let mut state = self.state();
        f(&mut state)?;
        self.history.borrow_mut().push(state);
        Ok(())
    }
}

fn unknown(id: &str) -> JjError {
    JjError::CommandFailed {
        command: format!("log -r {id}"),
        stderr: format!("Revision `{id}` doesn't exist"),
        exit_code: 1,
    }
}

fn resolve(state: &FakeState, token: &str) -> Result<String, JjError> {
    let id = if token == "@" {
        state.working_copy.clone()
    } else {
        token.to_string()
    };
    if state.changes.contains_key(&id) {
        Ok(id)
    } else {
        Err(unknown(token))
    }
}

fn empty_change(id: String, parents: Vec<String>, message: &str) -> Change {
    Change {
        is_empty: true,
        ..Change::new(id, message, parents, true)
    }
}

/// Detach `id` from the graph, handing its children to its parents
fn unlink(state: &mut FakeState, id: &str) {
    let parents = state.changes[id].parents.clone();
    for change in state.changes.values_mut() {
        if change.parents.iter().any(|p| p == id) {
            let mut reparented = Vec::new();
            for parent in &change.parents {
                if parent == id {
                    reparented.extend(parents.iter().cloned());
                } else {
                    reparented.push(parent.clone());
                }
            }
            change.parents = reparented;
        }
    }
}

impl Vcs for FakeRepo {
    fn root(&self) -> Result<PathBuf, JjError> {
        self.enter("root")?;
        Ok(self.root.clone())
    }

    fn changes(&self, revset: &str) -> Result<Vec<Change>, JjError> {
        self.enter("changes")?;
        let state = self.state();
        if revset.starts_with("descendants(") {
            return Ok(state
                .order
                .iter()
                .rev()
                .map(|id| state.changes[id].clone())
                .collect());
        }
        revset
            .split('|')
            .map(|token| resolve(&state, token.trim()).map(|id| state.changes[&id].clone()))
            .collect()
    }

    fn git_diff(&self, change_id: &str, path: Option<&str>) -> Result<String, JjError> {
        self.enter("git_diff")?;
        let diffs = self.diffs.borrow();
        let diff = diffs.get(change_id).cloned().unwrap_or_default();
        Ok(if path.is_some() {
            diff.scoped
        } else {
            diff.whole
        })
    }

    fn squash_into(&self, sources: &[&str], destination: &str) -> Result<(), JjError> {
        self.enter("squash_into")?;
        let destination = destination.to_string();
        let sources: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        let fresh = self.fresh_id();
        self.mutate(move |state| {
            resolve(state, &destination)?;
            let mut all_empty = true;
            for source in &sources {
                let source = resolve(state, source)?;
                all_empty &= state.changes[&source].is_empty;
                unlink(state, &source);
                state.changes.remove(&source);
                state.order.retain(|id| *id != source);
                if state.working_copy == source {
                    state.working_copy = fresh.clone();
                    state.order.push(fresh.clone());
                    state.changes.insert(
                        fresh.clone(),
                        empty_change(fresh.clone(), vec![destination.clone()], ""),
                    );
                }
            }
            let dest = state.changes.get_mut(&destination).ok_or_else(|| unknown(&destination))?;
            dest.is_empty &= all_empty;
            Ok(())
        })
    }

    fn new_on(&self, parent: &str, message: Option<&str>) -> Result<(), JjError> {
        self.enter("new_on")?;
        let id = self.fresh_id();
        self.mutate(|state| {
            let parent = resolve(state, parent)?;
            state.order.push(id.clone());
            state.changes.insert(
                id.clone(),
                empty_change(id.clone(), vec![parent], message.unwrap_or_default()),
            );
            state.working_copy = id;
            Ok(())
        })
    }

    fn new_before(&self, before: &str, message: &str) -> Result<(), JjError> {
        self.enter("new_before")?;
        let id = self.fresh_id();
        self.mutate(|state| {
            let before = resolve(state, before)?;
            let parents = std::mem::replace(
                &mut state.changes.get_mut(&before).ok_or_else(|| unknown(&before))?.parents,
                vec![id.clone()],
            );
            state.order.push(id.clone());
            state
                .changes
                .insert(id.clone(), empty_change(id.clone(), parents, message));
            state.working_copy = id;
            Ok(())
        })
    }

    fn edit(&self, rev: &str) -> Result<(), JjError> {
        self.enter("edit")?;
        self.mutate(|state| {
            state.working_copy = resolve(state, rev)?;
            Ok(())
        })
    }

    fn rebase_before(&self, rev: &str, before: &str) -> Result<(), JjError> {
        self.enter("rebase_before")?;
        self.mutate(|state| {
            let rev = resolve(state, rev)?;
            let before = resolve(state, before)?;
            unlink(state, &rev);
            let parents = std::mem::replace(
                &mut state.changes.get_mut(&before).ok_or_else(|| unknown(&before))?.parents,
                vec![rev.clone()],
            );
            state.changes.get_mut(&rev).ok_or_else(|| unknown(&rev))?.parents = parents;
            Ok(())
        })
    }

    fn commit(&self, message: &str) -> Result<(), JjError> {
        self.enter("commit")?;
        let id = self.fresh_id();
        self.mutate(|state| {
            let current = state.working_copy.clone();
            let change = state.changes.get_mut(&current).ok_or_else(|| unknown(&current))?;
            change.description = message.to_string();
            change.is_empty = false;
            change.reclassify();
            state.order.push(id.clone());
            state
                .changes
                .insert(id.clone(), empty_change(id.clone(), vec![current], ""));
            state.working_copy = id;
            Ok(())
        })
    }

    fn current_operation(&self) -> Result<OperationId, JjError> {
        self.enter("current_operation")?;
        Ok(OperationId::new(format!(
            "{:x}",
            self.history.borrow().len() - 1
        )))
    }

    fn op_restore(&self, op: &OperationId) -> Result<(), JjError> {
        self.enter("op_restore")?;
        let index = usize::from_str_radix(op.as_str(), 16)
            .map_err(|e| JjError::ParseError(e.to_string()))?;
        let state = self
            .history
            .borrow()
            .get(index)
            .cloned()
            .ok_or_else(|| unknown(op.as_str()))?;
        self.history.borrow_mut().push(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> FakeRepo {
        let repo = FakeRepo::new("/repo");
        repo.add("a", "[PATCH] a", &[ROOT_ID])
            .add("b", "[PATCH] b", &["a"]);
        repo
    }

    #[test]
    fn test_changes_newest_first() {
        let repo = linear();
        let ids: Vec<String> = repo
            .changes("descendants(a)|(heads(immutable())::ancestors(a))")
            .unwrap()
            .into_iter()
            .map(|c| c.change_id)
            .collect();
        assert_eq!(ids, vec!["b", "a", ROOT_ID]);
    }

    #[test]
    fn test_change_requires_exactly_one() {
        let repo = linear();
        assert!(matches!(
            repo.change("a|b"),
            Err(JjError::NotExactlyOne { count: 2, .. })
        ));
        assert!(repo.change("missing").is_err());
    }

    #[test]
    fn test_new_before_inserts_between() {
        let repo = linear();
        repo.new_before("b", "#QUAHOG").unwrap();
        let wc = repo.working_copy();
        assert_eq!(wc.parents, vec!["a"]);
        assert_eq!(repo.get("b").parents, vec![wc.change_id]);
    }

    #[test]
    fn test_squash_reparents_children() {
        let repo = linear();
        repo.add("c", "[PATCH] c", &["b"]);
        repo.squash_into(&["a", "b"], ROOT_ID).unwrap();
        assert_eq!(repo.get("c").parents, vec![ROOT_ID]);
        assert!(!repo.state().changes.contains_key("a"));
    }

    #[test]
    fn test_op_restore_appends_old_state() {
        let repo = linear();
        let before = repo.state();
        let op = repo.current_operation().unwrap();
        repo.edit("a").unwrap();
        repo.op_restore(&op).unwrap();
        assert_eq!(repo.state(), before);
        assert_eq!(repo.operation_count(), 3);
    }

    #[test]
    fn test_fail_on_fails_once() {
        let repo = linear();
        repo.fail_on("edit");
        assert!(repo.edit("a").is_err());
        assert!(repo.edit("a").is_ok());
    }
}
