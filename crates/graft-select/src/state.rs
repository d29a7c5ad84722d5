//! The selection state machine.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use graft_core::{LookupError, Node, NodeId, SelectionState, SourceTree};

use crate::collapse::{self, Plan};

/// Selection states for every node of one loaded tree.
///
/// Owned by the caller and mutated only through [`cycle`](Self::cycle),
/// [`set_all`](Self::set_all), [`set_explicit`](Self::set_explicit) and
/// [`restore`](Self::restore). Ids never seen read as `None`.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    states: HashMap<NodeId, SelectionState>,
}

/// Persisted form of a selection: non-`none` states in tree order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSnapshot(pub IndexMap<NodeId, SelectionState>);

impl SelectionSnapshot {
    /// Number of recorded states.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Selection {
    /// Create a selection with every node of `tree` set to `None`.
    pub fn new(tree: &SourceTree) -> Self {
        let mut selection = Self::default();
        selection.initialize(tree);
        selection
    }

    /// Reset every node of `tree` to `None`, forgetting any other ids.
    pub fn initialize(&mut self, tree: &SourceTree) {
        self.states.clear();
        self.states.reserve(tree.node_count());
        for node in tree.iter() {
            self.states.insert(node.id.clone(), SelectionState::None);
        }
    }

    /// Current state of a node.
    pub fn get(&self, id: &NodeId) -> SelectionState {
        self.states.get(id).copied().unwrap_or_default()
    }

    /// Advance a node to its next state and propagate.
    ///
    /// Unknown ids leave everything untouched and return the id's current
    /// (default) state.
    pub fn cycle(&mut self, tree: &SourceTree, id: &NodeId) -> SelectionState {
        match self.try_cycle(tree, id) {
            Ok(state) => state,
            Err(err) => {
                debug!(target: "graft::select", "cycle ignored: {err}");
                self.get(id)
            }
        }
    }

    /// Like [`cycle`](Self::cycle), but reports unknown ids.
    pub fn try_cycle(
        &mut self,
        tree: &SourceTree,
        id: &NodeId,
    ) -> Result<SelectionState, LookupError> {
        let node = tree.get(id).ok_or_else(|| LookupError::new(id.clone()))?;
        let next = next_state(node, self.get(id));
        self.apply(tree, node, next);
        debug!(target: "graft::select", node = %node.path, state = %next, "cycled");
        Ok(next)
    }

    /// Put a node into a user-choosable state and propagate.
    ///
    /// `Partial` is derived and cannot be set; asking for it leaves the
    /// node unchanged.
    pub fn set_explicit(
        &mut self,
        tree: &SourceTree,
        id: &NodeId,
        state: SelectionState,
    ) -> Result<SelectionState, LookupError> {
        let node = tree.get(id).ok_or_else(|| LookupError::new(id.clone()))?;
        if state == SelectionState::Partial {
            return Ok(self.get(id));
        }
        self.apply(tree, node, state);
        Ok(state)
    }

    /// Set every node of `tree` to `state` without propagation.
    pub fn set_all(&mut self, tree: &SourceTree, state: SelectionState) {
        for node in tree.iter() {
            self.states.insert(node.id.clone(), state);
        }
    }

    /// Capture the non-`none` states in tree order.
    pub fn snapshot(&self, tree: &SourceTree) -> SelectionSnapshot {
        SelectionSnapshot(
            tree.iter()
                .filter_map(|node| {
                    let state = self.get(&node.id);
                    (state != SelectionState::None).then(|| (node.id.clone(), state))
                })
                .collect(),
        )
    }

    /// Replace the current selection with a snapshot, state by state.
    ///
    /// States are taken as given, without propagation. Ids that are not in
    /// `tree` are skipped. Returns the number of states applied.
    pub fn restore(&mut self, tree: &SourceTree, snapshot: &SelectionSnapshot) -> usize {
        self.initialize(tree);
        let mut applied = 0;
        for (id, state) in &snapshot.0 {
            if tree.contains(id) {
                self.states.insert(id.clone(), *state);
                applied += 1;
            } else {
                debug!(target: "graft::select", id = %id, "snapshot entry for unknown node skipped");
            }
        }
        applied
    }

    /// Work items and progress total for the current selection.
    pub fn plan(&self, tree: &SourceTree) -> Plan {
        collapse::plan(tree, self)
    }

    /// Number of work items the current selection produces.
    pub fn selected_count(&self, tree: &SourceTree) -> usize {
        collapse::work_items(tree, self).len()
    }

    fn apply(&mut self, tree: &SourceTree, node: &Node, state: SelectionState) {
        self.states.insert(node.id.clone(), state);
        self.propagate_down(node, state);
        self.recompute_ancestors(tree, &node.id);
    }

    fn propagate_down(&mut self, node: &Node, state: SelectionState) {
        let forced = match state {
            SelectionState::All => SelectionState::All,
            SelectionState::None | SelectionState::FolderOnly => SelectionState::None,
            SelectionState::Partial => return,
        };
        let mut stack: Vec<&Node> = node.children.iter().collect();
        while let Some(descendant) = stack.pop() {
            self.states.insert(descendant.id.clone(), forced);
            stack.extend(descendant.children.iter());
        }
    }

    fn recompute_ancestors(&mut self, tree: &SourceTree, id: &NodeId) {
        let mut current = tree.parent_of(id);
        while let Some(parent) = current {
            let state = self.derive_parent_state(parent);
            self.states.insert(parent.id.clone(), state);
            current = tree.parent_of(&parent.id);
        }
    }

    /// State a folder takes from its direct children.
    fn derive_parent_state(&self, parent: &Node) -> SelectionState {
        let previous = self.get(&parent.id);
        if parent.children.iter().all(|child| self.is_fully_covered(child)) {
            SelectionState::All
        } else if parent
            .children
            .iter()
            .all(|child| self.get(&child.id) == SelectionState::None)
        {
            // An explicit folder-only choice outlives a fully cleared subtree.
            if previous == SelectionState::FolderOnly {
                SelectionState::FolderOnly
            } else {
                SelectionState::None
            }
        } else {
            SelectionState::Partial
        }
    }

    /// `All`, or `Partial` with every descendant fully covered.
    fn is_fully_covered(&self, node: &Node) -> bool {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            match self.get(&node.id) {
                SelectionState::All => {}
                SelectionState::Partial if node.is_folder() && !node.is_leaf() => {
                    stack.extend(node.children.iter());
                }
                _ => return false,
            }
        }
        true
    }
}

/// Next state on a user click.
///
/// Folders with children go none -> all -> folder-only -> none. Files and
/// empty folders go none -> all -> none. `Partial` always advances to `All`.
pub fn next_state(node: &Node, current: SelectionState) -> SelectionState {
    use SelectionState::*;

    let has_children = node.is_folder() && !node.is_leaf();
    match (current, has_children) {
        (None | Partial, _) => All,
        (All, true) => FolderOnly,
        (All, false) => None,
        (FolderOnly, _) => None,
    }
}
