//! Reduce a selection to the work the copy has to do.

use serde::{Deserialize, Serialize};

use graft_core::{Node, SelectionState, SourceTree, WorkItem};

use crate::state::Selection;

/// Work items plus the number of nodes they will touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Minimal covering set of nodes, in source pre-order.
    pub items: Vec<WorkItem>,
    /// Nodes the copy will create or copy; the progress denominator.
    pub total: usize,
}

impl Plan {
    /// Check if there is nothing to copy.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collapse a selection into work items and their item count.
pub fn plan(tree: &SourceTree, selection: &Selection) -> Plan {
    Plan {
        items: work_items(tree, selection),
        total: item_count(tree, selection),
    }
}

/// Minimal covering set of nodes to act on, in pre-order.
///
/// An `All` node stands for its whole subtree, so nothing below it is
/// emitted. `FolderOnly` nodes are emitted and their children still
/// visited. `Partial` nodes are only visited through.
pub fn work_items(tree: &SourceTree, selection: &Selection) -> Vec<WorkItem> {
    let mut items = Vec::new();
    let mut stack: Vec<&Node> = tree.roots().iter().rev().collect();

    while let Some(node) = stack.pop() {
        match selection.get(&node.id) {
            SelectionState::All => items.push(WorkItem::all(node.id.clone())),
            SelectionState::FolderOnly => {
                items.push(WorkItem::folder_only(node.id.clone()));
                stack.extend(node.children.iter().rev());
            }
            SelectionState::Partial => stack.extend(node.children.iter().rev()),
            SelectionState::None => {}
        }
    }

    items
}

/// Number of nodes a copy of the current selection touches.
///
/// `All` counts the whole subtree, `FolderOnly` counts the folder plus
/// anything independently selected below it, `Partial` sums its children.
pub fn item_count(tree: &SourceTree, selection: &Selection) -> usize {
    let mut count = 0;
    let mut stack: Vec<&Node> = tree.roots().iter().collect();

    while let Some(node) = stack.pop() {
        match selection.get(&node.id) {
            SelectionState::All => count += node.subtree_size(),
            SelectionState::FolderOnly => {
                count += 1;
                stack.extend(node.children.iter());
            }
            SelectionState::Partial => stack.extend(node.children.iter()),
            SelectionState::None => {}
        }
    }

    count
}
