//! Per-node selection states and work items.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::node::NodeId;

/// Selection state of a single node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SelectionState {
    /// Excluded.
    #[default]
    None,
    /// The node and its entire subtree.
    All,
    /// The folder itself, without its contents.
    FolderOnly,
    /// Some but not all descendants are included. Derived, never set by the user.
    Partial,
}

impl SelectionState {
    /// Whether the node itself ends up at the destination.
    pub fn includes_self(&self) -> bool {
        matches!(self, SelectionState::All | SelectionState::FolderOnly)
    }
}

/// One unit of copy work derived from a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// The node to copy.
    pub node_id: NodeId,
    /// The state that produced this item (`All` or `FolderOnly`).
    pub selection_type: SelectionState,
    /// Copy the whole subtree along with the node.
    pub include_children: bool,
}

impl WorkItem {
    /// A node copied together with its whole subtree.
    pub fn all(node_id: NodeId) -> Self {
        Self {
            node_id,
            selection_type: SelectionState::All,
            include_children: true,
        }
    }

    /// A folder copied without its contents.
    pub fn folder_only(node_id: NodeId) -> Self {
        Self {
            node_id,
            selection_type: SelectionState::FolderOnly,
            include_children: false,
        }
    }
}
