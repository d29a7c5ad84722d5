//! Selection engine for graft.
//!
//! This crate tracks which parts of a loaded [`SourceTree`] the user wants
//! copied and reduces that choice to a list of work items:
//!
//! - **State machine** - four states per node, cycled by the user, with
//!   down-propagation to descendants and up-recomputation of ancestors
//! - **Collapser** - the minimal covering set of nodes plus the true
//!   number of nodes a copy will touch
//!
//! ```rust
//! use graft_core::{Node, SelectionState, SourceTree};
//! use graft_select::Selection;
//!
//! let tree = SourceTree::from_nodes(vec![
//!     Node::new_folder("A", "A", "").with_children(vec![Node::new_file("a1", "a1", "A")]),
//! ])
//! .unwrap();
//!
//! let mut selection = Selection::new(&tree);
//! assert_eq!(selection.cycle(&tree, &"A".into()), SelectionState::All);
//!
//! let plan = selection.plan(&tree);
//! assert_eq!(plan.items.len(), 1);
//! assert_eq!(plan.total, 2);
//! ```

mod collapse;
mod state;

pub use collapse::{item_count, plan, work_items, Plan};
pub use state::{next_state, Selection, SelectionSnapshot};

// Re-export core types
pub use graft_core::{NodeId, SelectionState, SourceTree, WorkItem};
