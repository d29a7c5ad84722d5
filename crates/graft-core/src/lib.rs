//! Core types for graft.
//!
//! This crate provides the data structures shared by every graft crate:
//! the source tree model, per-node selection states, rename rules,
//! the error taxonomy and copy configuration.

mod config;
mod error;
mod mapping;
mod node;
mod selection;
mod tree;

pub use config::{ConfigFile, GraftConfig, GraftConfigBuilder, DEFAULT_PAGE_SIZE};
pub use error::{ConfigError, LoadWarning, LookupError, RemoteError, TreeError};
pub use mapping::RenameMapping;
pub use node::{join_path, parent_path, sort_nodes, Node, NodeId, NodeKind, RemoteId};
pub use selection::{SelectionState, WorkItem};
pub use tree::{PreOrder, SourceTree};
