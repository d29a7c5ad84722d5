//! Copy run errors.

use compact_str::CompactString;
use thiserror::Error;

use graft_core::{NodeId, RemoteError};

/// Errors that abort a copy run.
#[derive(Debug, Error)]
pub enum CopyError {
    /// A create or copy call failed.
    #[error("Failed to copy '{name}' ({path}): {source}")]
    Remote {
        name: CompactString,
        path: CompactString,
        #[source]
        source: RemoteError,
    },

    /// Renaming produced a name the destination cannot hold.
    #[error("Renamed '{path}' to invalid name '{name}': {reason}")]
    InvalidName {
        path: CompactString,
        name: String,
        reason: String,
    },

    /// A work item refers to a node missing from the source tree.
    #[error("Work item refers to unknown node {id}")]
    UnknownNode { id: NodeId },
}

impl CopyError {
    /// Path of the item the run stopped on, if known.
    pub fn path(&self) -> Option<&str> {
        match self {
            CopyError::Remote { path, .. } | CopyError::InvalidName { path, .. } => {
                Some(path.as_str())
            }
            CopyError::UnknownNode { .. } => None,
        }
    }
}
