//! Error types shared across graft crates.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{NodeId, RemoteId};

/// Errors raised while assembling a [`SourceTree`](crate::SourceTree).
#[derive(Debug, Error)]
pub enum TreeError {
    /// The same id appears twice.
    #[error("Duplicate node id: {id}")]
    DuplicateId { id: NodeId },

    /// A node's path is not its parent's path plus its name.
    #[error("Node {id} has path '{found}', expected '{expected}'")]
    PathMismatch {
        id: NodeId,
        expected: CompactString,
        found: CompactString,
    },

    /// A file node carries children.
    #[error("File node {id} has children")]
    FileWithChildren { id: NodeId },
}

/// A node id that is not part of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown node: {id}")]
pub struct LookupError {
    /// The id that was looked up.
    pub id: NodeId,
}

impl LookupError {
    /// Create a new lookup error.
    pub fn new(id: NodeId) -> Self {
        Self { id }
    }
}

/// Failures reported by a storage client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The referenced object does not exist.
    #[error("Remote object not found: {id}")]
    NotFound { id: RemoteId },

    /// The target already holds an object with that name.
    #[error("'{name}' already exists in {parent}")]
    AlreadyExists { parent: RemoteId, name: String },

    /// The service rejected the request.
    #[error("Remote request failed: {message}")]
    Api { message: String },

    /// Local I/O error (filesystem-backed clients).
    #[error("I/O error at {id}: {source}")]
    Io {
        id: RemoteId,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    /// Create an API error from a message.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create an I/O error with id context.
    pub fn io(id: impl Into<RemoteId>, source: std::io::Error) -> Self {
        let id = id.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { id },
            _ => Self::Io { id, source },
        }
    }
}

/// Missing or invalid caller-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No source folder was given.
    #[error("A source folder id is required")]
    MissingSource,

    /// No destination folder was given.
    #[error("A destination folder id is required")]
    MissingDestination,

    /// A field holds an unusable value.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Non-fatal problem encountered while loading the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWarning {
    /// Path of the folder whose listing failed.
    pub path: CompactString,
    /// Human-readable message.
    pub message: String,
}

impl LoadWarning {
    /// Create a new load warning.
    pub fn new(path: impl Into<CompactString>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_io() {
        let err = RemoteError::io(
            "/dest/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, RemoteError::NotFound { .. }));

        let err = RemoteError::io(
            "/dest/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, RemoteError::Io { .. }));
    }

    #[test]
    fn test_lookup_error_message() {
        let err = LookupError::new(NodeId::new("nope"));
        assert_eq!(err.to_string(), "Unknown node: nope");
    }
}
