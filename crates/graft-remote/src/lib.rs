//! Storage access for graft.
//!
//! This crate defines what graft needs from a hierarchical storage service
//! and builds source trees through it:
//!
//! - [`StorageClient`] - paginated listing, folder creation and file copy
//! - [`TreeLoader`] - breadth-first fetch of a whole source tree, with
//!   progress updates and per-folder warnings
//! - [`LocalStorage`] - a client over the local filesystem
//! - [`MemoryStorage`] - an in-memory client that records every request

mod client;
mod loader;
mod local;
mod memory;
mod progress;

pub use client::{ListPage, RemoteEntry, StorageClient};
pub use loader::{LoadError, TreeLoader};
pub use local::{LocalStorage, DIRECTORY_MIME_TYPE, FILE_MIME_TYPE};
pub use memory::{Call, MemoryStorage, FOLDER_MIME_TYPE, PLAIN_MIME_TYPE};
pub use progress::LoadProgress;

// Re-export core types
pub use graft_core::{RemoteError, RemoteId, SourceTree};
