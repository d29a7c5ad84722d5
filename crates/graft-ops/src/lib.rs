//! Copy engine for graft.
//!
//! This crate turns a collapsed selection into objects at the destination:
//!
//! - [`apply_mappings`] - ordered literal find/replace and prepend rules
//! - [`CopyOrchestrator`] - sequential walk over the work items with lazy
//!   creation of unselected parent folders
//! - [`CopyEvent`] / [`CopyObserver`] - structured notifications for
//!   whatever displays the run

mod copy;
mod error;
mod progress;
mod rename;

pub use copy::{CopyOptions, CopyOrchestrator, FolderKey};
pub use error::CopyError;
pub use progress::{CopyEvent, CopyObserver, CopyReport, NoopObserver};
pub use rename::{apply_mappings, validate_name};
