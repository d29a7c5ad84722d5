//! The storage service contract.

use std::future::Future;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use graft_core::{RemoteError, RemoteId};

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    /// Object id.
    pub id: RemoteId,
    /// Object name.
    pub name: CompactString,
    /// Service-specific content type.
    pub mime_type: CompactString,
}

impl RemoteEntry {
    /// Create a new entry.
    pub fn new(
        id: impl Into<RemoteId>,
        name: impl Into<CompactString>,
        mime_type: impl Into<CompactString>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    /// Entries on this page.
    pub entries: Vec<RemoteEntry>,
    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
    /// Names of entries on this page the client cannot address, left out
    /// of `entries`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<CompactString>,
}

/// Client for a hierarchical storage service.
///
/// Graft only ever awaits one call at a time, but the futures are `Send`
/// so callers may drive a run from any tokio worker.
pub trait StorageClient: Sync {
    /// List one page of a folder's direct children.
    fn list_children(
        &self,
        folder: &RemoteId,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<ListPage, RemoteError>> + Send;

    /// Whether a listing entry's content type denotes a folder.
    fn is_folder_kind(&self, mime_type: &str) -> bool;

    /// Create a folder and return its id. Not idempotent.
    fn create_folder(
        &self,
        name: &str,
        parent: &RemoteId,
    ) -> impl Future<Output = Result<RemoteId, RemoteError>> + Send;

    /// Copy a file into `parent`.
    ///
    /// Without `new_name` the service applies its own copy naming.
    fn copy_file(
        &self,
        file: &RemoteId,
        parent: &RemoteId,
        new_name: Option<&str>,
    ) -> impl Future<Output = Result<RemoteId, RemoteError>> + Send;
}
