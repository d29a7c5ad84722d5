//! Copy events and run summaries.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use graft_core::{NodeId, RemoteId};

/// Something that happened during a copy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum CopyEvent {
    /// A selected folder was created at the destination.
    FolderCreated {
        node_id: NodeId,
        path: CompactString,
        name: String,
        id: RemoteId,
    },
    /// An unselected ancestor was created so a selected item had a parent.
    AncestorCreated {
        node_id: NodeId,
        path: CompactString,
        name: String,
        id: RemoteId,
    },
    /// A file was copied.
    FileCopied {
        node_id: NodeId,
        path: CompactString,
        name: String,
        id: RemoteId,
    },
    /// The parent folder could not be found in the source tree; the item
    /// went to the destination root instead.
    ParentFallback {
        node_id: NodeId,
        path: CompactString,
    },
    /// A unit of work finished.
    Progress { processed: usize, total: usize },
    /// The run stopped on this item.
    Failed {
        path: CompactString,
        message: String,
    },
}

/// Receives copy events as they happen.
pub trait CopyObserver {
    /// Handle one event.
    fn on_event(&mut self, event: &CopyEvent);
}

impl<F: FnMut(&CopyEvent)> CopyObserver for F {
    fn on_event(&mut self, event: &CopyEvent) {
        self(event)
    }
}

impl CopyObserver for mpsc::UnboundedSender<CopyEvent> {
    fn on_event(&mut self, event: &CopyEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.send(event.clone());
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CopyObserver for NoopObserver {
    fn on_event(&mut self, _event: &CopyEvent) {}
}

/// Summary of a successful copy run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReport {
    /// Selected folders created.
    pub folders_created: usize,
    /// Files copied.
    pub files_copied: usize,
    /// Unselected ancestors created on demand. Not counted in `processed`.
    pub ancestors_created: usize,
    /// Units of work completed.
    pub processed: usize,
    /// Item count the run was started with.
    pub total: usize,
    /// Items placed at the destination root because their parent was missing.
    pub fallbacks: usize,
}

impl CopyReport {
    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.processed as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Get a human-readable summary of the run.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Copied {} files and created {} folders",
            self.files_copied, self.folders_created
        );
        if self.ancestors_created > 0 {
            summary.push_str(&format!(" (+{} parent folders)", self.ancestors_created));
        }
        if self.fallbacks > 0 {
            summary.push_str(&format!(", {} placed at the destination root", self.fallbacks));
        }
        summary
    }
}
