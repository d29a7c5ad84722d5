//! Fetch a whole source tree through a [`StorageClient`].

use std::collections::{HashMap, HashSet};

use compact_str::CompactString;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use graft_core::{
    join_path, sort_nodes, LoadWarning, Node, NodeId, NodeKind, RemoteError, RemoteId,
    SourceTree, TreeError,
};

use crate::client::{RemoteEntry, StorageClient};
use crate::progress::LoadProgress;

/// Errors that stop a tree load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The root folder could not be listed.
    #[error("Failed to list source folder {root}: {source}")]
    Root {
        root: RemoteId,
        #[source]
        source: RemoteError,
    },

    /// The listings do not form a valid tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Loads the folder hierarchy below a root folder.
///
/// Folders are listed breadth-first, one request at a time. A folder whose
/// listing fails is kept with no children and recorded as a warning.
pub struct TreeLoader<'a, C> {
    client: &'a C,
    progress_tx: broadcast::Sender<LoadProgress>,
}

impl<'a, C: StorageClient> TreeLoader<'a, C> {
    /// Create a loader for a client.
    pub fn new(client: &'a C) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            client,
            progress_tx,
        }
    }

    /// Subscribe to load progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<LoadProgress> {
        self.progress_tx.subscribe()
    }

    /// List every folder below `root` and assemble the source tree.
    pub async fn load(&self, root: &RemoteId) -> Result<SourceTree, LoadError> {
        let mut progress = LoadProgress::new();
        let mut warnings = Vec::new();

        // Listing order, so assembly can run children-before-parents.
        let mut order: Vec<RemoteId> = Vec::new();
        let mut paths: HashMap<RemoteId, CompactString> = HashMap::new();
        let mut listings: HashMap<RemoteId, Vec<RemoteEntry>> = HashMap::new();
        let mut seen: HashSet<RemoteId> = HashSet::new();

        let (root_entries, skipped) = self
            .list_all(root)
            .await
            .map_err(|source| LoadError::Root {
                root: root.clone(),
                source,
            })?;
        self.record(&mut progress, "", root_entries.len());
        skipped_warnings("", skipped, &mut warnings);

        paths.insert(root.clone(), CompactString::default());
        seen.insert(root.clone());
        let mut queue = vec![(root.clone(), root_entries)];

        while !queue.is_empty() {
            let mut next = Vec::new();
            for (folder, mut entries) in queue {
                let parent_path = paths.get(&folder).cloned().unwrap_or_default();

                // An object reachable through several folders is kept at its
                // shallowest position only.
                entries.retain(|entry| {
                    if seen.insert(entry.id.clone()) {
                        return true;
                    }
                    let path = join_path(&parent_path, &entry.name);
                    warn!(target: "graft::load", entry = %path, "object listed under several folders; kept once");
                    warnings.push(LoadWarning::new(path, "listed under several folders; kept once"));
                    false
                });

                for entry in &entries {
                    if !self.client.is_folder_kind(&entry.mime_type) {
                        continue;
                    }
                    let path = join_path(&parent_path, &entry.name);
                    let children = match self.list_all(&entry.id).await {
                        Ok((children, skipped)) => {
                            skipped_warnings(&path, skipped, &mut warnings);
                            children
                        }
                        Err(err) => {
                            warn!(target: "graft::load", folder = %path, "listing failed: {err}");
                            warnings.push(LoadWarning::new(path.clone(), err.to_string()));
                            progress.errors_count += 1;
                            Vec::new()
                        }
                    };
                    self.record(&mut progress, &path, children.len());
                    paths.insert(entry.id.clone(), path);
                    next.push((entry.id.clone(), children));
                }
                order.push(folder.clone());
                listings.insert(folder, entries);
            }
            queue = next;
        }

        debug!(
            target: "graft::load",
            folders = progress.folders_listed,
            entries = progress.entries_seen,
            "listing complete"
        );

        let roots = self.assemble(root, &order, &paths, listings);
        Ok(SourceTree::from_nodes(roots)?.with_warnings(warnings))
    }

    /// Concatenate every page of one folder's listing, along with the
    /// names the client left out.
    async fn list_all(
        &self,
        folder: &RemoteId,
    ) -> Result<(Vec<RemoteEntry>, Vec<CompactString>), RemoteError> {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.client.list_children(folder, token.as_deref()).await?;
            entries.extend(page.entries);
            skipped.extend(page.skipped);
            match page.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        Ok((entries, skipped))
    }

    /// Build nodes bottom-up: folders are visited in reverse listing order,
    /// so every child folder is finished before its parent needs it.
    fn assemble(
        &self,
        root: &RemoteId,
        order: &[RemoteId],
        paths: &HashMap<RemoteId, CompactString>,
        mut listings: HashMap<RemoteId, Vec<RemoteEntry>>,
    ) -> Vec<Node> {
        let mut built: HashMap<RemoteId, Vec<Node>> = HashMap::new();

        for folder in order.iter().rev() {
            let entries = listings.remove(folder).unwrap_or_default();
            let parent_path = paths.get(folder).map(|p| p.as_str()).unwrap_or("");
            let mut nodes: Vec<Node> = entries
                .into_iter()
                .map(|entry| {
                    let kind = if self.client.is_folder_kind(&entry.mime_type) {
                        NodeKind::Folder
                    } else {
                        NodeKind::File
                    };
                    let children = if kind.is_folder() {
                        built.remove(&entry.id).unwrap_or_default()
                    } else {
                        Vec::new()
                    };
                    Node {
                        id: NodeId::new(entry.id.0),
                        path: join_path(parent_path, &entry.name),
                        name: entry.name,
                        kind,
                        children,
                    }
                })
                .collect();
            sort_nodes(&mut nodes);
            built.insert(folder.clone(), nodes);
        }

        built.remove(root).unwrap_or_default()
    }

    fn record(&self, progress: &mut LoadProgress, path: &str, entries: usize) {
        progress.folders_listed += 1;
        progress.entries_seen += entries as u64;
        progress.current_path = CompactString::from(path);
        // No subscribers is fine.
        let _ = self.progress_tx.send(progress.clone());
    }
}

fn skipped_warnings(parent: &str, skipped: Vec<CompactString>, warnings: &mut Vec<LoadWarning>) {
    for name in skipped {
        warnings.push(LoadWarning::new(
            join_path(parent, &name),
            "name cannot be addressed by the storage client; skipped",
        ));
    }
}
