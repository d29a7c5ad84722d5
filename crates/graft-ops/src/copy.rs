//! Replicate a selection into a destination folder.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use graft_core::{
    parent_path, GraftConfig, Node, NodeId, RemoteError, RemoteId, RenameMapping, SourceTree,
    WorkItem,
};
use graft_remote::StorageClient;

use crate::error::CopyError;
use crate::progress::{CopyEvent, CopyObserver, CopyReport, NoopObserver};
use crate::rename::{apply_mappings, validate_name};

/// Key of the created-folders cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderKey {
    /// The destination folder itself.
    Root,
    /// A source folder that has been created at the destination.
    Node(NodeId),
}

/// Options for copy runs.
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Omit the name from file copies that no rule renamed, so the storage
    /// service applies its own copy naming.
    pub keep_remote_copy_naming: bool,
}

/// Walks a list of work items and reproduces them at the destination.
///
/// Items are processed strictly one at a time, in the order given, which
/// must be source pre-order. Parents that were not selected themselves are
/// created on demand the first time a descendant needs them. Every folder
/// the run creates is remembered, so no folder is ever created twice.
///
/// The first failing call ends the run. Whatever was created up to that
/// point stays at the destination.
pub struct CopyOrchestrator<'a, C, O = NoopObserver> {
    tree: &'a SourceTree,
    client: &'a C,
    destination: RemoteId,
    mappings: Vec<RenameMapping>,
    options: CopyOptions,
    created: HashMap<FolderKey, RemoteId>,
    observer: O,
    report: CopyReport,
}

impl<'a, C: StorageClient> CopyOrchestrator<'a, C> {
    /// Create an orchestrator copying into `destination`, with no rename rules.
    pub fn new(tree: &'a SourceTree, client: &'a C, destination: RemoteId) -> Self {
        let mut created = HashMap::new();
        created.insert(FolderKey::Root, destination.clone());
        Self {
            tree,
            client,
            destination,
            mappings: Vec::new(),
            options: CopyOptions::default(),
            created,
            observer: NoopObserver,
            report: CopyReport::default(),
        }
    }

    /// Create an orchestrator from a run configuration.
    pub fn from_config(tree: &'a SourceTree, client: &'a C, config: &GraftConfig) -> Self {
        Self::new(tree, client, config.destination.clone())
            .with_mappings(config.mappings.clone())
            .with_options(CopyOptions {
                keep_remote_copy_naming: config.keep_remote_copy_naming,
            })
    }
}

impl<'a, C: StorageClient, O: CopyObserver> CopyOrchestrator<'a, C, O> {
    /// Set the rename rules.
    pub fn with_mappings(mut self, mappings: Vec<RenameMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Set the copy options.
    pub fn with_options(mut self, options: CopyOptions) -> Self {
        self.options = options;
        self
    }

    /// Send events to `observer`.
    pub fn with_observer<P: CopyObserver>(self, observer: P) -> CopyOrchestrator<'a, C, P> {
        CopyOrchestrator {
            tree: self.tree,
            client: self.client,
            destination: self.destination,
            mappings: self.mappings,
            options: self.options,
            created: self.created,
            observer,
            report: self.report,
        }
    }

    /// Copy every work item.
    ///
    /// `total` is the item count computed from the selection;
    /// `on_progress(processed, total)` is called after each folder or file.
    pub async fn run(
        mut self,
        work_items: &[WorkItem],
        total: usize,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<CopyReport, CopyError> {
        let tree = self.tree;
        self.report.total = total;

        let mut stack: Vec<(&'a Node, bool)> = Vec::with_capacity(work_items.len());
        for item in work_items.iter().rev() {
            let node = tree.get(&item.node_id).ok_or_else(|| CopyError::UnknownNode {
                id: item.node_id.clone(),
            })?;
            stack.push((node, item.include_children));
        }

        info!(
            target: "graft::copy",
            items = work_items.len(),
            total,
            destination = %self.destination,
            "starting copy"
        );

        while let Some((node, include_children)) = stack.pop() {
            if let Err(err) = self.copy_node(node).await {
                self.emit(CopyEvent::Failed {
                    path: err.path().unwrap_or(node.path.as_str()).into(),
                    message: err.to_string(),
                });
                return Err(err);
            }

            self.report.processed += 1;
            on_progress(self.report.processed, total);
            self.emit(CopyEvent::Progress {
                processed: self.report.processed,
                total,
            });

            // A selected subtree is copied whole, whatever its children's
            // own recorded states.
            if include_children && node.is_folder() {
                stack.extend(node.children.iter().rev().map(|child| (child, true)));
            }
        }

        info!(target: "graft::copy", "{}", self.report.summary());
        Ok(self.report)
    }

    async fn copy_node(&mut self, node: &'a Node) -> Result<(), CopyError> {
        let parent = self.resolve_parent(node).await?;
        let name = self.target_name(node)?;

        if node.is_folder() {
            let key = FolderKey::Node(node.id.clone());
            if self.created.contains_key(&key) {
                debug!(target: "graft::copy", path = %node.path, "folder already created");
                return Ok(());
            }

            let id = self
                .client
                .create_folder(&name, &parent)
                .await
                .map_err(|source| remote_error(node, source))?;
            self.created.insert(key, id.clone());
            self.report.folders_created += 1;
            self.emit(CopyEvent::FolderCreated {
                node_id: node.id.clone(),
                path: node.path.clone(),
                name,
                id,
            });
        } else {
            let new_name = if self.options.keep_remote_copy_naming && name == node.name.as_str() {
                None
            } else {
                Some(name.as_str())
            };
            let id = self
                .client
                .copy_file(&node.id.to_remote(), &parent, new_name)
                .await
                .map_err(|source| remote_error(node, source))?;
            self.report.files_copied += 1;
            self.emit(CopyEvent::FileCopied {
                node_id: node.id.clone(),
                path: node.path.clone(),
                name,
                id,
            });
        }

        Ok(())
    }

    /// Destination folder that `node` goes into.
    ///
    /// Walks up the source parents until it reaches the destination root or
    /// a folder already created, then creates the missing folders top-down.
    /// Parents are followed by id; the path is only consulted when a node
    /// has no recorded parent but its path says it should.
    async fn resolve_parent(&mut self, node: &'a Node) -> Result<RemoteId, CopyError> {
        let tree = self.tree;
        let mut missing: Vec<&'a Node> = Vec::new();
        let mut child = node;

        let mut parent_id = loop {
            let parent = match tree.parent_of(&child.id) {
                Some(parent) => parent,
                None => {
                    let path = parent_path(&child.path);
                    if path.is_empty() {
                        break self.root_id();
                    }
                    let Some(parent) = tree.find_by_path(path).filter(|p| p.is_folder()) else {
                        self.report.fallbacks += 1;
                        self.emit(CopyEvent::ParentFallback {
                            node_id: node.id.clone(),
                            path: node.path.clone(),
                        });
                        break self.root_id();
                    };
                    parent
                }
            };
            if let Some(id) = self.created.get(&FolderKey::Node(parent.id.clone())) {
                break id.clone();
            }
            missing.push(parent);
            child = parent;
        };

        for ancestor in missing.into_iter().rev() {
            let name = self.target_name(ancestor)?;
            let id = self
                .client
                .create_folder(&name, &parent_id)
                .await
                .map_err(|source| remote_error(ancestor, source))?;
            self.created
                .insert(FolderKey::Node(ancestor.id.clone()), id.clone());
            self.report.ancestors_created += 1;
            self.emit(CopyEvent::AncestorCreated {
                node_id: ancestor.id.clone(),
                path: ancestor.path.clone(),
                name,
                id: id.clone(),
            });
            parent_id = id;
        }

        Ok(parent_id)
    }

    fn root_id(&self) -> RemoteId {
        self.created
            .get(&FolderKey::Root)
            .unwrap_or(&self.destination)
            .clone()
    }

    fn target_name(&self, node: &Node) -> Result<String, CopyError> {
        let name = apply_mappings(&node.name, &self.mappings);
        validate_name(&name).map_err(|reason| CopyError::InvalidName {
            path: node.path.clone(),
            name: name.clone(),
            reason,
        })?;
        Ok(name)
    }

    fn emit(&mut self, event: CopyEvent) {
        match &event {
            CopyEvent::FolderCreated { path, name, .. } => {
                info!(target: "graft::copy", %path, %name, "folder created");
            }
            CopyEvent::AncestorCreated { path, name, .. } => {
                debug!(target: "graft::copy", %path, %name, "parent folder created");
            }
            CopyEvent::FileCopied { path, name, .. } => {
                debug!(target: "graft::copy", %path, %name, "file copied");
            }
            CopyEvent::ParentFallback { path, .. } => {
                warn!(target: "graft::copy", %path, "parent not found in source tree; using destination root");
            }
            CopyEvent::Progress { processed, total } => {
                debug!(target: "graft::copy", processed, total, "progress");
            }
            CopyEvent::Failed { path, message } => {
                error!(target: "graft::copy", %path, "copy failed: {message}");
            }
        }
        self.observer.on_event(&event);
    }
}

fn remote_error(node: &Node, source: RemoteError) -> CopyError {
    CopyError::Remote {
        name: node.name.clone(),
        path: node.path.clone(),
        source,
    }
}
