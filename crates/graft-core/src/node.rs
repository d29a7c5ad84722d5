//! Source node types.

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Opaque identifier of a node in the source tree.
///
/// Unique within one loaded tree. It is the id the storage service
/// assigned to the object, so it can be handed back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub CompactString);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The remote object this node was loaded from.
    pub fn to_remote(&self) -> RemoteId {
        RemoteId(self.0.clone())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Opaque identifier of an object held by the storage service.
///
/// Used for destination folders and for anything returned by create/copy
/// calls, which never become part of the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub CompactString);

impl RemoteId {
    /// Create a new RemoteId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check if the id is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Type of source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Folder.
    Folder,
}

impl NodeKind {
    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, NodeKind::Folder)
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }
}

/// A single file or folder in the source hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: NodeId,

    /// File/folder name (not full path).
    pub name: CompactString,

    /// File or folder.
    pub kind: NodeKind,

    /// Slash-joined ancestor names plus this node's name, root-relative.
    pub path: CompactString,

    /// Children (folders only), folders first then by name.
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new file node under `parent_path` ("" for the root level).
    pub fn new_file(
        id: impl Into<NodeId>,
        name: impl Into<CompactString>,
        parent_path: &str,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            path: join_path(parent_path, &name),
            name,
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    /// Create a new, empty folder node under `parent_path`.
    pub fn new_folder(
        id: impl Into<NodeId>,
        name: impl Into<CompactString>,
        parent_path: &str,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            path: join_path(parent_path, &name),
            name,
            kind: NodeKind::Folder,
            children: Vec::new(),
        }
    }

    /// Builder-style helper to attach children to a folder.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Check if this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// True for files and for folders without children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Path of the parent folder; empty at the root level.
    pub fn parent_path(&self) -> &str {
        parent_path(&self.path)
    }

    /// Total number of nodes in this subtree, including this node.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Sort children folder-first then by name, recursively.
    pub fn sort_children(&mut self) {
        sort_nodes(&mut self.children);
        for child in &mut self.children {
            child.sort_children();
        }
    }
}

/// Join a parent path and a name.
pub fn join_path(parent: &str, name: &str) -> CompactString {
    if parent.is_empty() {
        CompactString::from(name)
    } else {
        let mut path = CompactString::with_capacity(parent.len() + 1 + name.len());
        path.push_str(parent);
        path.push('/');
        path.push_str(name);
        path
    }
}

/// Strip the last segment of a path. Returns "" for root-level paths.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Sort sibling nodes: folders first, then lexicographically by name.
pub fn sort_nodes(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name.cmp(&b.name))
    });
}
