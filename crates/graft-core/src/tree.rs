//! Source tree container and lookup indices.

use std::collections::{HashMap, HashSet};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::{LoadWarning, TreeError};
use crate::node::{join_path, Node, NodeId};

/// Where a node sits: the child-index route from the top level down to it.
type Route = Vec<usize>;

/// The loaded source hierarchy.
///
/// The shape is fixed at construction. Lookups by id, by path and by parent
/// are answered from indices built once in [`SourceTree::from_nodes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TreeRepr", into = "TreeRepr")]
pub struct SourceTree {
    roots: Vec<Node>,
    routes: HashMap<NodeId, Route>,
    by_path: HashMap<CompactString, NodeId>,
    parents: HashMap<NodeId, NodeId>,
    warnings: Vec<LoadWarning>,
}

#[derive(Serialize, Deserialize)]
struct TreeRepr {
    nodes: Vec<Node>,
    #[serde(default)]
    warnings: Vec<LoadWarning>,
}

impl TryFrom<TreeRepr> for SourceTree {
    type Error = TreeError;

    fn try_from(repr: TreeRepr) -> Result<Self, Self::Error> {
        Ok(Self::from_nodes(repr.nodes)?.with_warnings(repr.warnings))
    }
}

impl From<SourceTree> for TreeRepr {
    fn from(tree: SourceTree) -> Self {
        Self {
            nodes: tree.roots,
            warnings: tree.warnings,
        }
    }
}

impl SourceTree {
    /// Build a tree from its top-level nodes, validating the shape.
    pub fn from_nodes(roots: Vec<Node>) -> Result<Self, TreeError> {
        let mut routes = HashMap::new();
        let mut by_path = HashMap::new();
        let mut parents = HashMap::new();
        let mut seen = HashSet::new();

        let mut stack: Vec<(&Node, Route, Option<&Node>)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, node)| (node, vec![i], None))
            .collect();

        while let Some((node, route, parent)) = stack.pop() {
            if !seen.insert(node.id.clone()) {
                return Err(TreeError::DuplicateId {
                    id: node.id.clone(),
                });
            }

            let expected = join_path(parent.map(|p| p.path.as_str()).unwrap_or(""), &node.name);
            if node.path != expected {
                return Err(TreeError::PathMismatch {
                    id: node.id.clone(),
                    expected,
                    found: node.path.clone(),
                });
            }

            if node.is_file() && !node.children.is_empty() {
                return Err(TreeError::FileWithChildren {
                    id: node.id.clone(),
                });
            }

            if let Some(parent) = parent {
                parents.insert(node.id.clone(), parent.id.clone());
            }
            // First occurrence wins when two siblings share a name.
            by_path
                .entry(node.path.clone())
                .or_insert_with(|| node.id.clone());

            for (i, child) in node.children.iter().enumerate().rev() {
                let mut child_route = route.clone();
                child_route.push(i);
                stack.push((child, child_route, Some(node)));
            }

            routes.insert(node.id.clone(), route);
        }

        Ok(Self {
            roots,
            routes,
            by_path,
            parents,
            warnings: Vec::new(),
        })
    }

    /// An empty tree.
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            routes: HashMap::new(),
            by_path: HashMap::new(),
            parents: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Attach warnings collected while loading.
    pub fn with_warnings(mut self, warnings: Vec<LoadWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Top-level nodes in display order.
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Look up a node by id.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        let route = self.routes.get(id)?;
        let (first, rest) = route.split_first()?;
        let mut node = self.roots.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Check if a node id belongs to this tree.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.routes.contains_key(id)
    }

    /// Look up a node by its root-relative path.
    pub fn find_by_path(&self, path: &str) -> Option<&Node> {
        let path = path.trim_matches('/');
        self.by_path.get(path).and_then(|id| self.get(id))
    }

    /// Parent node of `id`, or `None` for top-level nodes and unknown ids.
    pub fn parent_of(&self, id: &NodeId) -> Option<&Node> {
        self.parents.get(id).and_then(|parent| self.get(parent))
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.routes.len()
    }

    /// Check if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterate over every node in pre-order.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Ids of every node strictly below `id`, in pre-order.
    pub fn descendant_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        let mut stack: Vec<&Node> = node.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            ids.push(node.id.clone());
            stack.extend(node.children.iter().rev());
        }
        ids
    }

    /// Warnings collected while loading this tree.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Check if there were any warnings during loading.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::empty()
    }
}

/// Pre-order iterator over a [`SourceTree`].
pub struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SourceTree {
        SourceTree::from_nodes(vec![
            Node::new_folder("A", "A", "").with_children(vec![
                Node::new_folder("B", "B", "A")
                    .with_children(vec![Node::new_file("b1", "b1", "A/B")]),
                Node::new_file("a1", "a1", "A"),
            ]),
            Node::new_file("top", "top.txt", ""),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let tree = sample();
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.get(&"b1".into()).unwrap().path, "A/B/b1");
        assert_eq!(tree.find_by_path("A/B").unwrap().id, NodeId::new("B"));
        assert_eq!(tree.parent_of(&"b1".into()).unwrap().id, NodeId::new("B"));
        assert!(tree.parent_of(&"A".into()).is_none());
        assert!(tree.get(&"missing".into()).is_none());
    }

    #[test]
    fn test_pre_order() {
        let tree = sample();
        let ids: Vec<&str> = tree.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "b1", "a1", "top"]);
        let below: Vec<NodeId> = tree.descendant_ids(&"A".into());
        assert_eq!(below, vec![NodeId::new("B"), "b1".into(), "a1".into()]);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = SourceTree::from_nodes(vec![
            Node::new_file("x", "one", ""),
            Node::new_file("x", "two", ""),
        ])
        .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateId { .. }));
    }

    #[test]
    fn test_rejects_bad_path() {
        let mut child = Node::new_file("c", "c", "A");
        child.path = "elsewhere/c".into();
        let err = SourceTree::from_nodes(vec![
            Node::new_folder("A", "A", "").with_children(vec![child]),
        ])
        .unwrap_err();
        assert!(matches!(err, TreeError::PathMismatch { .. }));
    }
}
