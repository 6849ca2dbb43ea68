//! Layout tree data model.
//!
//! A page is an ordered list of root-level [`Node`]s. Only containers hold
//! children. Every list is `Arc`-shared, so a [`Tree`] value is an immutable
//! snapshot: edits in [`crate::edit`] rebuild the chain of ancestors above
//! the touched list and share every other subtree with the input.

use crate::id::NodeId;
use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque per-node properties. The engine never interprets them.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// A shared, ordered list of sibling nodes.
pub type NodeList = Arc<Vec<Arc<Node>>>;

// ─── Node kind ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Text,
    Image,
    Button,
    /// The only kind that may carry children.
    Container,
}

impl NodeKind {
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Container)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Image => "image",
            NodeKind::Button => "button",
            NodeKind::Container => "container",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A single entry in the layout tree.
///
/// Fields are private so that a non-container can never be given children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    properties: Properties,
    children: Option<NodeList>,
}

impl Node {
    /// Create a node with no properties. Containers start with an empty
    /// children list, every other kind with none.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            properties: Properties::new(),
            children: kind.is_container().then(NodeList::default),
        }
    }

    /// Create a container holding `children`.
    pub fn container(id: NodeId, children: Vec<Node>) -> Self {
        Self {
            id,
            kind: NodeKind::Container,
            properties: Properties::new(),
            children: Some(Arc::new(children.into_iter().map(Arc::new).collect())),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Children of a container; `None` for every other kind.
    pub fn children(&self) -> Option<&[Arc<Node>]> {
        self.children.as_deref().map(Vec::as_slice)
    }

    /// Shallow copy of this node with its children list replaced.
    /// Only meaningful for containers; callers guarantee that.
    pub(crate) fn with_children(&self, children: Vec<Arc<Node>>) -> Self {
        debug_assert!(self.is_container());
        Self {
            id: self.id,
            kind: self.kind,
            properties: self.properties.clone(),
            children: Some(Arc::new(children)),
        }
    }

    pub(crate) fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// Pre-order ids of this node and its whole subtree.
    pub fn subtree_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        collect_ids(self, &mut out);
        out
    }
}

fn collect_ids(node: &Node, out: &mut Vec<NodeId>) {
    out.push(node.id);
    for child in node.children().unwrap_or_default() {
        collect_ids(child, out);
    }
}

// ─── Tree ────────────────────────────────────────────────────────────────

/// An immutable layout tree snapshot. Cloning is O(1).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    roots: NodeList,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            roots: Arc::new(nodes.into_iter().map(Arc::new).collect()),
        }
    }

    pub(crate) fn from_list(roots: Vec<Arc<Node>>) -> Self {
        Self {
            roots: Arc::new(roots),
        }
    }

    /// Root-level nodes, in order.
    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    /// Number of root-level nodes.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes at every depth.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }

    /// Every id in the tree, pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for root in self.roots() {
            collect_ids(root, &mut out);
        }
        out
    }

    pub fn contains(&self, id: NodeId) -> bool {
        crate::path::locate(self, id).is_ok()
    }

    /// Read the node at `path`, if it resolves.
    pub fn get(&self, path: &[usize]) -> Option<&Arc<Node>> {
        crate::path::resolve(self, path).ok().map(|loc| loc.node)
    }

    /// Visit every node pre-order together with its path in this snapshot.
    pub fn walk(&self, mut visit: impl FnMut(&Path, &Node)) {
        let mut path = Path::root();
        walk_list(self.roots(), &mut path, &mut visit);
    }

    /// True if both snapshots share the same root list allocation.
    pub fn ptr_eq(&self, other: &Tree) -> bool {
        Arc::ptr_eq(&self.roots, &other.roots)
    }
}

fn walk_list(list: &[Arc<Node>], path: &mut Path, visit: &mut impl FnMut(&Path, &Node)) {
    for (i, node) in list.iter().enumerate() {
        path.push(i);
        visit(path, node);
        if let Some(children) = node.children() {
            walk_list(children, path, visit);
        }
        path.pop();
    }
}
