//! Structural paths and the path resolver.
//!
//! A [`Path`] is a list of child indices descended from the top level. It is
//! a coordinate into one specific [`Tree`] snapshot and goes stale after any
//! structural edit; code that holds a position across an edit keeps the
//! [`NodeId`] and re-resolves it with [`locate`].

use crate::error::{EditError, EditResult};
use crate::id::NodeId;
use crate::model::{Node, Tree};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

// ─── Path ────────────────────────────────────────────────────────────────

/// Index sequence locating a node within one tree snapshot.
/// The empty path addresses the top-level list itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(SmallVec<[usize; 8]>);

impl Path {
    /// The empty path (top level).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the containing list: all but the last index.
    pub fn parent(&self) -> Path {
        match self.0.split_last() {
            Some((_, rest)) => Path::from(rest),
            None => Path::root(),
        }
    }

    /// Index within the containing list.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// This path extended by one child index.
    pub fn child(&self, index: usize) -> Path {
        let mut next = self.clone();
        next.0.push(index);
        next
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.0.pop()
    }

    /// `self` equals `other` or is an ancestor of it.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// `self` is a proper ancestor of `other`.
    pub fn is_strict_prefix_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Path(SmallVec::from_slice(indices))
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Path(SmallVec::from_vec(indices))
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Path::from(&indices[..])
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

// ─── Resolution ──────────────────────────────────────────────────────────

/// A resolved read location: the containing list, the index in it, and the
/// node found there.
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    pub siblings: &'a [Arc<Node>],
    pub index: usize,
    pub node: &'a Arc<Node>,
}

/// Resolve `path` for reading. Every prefix must address a container and the
/// final index must be in range.
pub fn resolve<'a>(tree: &'a Tree, path: &[usize]) -> EditResult<Location<'a>> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(EditError::invalid_path(path, "empty path addresses no node"));
    };
    let siblings = descend(tree, parent, path)?;
    let node = siblings
        .get(index)
        .ok_or_else(|| EditError::invalid_path(path, "index out of range"))?;
    Ok(Location {
        siblings,
        index,
        node,
    })
}

/// Resolve `path` as an insertion slot. Like [`resolve`], but the final index
/// may equal the list length, meaning "append".
pub fn resolve_slot<'a>(tree: &'a Tree, path: &[usize]) -> EditResult<(&'a [Arc<Node>], usize)> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(EditError::invalid_path(path, "empty path addresses no slot"));
    };
    let siblings = descend(tree, parent, path)?;
    if index > siblings.len() {
        return Err(EditError::invalid_path(path, "insert index past end of list"));
    }
    Ok((siblings, index))
}

/// The list addressed by a container path. The empty path is the top level.
pub fn children_of<'a>(tree: &'a Tree, container: &[usize]) -> EditResult<&'a [Arc<Node>]> {
    descend(tree, container, container)
}

/// Walk `prefix` from the top level, returning the children list of the node
/// it ends at. `full` is only used for error reporting.
fn descend<'a>(tree: &'a Tree, prefix: &[usize], full: &[usize]) -> EditResult<&'a [Arc<Node>]> {
    let mut list = tree.roots();
    for &index in prefix {
        let node = list
            .get(index)
            .ok_or_else(|| EditError::invalid_path(full, "ancestor index out of range"))?;
        list = node
            .children()
            .ok_or_else(|| EditError::invalid_path(full, "ancestor is not a container"))?;
    }
    Ok(list)
}

/// Depth-first, pre-order search for `id`.
pub fn locate(tree: &Tree, id: NodeId) -> EditResult<Path> {
    let mut path = Path::root();
    if locate_in(tree.roots(), id, &mut path) {
        Ok(path)
    } else {
        Err(EditError::NotFound(id))
    }
}

fn locate_in(list: &[Arc<Node>], id: NodeId, path: &mut Path) -> bool {
    for (i, node) in list.iter().enumerate() {
        path.push(i);
        if node.id() == id {
            return true;
        }
        if let Some(children) = node.children()
            && locate_in(children, id, path)
        {
            return true;
        }
        path.pop();
    }
    false
}

// ─── Renormalization ─────────────────────────────────────────────────────

/// Rewrite a path computed before `removed` was taken out of the tree so it
/// addresses the same place afterwards.
///
/// Removing the node at `removed` shifts its later siblings down by one. Any
/// path that passes through the removed node's parent list at a later index
/// has that component decremented, whatever its depth. Paths that run
/// through the removed node itself have no post-removal counterpart and
/// yield `None`.
pub fn renormalize_after_removal(path: &Path, removed: &Path) -> Option<Path> {
    let Some((&removed_index, removed_parent)) = removed.split_last() else {
        return Some(path.clone());
    };
    let depth = removed_parent.len();
    if path.len() <= depth || !path.starts_with(removed_parent) {
        return Some(path.clone());
    }

    let mut out = path.clone();
    match path[depth].cmp(&removed_index) {
        std::cmp::Ordering::Less => {}
        std::cmp::Ordering::Equal => return None,
        std::cmp::Ordering::Greater => out.0[depth] -= 1,
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    /// `[card{ title, body{ img } }, footer]`
    fn sample() -> Tree {
        Tree::from_nodes(vec![
            Node::container(
                id("card"),
                vec![
                    Node::new(id("title"), NodeKind::Text),
                    Node::container(id("body"), vec![Node::new(id("img"), NodeKind::Image)]),
                ],
            ),
            Node::new(id("footer"), NodeKind::Button),
        ])
    }

    #[test]
    fn resolve_nested_node() {
        let tree = sample();
        let loc = resolve(&tree, &[0, 1, 0]).unwrap();
        assert_eq!(loc.node.id(), id("img"));
        assert_eq!(loc.index, 0);
        assert_eq!(loc.siblings.len(), 1);
    }

    #[test]
    fn resolve_rejects_bad_paths() {
        let tree = sample();
        assert!(matches!(resolve(&tree, &[]), Err(EditError::InvalidPath { .. })));
        assert!(matches!(resolve(&tree, &[2]), Err(EditError::InvalidPath { .. })));
        // `footer` is a button, it cannot be descended into.
        assert!(matches!(resolve(&tree, &[1, 0]), Err(EditError::InvalidPath { .. })));
        assert!(matches!(resolve(&tree, &[0, 5, 0]), Err(EditError::InvalidPath { .. })));
    }

    #[test]
    fn slot_may_equal_length() {
        let tree = sample();
        let (list, index) = resolve_slot(&tree, &[0, 2]).unwrap();
        assert_eq!((list.len(), index), (2, 2));
        assert!(resolve_slot(&tree, &[0, 3]).is_err());
        assert!(resolve(&tree, &[0, 2]).is_err());
    }

    #[test]
    fn locate_finds_nested_ids() {
        let tree = sample();
        assert_eq!(locate(&tree, id("img")).unwrap(), Path::from([0, 1, 0]));
        assert_eq!(locate(&tree, id("footer")).unwrap(), Path::from([1]));
        assert_eq!(
            locate(&tree, id("missing")),
            Err(EditError::NotFound(id("missing")))
        );
    }

    #[test]
    fn prefix_relations() {
        let a = Path::from([0, 1]);
        let b = Path::from([0, 1, 3]);
        assert!(a.is_prefix_of(&b));
        assert!(a.is_strict_prefix_of(&b));
        assert!(a.is_prefix_of(&a));
        assert!(!a.is_strict_prefix_of(&a));
        // Numeric, not textual: [1] is not a prefix of [10].
        assert!(!Path::from([1]).is_prefix_of(&Path::from([10])));
        assert_eq!(b.parent(), a);
        assert_eq!(b.to_string(), "0 > 1 > 3");
    }

    #[test]
    fn renormalize_shifts_later_siblings_at_any_depth() {
        let removed = Path::from([0, 1]);
        // Same list, later index.
        assert_eq!(
            renormalize_after_removal(&Path::from([0, 3]), &removed),
            Some(Path::from([0, 2]))
        );
        // Deeper path through a later sibling.
        assert_eq!(
            renormalize_after_removal(&Path::from([0, 2, 4]), &removed),
            Some(Path::from([0, 1, 4]))
        );
        // Earlier sibling and unrelated branch are untouched.
        assert_eq!(
            renormalize_after_removal(&Path::from([0, 0, 2]), &removed),
            Some(Path::from([0, 0, 2]))
        );
        assert_eq!(
            renormalize_after_removal(&Path::from([1, 5]), &removed),
            Some(Path::from([1, 5]))
        );
        // Ancestors are untouched; the removed subtree has no image.
        assert_eq!(
            renormalize_after_removal(&Path::from([0]), &removed),
            Some(Path::from([0]))
        );
        assert_eq!(renormalize_after_removal(&Path::from([0, 1, 0]), &removed), None);
    }
}
