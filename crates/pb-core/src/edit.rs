//! Pure structural edits.
//!
//! Every operation takes a tree snapshot and returns a new one, or an error
//! with the input left as it was (inputs are never mutated). Only the lists
//! on the way from the top level to the edited list are copied; all other
//! subtrees are shared with the input through their `Arc`s.

use crate::error::{EditError, EditResult};
use crate::id::NodeId;
use crate::model::{Node, Tree};
use crate::path::{self, Path};
use std::sync::Arc;

/// Insert `node` at `destination`. All but the last index must address
/// containers; the last index may equal the list length to append.
///
/// Fails with `EditFailed` if the node's subtree carries an id that is
/// already in the tree.
pub fn insert_at(tree: &Tree, destination: &[usize], node: impl Into<Arc<Node>>) -> EditResult<Tree> {
    let node = node.into();
    let incoming = node.subtree_ids();
    if let Some(dup) = find_any(tree.roots(), &incoming) {
        return Err(EditError::EditFailed(format!("id {dup} is already in the tree")));
    }
    insert_unchecked(tree, destination, node)
}

/// Insert without the duplicate-id scan. Only for nodes whose ids are known
/// to be absent from `tree`.
fn insert_unchecked(tree: &Tree, destination: &[usize], node: Arc<Node>) -> EditResult<Tree> {
    let Some((&index, parent)) = destination.split_last() else {
        return Err(EditError::invalid_path(destination, "empty path addresses no slot"));
    };

    let id = node.id();
    let (roots, ()) = rebuild(tree.roots(), parent, destination, |siblings| {
        if index > siblings.len() {
            return Err(EditError::invalid_path(destination, "insert index past end of list"));
        }
        siblings.insert(index, node);
        Ok(())
    })?;
    log::trace!("insert {id} at [{}]", Path::from(destination));
    Ok(Tree::from_list(roots))
}

/// Detach the node at `path`. The detached subtree is returned untouched.
pub fn remove_at(tree: &Tree, path: &[usize]) -> EditResult<(Tree, Arc<Node>)> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(EditError::invalid_path(path, "empty path addresses no node"));
    };

    let (roots, removed) = rebuild(tree.roots(), parent, path, |siblings| {
        if index >= siblings.len() {
            return Err(EditError::invalid_path(path, "index out of range"));
        }
        Ok(siblings.remove(index))
    })?;
    log::trace!("remove {} from [{}]", removed.id(), Path::from(path));
    Ok((Tree::from_list(roots), removed))
}

/// Move the node at `from` into the list addressed by `into` (a container
/// path, or the empty path for the top level) at `index`.
///
/// `into` and `index` are read against `tree`, the pre-removal snapshot.
/// They are renormalized against the intermediate tree before inserting, so
/// `index` keeps meaning "the gap before the node currently at `index`".
pub fn move_node(tree: &Tree, from: &[usize], into: &[usize], index: usize) -> EditResult<Tree> {
    let from = Path::from(from);
    let into = Path::from(into);
    path::resolve(tree, &from)?;

    if into == from.parent() && Some(index) == from.last() {
        return Err(EditError::InvalidMove {
            from,
            into: into.child(index),
        });
    }
    if from.is_prefix_of(&into) {
        return Err(EditError::InvalidMove { from, into });
    }

    let destination = into.child(index);
    path::resolve_slot(tree, &destination)?;

    let (intermediate, moved) = remove_at(tree, &from)?;
    let Some(renormalized) = path::renormalize_after_removal(&destination, &from) else {
        return Err(EditError::EditFailed(format!(
            "destination [{destination}] vanished with [{from}]"
        )));
    };

    let id = moved.id();
    // The moved subtree's ids left `tree` with it, so no duplicate scan.
    let moved_tree = insert_unchecked(&intermediate, &renormalized, moved).map_err(|err| {
        EditError::EditFailed(format!("reinserting {id} at [{renormalized}]: {err}"))
    })?;
    log::debug!("moved {id} from [{from}] to [{renormalized}]");
    Ok(moved_tree)
}

/// Replace one property of the node at `path`.
pub fn set_property(
    tree: &Tree,
    path: &[usize],
    key: &str,
    value: serde_json::Value,
) -> EditResult<Tree> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(EditError::invalid_path(path, "empty path addresses no node"));
    };

    let (roots, ()) = rebuild(tree.roots(), parent, path, |siblings| {
        let current = siblings
            .get(index)
            .ok_or_else(|| EditError::invalid_path(path, "index out of range"))?;
        let mut updated = Node::clone(current);
        updated.properties_mut().insert(key.to_string(), value);
        siblings[index] = Arc::new(updated);
        Ok(())
    })?;
    Ok(Tree::from_list(roots))
}

/// First id of `wanted` found in `list`'s subtrees, stopping at the first hit.
fn find_any(list: &[Arc<Node>], wanted: &[NodeId]) -> Option<NodeId> {
    list.iter().find_map(|node| {
        if wanted.contains(&node.id()) {
            return Some(node.id());
        }
        find_any(node.children().unwrap_or_default(), wanted)
    })
}

/// Copy the list at `parent` (descending from `list`), apply `edit` to the
/// copy, then rebuild each ancestor with its new children. Lists off the
/// path are shared, not copied.
fn rebuild<R>(
    list: &[Arc<Node>],
    parent: &[usize],
    full: &[usize],
    edit: impl FnOnce(&mut Vec<Arc<Node>>) -> EditResult<R>,
) -> EditResult<(Vec<Arc<Node>>, R)> {
    let Some((&index, rest)) = parent.split_first() else {
        let mut siblings = list.to_vec();
        let out = edit(&mut siblings)?;
        return Ok((siblings, out));
    };

    let node = list
        .get(index)
        .ok_or_else(|| EditError::invalid_path(full, "ancestor index out of range"))?;
    let children = node
        .children()
        .ok_or_else(|| EditError::invalid_path(full, "ancestor is not a container"))?;
    let (children, out) = rebuild(children, rest, full, edit)?;

    let mut siblings = list.to_vec();
    siblings[index] = Arc::new(node.with_children(children));
    Ok((siblings, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::NodeKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn text(s: &str) -> Node {
        Node::new(id(s), NodeKind::Text)
    }

    fn top_ids(tree: &Tree) -> Vec<&str> {
        tree.roots().iter().map(|n| n.id().as_str()).collect()
    }

    fn child_ids<'a>(tree: &'a Tree, container: &[usize]) -> Vec<&'a str> {
        path::children_of(tree, container)
            .unwrap()
            .iter()
            .map(|n| n.id().as_str())
            .collect()
    }

    #[test]
    fn insert_shifts_later_siblings() {
        let tree = Tree::from_nodes(vec![text("e_a"), text("e_b")]);
        let next = insert_at(&tree, &[1], text("e_new")).unwrap();
        assert_eq!(top_ids(&next), vec!["e_a", "e_new", "e_b"]);
        // Input snapshot untouched.
        assert_eq!(top_ids(&tree), vec!["e_a", "e_b"]);
    }

    #[test]
    fn insert_appends_at_length() {
        let tree = Tree::from_nodes(vec![Node::container(id("e_box"), vec![text("e_1")])]);
        let next = insert_at(&tree, &[0, 1], text("e_2")).unwrap();
        assert_eq!(child_ids(&next, &[0]), vec!["e_1", "e_2"]);
    }

    #[test]
    fn insert_into_non_container_fails() {
        let tree = Tree::from_nodes(vec![text("e_leaf")]);
        let err = insert_at(&tree, &[0, 0], text("e_x")).unwrap_err();
        assert!(matches!(err, EditError::InvalidPath { .. }));
    }

    #[test]
    fn insert_refuses_duplicate_ids() {
        let tree = Tree::from_nodes(vec![text("e_dup")]);
        let err = insert_at(&tree, &[1], text("e_dup")).unwrap_err();
        assert!(matches!(err, EditError::EditFailed(_)));
    }

    #[test]
    fn insert_refuses_duplicate_deep_in_either_subtree() {
        let tree = Tree::from_nodes(vec![Node::container(
            id("e_outer"),
            vec![Node::container(id("e_mid"), vec![text("e_leaf")])],
        )]);
        let incoming = Node::container(id("e_fresh"), vec![text("e_leaf")]);
        let err = insert_at(&tree, &[1], incoming).unwrap_err();
        assert_eq!(err, EditError::EditFailed("id e_leaf is already in the tree".into()));

        // Moving a subtree reinserts its own ids and is not a duplicate.
        let tree = insert_at(&tree, &[1], Node::new(id("e_box"), NodeKind::Container)).unwrap();
        let next = move_node(&tree, &[0, 0], &[1], 0).unwrap();
        assert_eq!(child_ids(&next, &[1]), vec!["e_mid"]);
        assert_eq!(next.node_count(), tree.node_count());
    }

    #[test]
    fn insert_shares_untouched_subtrees() {
        let tree = Tree::from_nodes(vec![
            Node::container(id("s_left"), vec![text("s_l1")]),
            Node::container(id("s_right"), vec![text("s_r1")]),
        ]);
        let next = insert_at(&tree, &[1, 1], text("s_r2")).unwrap();
        assert!(Arc::ptr_eq(&tree.roots()[0], &next.roots()[0]));
        assert!(!Arc::ptr_eq(&tree.roots()[1], &next.roots()[1]));
    }

    #[test]
    fn remove_returns_detached_subtree() {
        let tree = Tree::from_nodes(vec![
            Node::container(id("r_box"), vec![text("r_inner")]),
            text("r_after"),
        ]);
        let (next, removed) = remove_at(&tree, &[0]).unwrap();
        assert_eq!(top_ids(&next), vec!["r_after"]);
        assert_eq!(removed.id(), id("r_box"));
        assert_eq!(removed.children().unwrap()[0].id(), id("r_inner"));
    }

    #[test]
    fn remove_out_of_range_fails() {
        let tree = Tree::from_nodes(vec![text("r_only")]);
        assert!(matches!(
            remove_at(&tree, &[1]),
            Err(EditError::InvalidPath { .. })
        ));
    }

    #[test]
    fn move_forward_in_same_list_renormalizes() {
        let tree = Tree::from_nodes(vec![text("m_a"), text("m_b"), text("m_c")]);
        // Gap 2 is "before m_c"; after m_a leaves, that gap is index 1.
        let next = move_node(&tree, &[0], &[], 2).unwrap();
        assert_eq!(top_ids(&next), vec!["m_b", "m_a", "m_c"]);
        // Gap 3 is the end of the list.
        let next = move_node(&tree, &[0], &[], 3).unwrap();
        assert_eq!(top_ids(&next), vec!["m_b", "m_c", "m_a"]);
    }

    #[test]
    fn move_backward_needs_no_adjustment() {
        let tree = Tree::from_nodes(vec![text("mb_a"), text("mb_b"), text("mb_c")]);
        let next = move_node(&tree, &[2], &[], 0).unwrap();
        assert_eq!(top_ids(&next), vec!["mb_c", "mb_a", "mb_b"]);
    }

    #[test]
    fn move_into_later_sibling_container_renormalizes_ancestor() {
        // [x, box{y}] — moving x into box: box shifts from 1 to 0.
        let tree = Tree::from_nodes(vec![
            text("ma_x"),
            Node::container(id("ma_box"), vec![text("ma_y")]),
        ]);
        let next = move_node(&tree, &[0], &[1], 1).unwrap();
        assert_eq!(top_ids(&next), vec!["ma_box"]);
        assert_eq!(child_ids(&next, &[0]), vec!["ma_y", "ma_x"]);
    }

    #[test]
    fn move_refuses_self_and_descendants() {
        let tree = Tree::from_nodes(vec![Node::container(
            id("mc_outer"),
            vec![Node::container(id("mc_inner"), vec![])],
        )]);
        assert!(matches!(
            move_node(&tree, &[0], &[0], 0),
            Err(EditError::InvalidMove { .. })
        ));
        assert!(matches!(
            move_node(&tree, &[0], &[0, 0], 0),
            Err(EditError::InvalidMove { .. })
        ));
    }

    #[test]
    fn move_onto_own_slot_is_refused() {
        let tree = Tree::from_nodes(vec![text("mn_a"), text("mn_b")]);
        assert!(matches!(
            move_node(&tree, &[1], &[], 1),
            Err(EditError::InvalidMove { .. })
        ));
    }

    #[test]
    fn move_to_missing_destination_fails() {
        let tree = Tree::from_nodes(vec![text("md_a"), text("md_b")]);
        assert!(matches!(
            move_node(&tree, &[0], &[5], 0),
            Err(EditError::InvalidPath { .. })
        ));
        assert!(matches!(
            move_node(&tree, &[0], &[], 9),
            Err(EditError::InvalidPath { .. })
        ));
    }

    #[test]
    fn set_property_replaces_one_node() {
        let tree = Tree::from_nodes(vec![Node::container(id("p_box"), vec![text("p_label")])]);
        let next = set_property(&tree, &[0, 0], "content", json!("Hello")).unwrap();
        let label = next.get(&[0, 0]).unwrap();
        assert_eq!(label.properties().get("content"), Some(&json!("Hello")));
        assert!(tree.get(&[0, 0]).unwrap().properties().is_empty());
    }
}
