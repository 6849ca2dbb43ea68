//! Current selection, as shown by the inspector and layer browser.

use pb_core::{EditResult, NodeId, NodeKind, Path, Tree, locate, resolve};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Path in the snapshot the selection was last resolved against.
    pub path: Path,
}

impl Selection {
    /// Select `id` in `tree`.
    pub fn of(tree: &Tree, id: NodeId) -> EditResult<Self> {
        let path = locate(tree, id)?;
        let kind = resolve(tree, &path)?.node.kind();
        Ok(Self { id, kind, path })
    }

    /// Re-resolve against a newer snapshot. `None` once the node is gone.
    pub fn refresh(&self, tree: &Tree) -> Option<Self> {
        Self::of(tree, self.id).ok()
    }
}
