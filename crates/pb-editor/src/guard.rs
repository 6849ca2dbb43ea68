//! Published document and the backup/rollback guard.
//!
//! The `Document` is the single tree snapshot renderers read. Edits never
//! touch it directly: they run inside [`apply`], which holds the pre-edit
//! snapshot and either publishes the edited tree or puts the snapshot back.

use pb_core::{EditResult, Tree};

/// The tree currently published to renderers.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tree: Tree,
    /// Bumped on every publish so renderers can tell a new snapshot apart.
    revision: u64,
}

impl Document {
    pub fn new(tree: Tree) -> Self {
        Self { tree, revision: 0 }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn publish(&mut self, tree: Tree) {
        self.tree = tree;
        self.revision += 1;
    }
}

/// Retains the pre-edit snapshot for the duration of one edit.
///
/// Holding the snapshot costs one reference count: trees are immutable and
/// share structure, so no deep copy is made.
#[must_use = "a guard must be committed or restored"]
pub struct BackupGuard {
    snapshot: Tree,
}

impl BackupGuard {
    pub fn take(doc: &Document) -> Self {
        Self {
            snapshot: doc.tree.clone(),
        }
    }

    pub fn snapshot(&self) -> &Tree {
        &self.snapshot
    }

    /// Publish the edited tree.
    pub fn commit(self, doc: &mut Document, tree: Tree) {
        doc.publish(tree);
    }

    /// Put the snapshot back as the published tree.
    pub fn restore(self, doc: &mut Document) {
        if !doc.tree.ptr_eq(&self.snapshot) {
            log::debug!("restoring snapshot over revision {}", doc.revision);
            doc.publish(self.snapshot);
        }
    }
}

/// Run `edit` against the published tree, all-or-nothing.
///
/// On success the new tree is published and the edit's extra output is
/// returned. On failure the pre-edit snapshot stays published and the error
/// is returned once; it is never retried.
pub fn apply<T>(doc: &mut Document, edit: impl FnOnce(&Tree) -> EditResult<(Tree, T)>) -> EditResult<T> {
    let guard = BackupGuard::take(doc);
    match edit(guard.snapshot()) {
        Ok((tree, out)) => {
            guard.commit(doc, tree);
            Ok(out)
        }
        Err(err) => {
            log::warn!("edit rolled back: {err}");
            guard.restore(doc);
            Err(err)
        }
    }
}
