//! Edit errors.
//!
//! Every variant is a local, recoverable condition. Callers that publish
//! trees (the rollback guard in `pb-editor`) catch these and keep the
//! pre-edit snapshot; nothing here is fatal.

use crate::id::NodeId;
use crate::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A prefix or the final index of the path does not resolve.
    #[error("invalid path [{path}]: {reason}")]
    InvalidPath { path: Path, reason: &'static str },

    /// The destination is the moved node itself or one of its descendants.
    #[error("cannot move [{from}] into [{into}]")]
    InvalidMove { from: Path, into: Path },

    #[error("node {0} not found")]
    NotFound(NodeId),

    /// A well-formed request that could not complete (e.g. a stale path).
    #[error("edit failed: {0}")]
    EditFailed(String),
}

impl EditError {
    pub(crate) fn invalid_path(path: &[usize], reason: &'static str) -> Self {
        EditError::InvalidPath {
            path: Path::from(path),
            reason,
        }
    }
}

pub type EditResult<T> = Result<T, EditError>;
