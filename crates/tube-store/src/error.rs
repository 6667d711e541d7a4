//! Store error types.

use thiserror::Error;
use tube_kernel::{DeformError, TubeError};

use crate::repository::TubeId;

/// Errors raised while persisting or restoring tubes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot is not valid JSON for the record layout.
    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Record numbers or cross-references do not line up.
    #[error("inconsistent snapshot: {0}")]
    InconsistentIndices(String),

    /// No stored tube has this id.
    #[error("unknown tube id {0:?}")]
    UnknownId(TubeId),

    /// The current version has no predecessor.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The current version has no successor.
    #[error("nothing to redo")]
    NothingToRedo,

    /// The deformed tube produced no mesh.
    #[error("deformed tube has no mesh: {0}")]
    MeshFailed(String),

    /// Tube model failure.
    #[error(transparent)]
    Tube(#[from] TubeError),

    /// Deformation failure.
    #[error(transparent)]
    Deform(#[from] DeformError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
