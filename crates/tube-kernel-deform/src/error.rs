//! Error types for deformation.

use thiserror::Error;

/// Errors from the deformation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeformError {
    /// A deformation point has non-finite values or out-of-range parameters.
    #[error("deformation point is not valid")]
    InvalidPoint,

    /// Deformation point index out of range.
    #[error("deformation point {index} out of range (engine has {len})")]
    PointOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of points.
        len: usize,
    },

    /// Source and target lists differ in length.
    #[error("{sources} source points but {targets} target points")]
    MismatchedPoints {
        /// Number of sources.
        sources: usize,
        /// Number of targets.
        targets: usize,
    },

    /// Engine settings are unusable.
    #[error("invalid engine settings: {0}")]
    InvalidSettings(String),
}

/// Result alias for deformation operations.
pub type Result<T> = std::result::Result<T, DeformError>;
