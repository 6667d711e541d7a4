//! Error types for cross-section editing and validation.

use thiserror::Error;

/// Geometry and editing errors for a [`crate::Section`].
///
/// Point and edge positions are stored zero-based; messages show the
/// one-based numbers users see.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SectionError {
    /// Fewer than three points.
    #[error("section has {0} points, at least 3 are required")]
    TooFewPoints(usize),

    /// Two points coincide.
    #[error("duplicate points: {} and {}", .first + 1, .second + 1)]
    DuplicatePoints {
        /// First point slot.
        first: usize,
        /// Second point slot.
        second: usize,
    },

    /// Two implicit edges cross.
    #[error("self-intersection: edge {} crosses edge {}", .first + 1, .second + 1)]
    SelfIntersection {
        /// First edge (starting at this point slot).
        first: usize,
        /// Second edge (starting at this point slot).
        second: usize,
    },

    /// An implicit edge passes through another vertex.
    #[error("edge {} passes through point {}", .edge + 1, .vertex + 1)]
    EdgeThroughVertex {
        /// Edge starting at this point slot.
        edge: usize,
        /// Offending point slot.
        vertex: usize,
    },

    /// The centroid falls outside the polygon.
    #[error("centroid lies outside the section")]
    CentroidOutside,

    /// Point slot out of range.
    #[error("point index {index} out of range (section has {len} points)")]
    PointOutOfRange {
        /// Requested slot.
        index: usize,
        /// Number of points.
        len: usize,
    },
}

/// Result alias for section operations.
pub type Result<T> = std::result::Result<T, SectionError>;
