//! Error types for segment construction.

use thiserror::Error;

/// Why two sections could not be connected, or a segment edit failed.
///
/// Construction failure is an expected outcome: callers surface it and may
/// insert an intermediate section.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    /// One of the sections has no points.
    #[error("section {} has no points", .0 + 1)]
    EmptySection(usize),

    /// A segment must join two different sections.
    #[error("a segment cannot join section {} to itself", .0 + 1)]
    SameSection(usize),

    /// The boundaries still cross after shrinking to the minimum scale.
    #[error("section boundaries still overlap after scaling to {scale:.3}")]
    ScalingExhausted {
        /// Cumulative scale reached.
        scale: f32,
    },

    /// Polar matching produced no usable edge.
    #[error("no lateral edges could be built")]
    NoEdges,

    /// Some vertex is touched by more than one lateral edge on both sides.
    #[error("vertex {} of section {} is touched by {edges} lateral edges", .vertex + 1, .section + 1)]
    UnresolvedConnectivity {
        /// Section position.
        section: usize,
        /// Point slot.
        vertex: usize,
        /// Number of touching edges.
        edges: usize,
    },

    /// Lateral edges cross the boundary of the reference section.
    #[error("{count} lateral edges cross the boundary of section {}", .section + 1)]
    ResidualIntersection {
        /// Section position.
        section: usize,
        /// Number of offending crossings.
        count: usize,
    },

    /// Both processing orders failed.
    #[error("sections {} and {} cannot be connected ({first}; reversed: {second})", .start + 1, .end + 1)]
    Unconnectable {
        /// Start section position.
        start: usize,
        /// End section position.
        end: usize,
        /// Failure of the canonical order.
        first: Box<SegmentError>,
        /// Failure of the swapped order.
        second: Box<SegmentError>,
    },

    /// Edge index out of range.
    #[error("edge index {index} out of range (segment has {len} edges)")]
    EdgeOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of edges.
        len: usize,
    },

    /// Connection settings are unusable.
    #[error("invalid connection settings: {0}")]
    InvalidSettings(String),
}

/// Result alias for segment operations.
pub type Result<T> = std::result::Result<T, SegmentError>;
