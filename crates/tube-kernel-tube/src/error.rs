//! Error types for tube editing and construction.

use thiserror::Error;
use tube_kernel_section::SectionError;
use tube_kernel_segment::SegmentError;

/// Errors from tube operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TubeError {
    /// A section failed validation.
    #[error("invalid section: {0}")]
    Section(#[from] SectionError),

    /// Segment construction or editing failed.
    #[error(transparent)]
    Segment(#[from] SegmentError),

    /// Section position out of range.
    #[error("section {} does not exist (tube has {len} sections)", .index + 1)]
    SectionOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of sections.
        len: usize,
    },

    /// Segment position out of range.
    #[error("segment {} does not exist (tube has {len} segments)", .index + 1)]
    SegmentOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of segments.
        len: usize,
    },

    /// The operation needs at least two sections.
    #[error("at least 2 sections are required, tube has {0}")]
    TooFewSections(usize),

    /// A segment must join two distinct, existing sections.
    #[error("invalid connection between sections {} and {}", .start + 1, .end + 1)]
    InvalidConnection {
        /// Start section position.
        start: usize,
        /// End section position.
        end: usize,
    },
}

/// Result alias for tube operations.
pub type Result<T> = std::result::Result<T, TubeError>;
