#![warn(missing_docs)]

//! Lateral surface construction between two cross-sections.
//!
//! [`Segment::connect`] joins two sections of arbitrary shape and point
//! count with non-crossing lateral edges. The sections are flattened and
//! centred together, the first is shrunk until the outlines separate, and
//! vertices are matched by polar angle. Vertices without a partner are
//! wired to the other outline where a ray at their angle leaves it.
//!
//! When one processing order fails the other is tried; if both fail the
//! pair is reported as [`SegmentError::Unconnectable`].
//!
//! ```
//! use tube_kernel_section::Section;
//! use tube_kernel_segment::{ConnectSettings, Segment};
//!
//! let a = Section::from_xy(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)], 0.0);
//! let b = Section::from_xy(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)], 5.0);
//! let seg = Segment::connect(0, &a, 1, &b, &ConnectSettings::default()).unwrap();
//! assert_eq!(seg.edge_count(), 4);
//! ```

mod connect;
mod error;
mod polar;
mod segment;
mod settings;

pub use error::{Result, SegmentError};
pub use segment::{GeometryRefresh, Segment};
pub use settings::ConnectSettings;
