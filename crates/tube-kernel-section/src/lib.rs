#![warn(missing_docs)]

//! Cross-sections for the tube kernel.
//!
//! A [`Section`] is an ordered, implicitly closed polygon of points sharing
//! one Z value. Sections own their validation (duplicates, self-crossing
//! edges, edges through vertices, centroid containment) and their rigid
//! transforms. [`Edge`] and [`Anchor`] describe connections between points
//! and where each endpoint came from.
//!
//! # Example
//!
//! ```
//! use tube_kernel_section::Section;
//!
//! let square = Section::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)], 10.0);
//! assert!(square.validate().is_ok());
//! assert_eq!(square.implicit_edges(0).len(), 4);
//! ```

mod edge;
mod error;
mod point;
mod section;

pub use edge::{Anchor, Edge, EdgeParam};
pub use error::{Result, SectionError};
pub use point::Point3D;
pub use section::Section;
