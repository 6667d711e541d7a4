#![warn(missing_docs)]

//! Tube model for the tube kernel.
//!
//! A [`Tube`] keeps its cross-sections sorted by height and joins each
//! consecutive pair with a lateral [`Segment`](tube_kernel_segment::Segment).
//! [`Tube::build_mesh`] turns sections and lateral edges into an indexed
//! triangle mesh.

mod error;
mod mesh;
mod tube;

pub use error::{Result, TubeError};
pub use mesh::{MeshOptions, TriangleBuffers, TubeConstructionResult, TubeMesh};
pub use tube::{BuildReport, Tube};
