#![warn(missing_docs)]

//! Centerline deformation for tubes.
//!
//! A [`DeformationPoint`] is a radial displacement field: a position, a
//! displacement and a distance falloff. The [`DeformationEngine`] sums its
//! points over a curve, or bends a whole [`Tube`](tube_kernel_tube::Tube)
//! by deforming the centerline through the section centroids and carrying
//! each section rigidly along it.

pub mod curve;
mod engine;
mod error;
mod frame;
mod point;
mod settings;

pub use engine::{DeformReport, DeformationEngine};
pub use error::{DeformError, Result};
pub use frame::LocalFrame;
pub use point::{Attenuation, DeformationPoint, MAX_RADIUS, MAX_STRENGTH, MIN_RADIUS, MIN_STRENGTH, WEIGHT_EPSILON};
pub use settings::EngineSettings;
