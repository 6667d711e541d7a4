#![warn(missing_docs)]

//! Tube construction and centerline deformation kernel.
//!
//! Re-exports the kernel crates and adds [`KernelConfig`], the TOML file
//! that carries every tunable.
//!
//! # Example
//!
//! ```
//! use tube_kernel::{ConnectSettings, MeshOptions, Section, Tube};
//!
//! let mut tube = Tube::new();
//! for z in [0.0, 10.0, 20.0] {
//!     let square = Section::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)], z);
//!     tube.add_section(square).unwrap();
//! }
//! let report = tube.build_all_segments(&ConnectSettings::default()).unwrap();
//! assert!(report.is_success());
//!
//! let result = tube.build_mesh(&MeshOptions::default());
//! assert_eq!(result.mesh.face_count(), 16);
//! ```

pub use tube_kernel_deform;
pub use tube_kernel_math;
pub use tube_kernel_section;
pub use tube_kernel_segment;
pub use tube_kernel_tube;

mod config;

pub use config::{ConfigError, KernelConfig};

pub use tube_kernel_deform::{
    Attenuation, DeformError, DeformReport, DeformationEngine, DeformationPoint, EngineSettings,
};
pub use tube_kernel_math::{BoundingBox, Tolerance, Transform, Vec3};
pub use tube_kernel_section::{Anchor, Edge, EdgeParam, Point3D, Section, SectionError};
pub use tube_kernel_segment::{ConnectSettings, GeometryRefresh, Segment, SegmentError};
pub use tube_kernel_tube::{
    BuildReport, MeshOptions, TriangleBuffers, Tube, TubeConstructionResult, TubeError, TubeMesh,
};
