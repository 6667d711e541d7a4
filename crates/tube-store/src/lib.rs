#![warn(missing_docs)]

//! Persistence and version history for tubes.
//!
//! [`TubeSnapshot`] is the serializable form of a [`Tube`](tube_kernel::Tube):
//! sections, segments and lateral edges with one-based numbering, restorable
//! without reconnecting any segment. [`TubeRepository`] stores snapshots as a
//! linked version lineage and [`TubeHistory`] drives undoable deformations on
//! top of it.
//!
//! ```
//! use tube_kernel::{ConnectSettings, Section, Tube, Vec3};
//! use tube_store::TubeSnapshot;
//!
//! let mut tube = Tube::new();
//! tube.add_section(Section::regular(4, 5.0, Vec3::zeros(), 0.0)).unwrap();
//! tube.add_section(Section::regular(4, 5.0, Vec3::new(0.0, 0.0, 10.0), 0.0)).unwrap();
//! tube.build_all_segments(&ConnectSettings::default()).unwrap();
//!
//! let json = TubeSnapshot::from_tube(&tube).to_json().unwrap();
//! let restored = TubeSnapshot::from_json(&json).unwrap().into_tube().unwrap();
//! assert_eq!(restored.segment_count(), 1);
//! ```

mod error;
mod history;
mod repository;
mod snapshot;

pub use error::{Result, StoreError};
pub use history::{Commit, TubeHistory};
pub use repository::{InMemoryRepository, StoredTube, TubeId, TubeRepository};
pub use snapshot::{
    EdgeParamRecord, EdgeRecord, PointRecord, SectionRecord, SegmentRecord, TubeSnapshot,
    FORMAT_VERSION, INTERPOLATED_POINT,
};
