//! Serializable tube records.
//!
//! Records use one-based numbering throughout: section, point, segment and
//! edge records carry `position + 1`. An edge endpoint that is not an
//! original vertex stores point number `-1`, optionally with the boundary
//! edge it lies on.

use serde::{Deserialize, Serialize};
use tube_kernel::{Anchor, Edge, EdgeParam, Section, Segment, Tube, Vec3};

use crate::error::{Result, StoreError};

/// Snapshot layout version written by [`TubeSnapshot::from_tube`].
pub const FORMAT_VERSION: u32 = 1;

/// Point number stored for interpolated endpoints.
pub const INTERPOLATED_POINT: i64 = -1;

/// One section vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    /// One-based point number.
    pub index: usize,
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

/// One cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    /// One-based section number.
    pub index: usize,
    /// Display rotation in degrees.
    #[serde(default)]
    pub rotation_angle: f32,
    /// Vertices in boundary order.
    pub points: Vec<PointRecord>,
}

/// Boundary edge an interpolated endpoint lies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeParamRecord {
    /// One-based number of the boundary edge's first vertex.
    pub from: usize,
    /// One-based number of the boundary edge's second vertex.
    pub to: usize,
    /// Parameter along the boundary edge.
    pub t: f32,
}

/// One lateral edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// One-based edge number within its segment.
    pub index: usize,
    /// Start coordinates.
    pub start: [f32; 3],
    /// End coordinates.
    pub end: [f32; 3],
    /// One-based section of the start point, absent when unattached.
    pub start_section: Option<usize>,
    /// One-based section of the end point, absent when unattached.
    pub end_section: Option<usize>,
    /// One-based start point number, or `-1` when interpolated.
    pub start_point: i64,
    /// One-based end point number, or `-1` when interpolated.
    pub end_point: i64,
    /// Boundary location of an interpolated start point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_on_edge: Option<EdgeParamRecord>,
    /// Boundary location of an interpolated end point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_on_edge: Option<EdgeParamRecord>,
}

/// One segment between two sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// One-based segment number.
    pub index: usize,
    /// One-based start section.
    pub start_section: usize,
    /// One-based end section.
    pub end_section: usize,
    /// Lateral edges.
    pub edges: Vec<EdgeRecord>,
}

/// A complete tube, restorable without rebuilding segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeSnapshot {
    /// Layout version.
    pub format_version: u32,
    /// Sections in Z order.
    pub sections: Vec<SectionRecord>,
    /// Segments in storage order.
    pub segments: Vec<SegmentRecord>,
}

impl Default for TubeSnapshot {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }
}

fn inconsistent(msg: String) -> StoreError {
    StoreError::InconsistentIndices(msg)
}

fn encode_anchor(anchor: &Anchor) -> (Option<usize>, i64, Option<EdgeParamRecord>) {
    match *anchor {
        Anchor::Vertex { section, point } => (Some(section + 1), point as i64 + 1, None),
        Anchor::Interpolated { section, on_edge } => (
            Some(section + 1),
            INTERPOLATED_POINT,
            on_edge.map(|p| EdgeParamRecord {
                from: p.from + 1,
                to: p.to + 1,
                t: p.t,
            }),
        ),
        Anchor::Unattached => (None, INTERPOLATED_POINT, None),
    }
}

impl From<&Edge> for EdgeRecord {
    fn from(e: &Edge) -> Self {
        let (start_section, start_point, start_on_edge) = encode_anchor(&e.start_anchor);
        let (end_section, end_point, end_on_edge) = encode_anchor(&e.end_anchor);
        Self {
            index: 0,
            start: [e.start.x, e.start.y, e.start.z],
            end: [e.end.x, e.end.y, e.end.z],
            start_section,
            end_section,
            start_point,
            end_point,
            start_on_edge,
            end_on_edge,
        }
    }
}

impl TubeSnapshot {
    /// Record the current state of `tube`.
    pub fn from_tube(tube: &Tube) -> Self {
        let sections = tube
            .sections()
            .iter()
            .enumerate()
            .map(|(i, s)| SectionRecord {
                index: i + 1,
                rotation_angle: s.rotation_angle(),
                points: s
                    .points()
                    .iter()
                    .enumerate()
                    .map(|(j, p)| PointRecord {
                        index: j + 1,
                        x: p.x,
                        y: p.y,
                        z: p.z,
                    })
                    .collect(),
            })
            .collect();

        let segments = tube
            .segments()
            .iter()
            .enumerate()
            .map(|(i, seg)| SegmentRecord {
                index: i + 1,
                start_section: seg.start_section() + 1,
                end_section: seg.end_section() + 1,
                edges: seg
                    .edges()
                    .iter()
                    .enumerate()
                    .map(|(k, e)| EdgeRecord {
                        index: k + 1,
                        ..EdgeRecord::from(e)
                    })
                    .collect(),
            })
            .collect();

        Self {
            format_version: FORMAT_VERSION,
            sections,
            segments,
        }
    }

    /// Rebuild the tube exactly as recorded.
    ///
    /// Segment topology is taken as-is; nothing is reconnected. Every
    /// number and cross-reference is checked first.
    pub fn into_tube(self) -> Result<Tube> {
        let mut sections = Vec::with_capacity(self.sections.len());
        for (i, rec) in self.sections.iter().enumerate() {
            if rec.index != i + 1 {
                return Err(inconsistent(format!(
                    "section record {} is numbered {}",
                    i + 1,
                    rec.index
                )));
            }
            let mut points = Vec::with_capacity(rec.points.len());
            for (j, p) in rec.points.iter().enumerate() {
                if p.index != j + 1 {
                    return Err(inconsistent(format!(
                        "point {} of section {} is numbered {}",
                        j + 1,
                        rec.index,
                        p.index
                    )));
                }
                points.push(Vec3::new(p.x, p.y, p.z));
            }
            let mut section = Section::from_points(points);
            section.set_rotation_angle(rec.rotation_angle);
            sections.push(section);
        }

        let mut segments = Vec::with_capacity(self.segments.len());
        for (i, rec) in self.segments.iter().enumerate() {
            if rec.index != i + 1 {
                return Err(inconsistent(format!(
                    "segment record {} is numbered {}",
                    i + 1,
                    rec.index
                )));
            }
            let start = section_position(rec.start_section, sections.len(), rec.index)?;
            let end = section_position(rec.end_section, sections.len(), rec.index)?;
            if start == end {
                return Err(inconsistent(format!(
                    "segment {} joins section {} to itself",
                    rec.index, rec.start_section
                )));
            }

            let mut edges = Vec::with_capacity(rec.edges.len());
            for e in &rec.edges {
                let start_anchor = decode_anchor(
                    e.start_section,
                    e.start_point,
                    e.start_on_edge,
                    &sections,
                    [start, end],
                )
                .map_err(|m| inconsistent(format!("segment {} edge {}: {m}", rec.index, e.index)))?;
                let end_anchor = decode_anchor(
                    e.end_section,
                    e.end_point,
                    e.end_on_edge,
                    &sections,
                    [start, end],
                )
                .map_err(|m| inconsistent(format!("segment {} edge {}: {m}", rec.index, e.index)))?;
                edges.push(Edge::anchored(
                    Vec3::from(e.start),
                    start_anchor,
                    Vec3::from(e.end),
                    end_anchor,
                ));
            }
            segments.push(Segment::from_parts(start, end, edges));
        }

        Ok(Tube::from_parts(sections, segments))
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn section_position(number: usize, count: usize, segment: usize) -> Result<usize> {
    if number == 0 || number > count {
        return Err(inconsistent(format!(
            "segment {segment} references section {number} of {count}"
        )));
    }
    Ok(number - 1)
}

fn decode_anchor(
    section: Option<usize>,
    point: i64,
    on_edge: Option<EdgeParamRecord>,
    sections: &[Section],
    joined: [usize; 2],
) -> std::result::Result<Anchor, String> {
    let Some(number) = section else {
        return Ok(Anchor::Unattached);
    };
    if number == 0 || number > sections.len() {
        return Err(format!("section {number} does not exist"));
    }
    let position = number - 1;
    if !joined.contains(&position) {
        return Err(format!("section {number} is not joined by this segment"));
    }
    let len = sections[position].len();

    match point {
        INTERPOLATED_POINT => {
            let on_edge = match on_edge {
                Some(p) => {
                    if p.from == 0 || p.to == 0 || p.from > len || p.to > len {
                        return Err(format!(
                            "boundary edge {}-{} is outside section {number}",
                            p.from, p.to
                        ));
                    }
                    Some(EdgeParam {
                        from: p.from - 1,
                        to: p.to - 1,
                        t: p.t,
                    })
                }
                None => None,
            };
            Ok(Anchor::Interpolated {
                section: position,
                on_edge,
            })
        }
        p if p >= 1 && (p as usize) <= len => Ok(Anchor::Vertex {
            section: position,
            point: p as usize - 1,
        }),
        p => Err(format!("point {p} is outside section {number}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tube_kernel::{ConnectSettings, MeshOptions};

    fn tube_with_interpolation() -> Tube {
        let mut tube = Tube::new();
        tube.add_section(Section::regular(3, 10.0, Vec3::zeros(), 0.0))
            .unwrap();
        let mut hex = Section::regular(6, 4.0, Vec3::new(0.0, 0.0, 25.0), 0.0);
        hex.set_rotation_angle(30.0);
        tube.add_section(hex).unwrap();
        tube.add_section(Section::regular(6, 4.0, Vec3::new(0.0, 0.0, 40.0), 0.0))
            .unwrap();
        tube.build_all_segments(&ConnectSettings::default()).unwrap();
        tube
    }

    #[test]
    fn test_numbers_are_one_based() {
        let snap = TubeSnapshot::from_tube(&tube_with_interpolation());
        assert_eq!(snap.format_version, FORMAT_VERSION);
        assert_eq!(
            snap.sections.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(snap.sections[0].points[2].index, 3);
        assert_eq!(snap.sections[1].rotation_angle, 30.0);
        assert_eq!(snap.segments[0].index, 1);
        assert_eq!(snap.segments[0].start_section, 1);
        assert_eq!(snap.segments[0].end_section, 2);
        assert_eq!(snap.segments[0].edges[0].index, 1);

        let interpolated = snap.segments[0]
            .edges
            .iter()
            .filter(|e| e.start_point == INTERPOLATED_POINT)
            .count();
        assert!(interpolated >= 3);
    }

    #[test]
    fn test_restored_tube_meshes_identically() {
        let tube = tube_with_interpolation();
        let json = TubeSnapshot::from_tube(&tube).to_json().unwrap();
        let restored = TubeSnapshot::from_json(&json).unwrap().into_tube().unwrap();

        assert_eq!(restored, tube);
        let options = MeshOptions { cap_ends: true };
        assert_eq!(restored.build_mesh(&options), tube.build_mesh(&options));
    }

    #[test]
    fn test_bad_point_reference_is_rejected() {
        let mut snap = TubeSnapshot::from_tube(&tube_with_interpolation());
        snap.segments[0].edges[0].start_point = 7;
        assert!(matches!(
            snap.into_tube(),
            Err(StoreError::InconsistentIndices(_))
        ));
    }

    #[test]
    fn test_gapped_numbering_is_rejected() {
        let mut snap = TubeSnapshot::from_tube(&tube_with_interpolation());
        snap.sections[1].points[0].index = 5;
        let err = snap.into_tube().unwrap_err();
        assert!(err.to_string().contains("point 1 of section 2"));
    }

    #[test]
    fn test_segment_section_out_of_range() {
        let mut snap = TubeSnapshot::from_tube(&tube_with_interpolation());
        snap.segments[1].end_section = 9;
        assert!(matches!(
            snap.into_tube(),
            Err(StoreError::InconsistentIndices(_))
        ));
    }

    #[test]
    fn test_edge_on_foreign_section_is_rejected() {
        let mut snap = TubeSnapshot::from_tube(&tube_with_interpolation());
        // segment 1 joins sections 1 and 2
        snap.segments[0].edges[0].end_section = Some(3);
        assert!(snap.into_tube().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            TubeSnapshot::from_json("{\"sections\": 4}"),
            Err(StoreError::Json(_))
        ));
    }
}
