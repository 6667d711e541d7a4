//! The lateral surface between two sections.

use tube_kernel_math::{normalize_or_z, Vec3};
use tube_kernel_section::{Anchor, Edge, Section};

use crate::connect::{self, Side};
use crate::error::{Result, SegmentError};
use crate::settings::ConnectSettings;

/// Outcome of refreshing lateral edge endpoints after section edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryRefresh {
    /// Endpoints re-read from their sections.
    pub updated: usize,
    /// Interpolated endpoints without a boundary parameter; these need a rebuild to move.
    pub stale: usize,
}

impl GeometryRefresh {
    /// `true` if every endpoint followed its section.
    pub fn is_complete(&self) -> bool {
        self.stale == 0
    }
}

impl std::ops::AddAssign for GeometryRefresh {
    fn add_assign(&mut self, rhs: Self) {
        self.updated += rhs.updated;
        self.stale += rhs.stale;
    }
}

/// Lateral edges joining two sections of a tube.
///
/// Section positions refer to the owning tube. Edges are directed from the
/// start section to the end section and kept in ascending polar angle, so
/// consecutive edges bound one quad of the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    start_section: usize,
    end_section: usize,
    edges: Vec<Edge>,
}

impl Segment {
    /// Empty segment between two section positions.
    pub fn new(start_section: usize, end_section: usize) -> Self {
        Self {
            start_section,
            end_section,
            edges: Vec::new(),
        }
    }

    /// Segment with precomputed edges, e.g. loaded from storage.
    pub fn from_parts(start_section: usize, end_section: usize, edges: Vec<Edge>) -> Self {
        Self {
            start_section,
            end_section,
            edges,
        }
    }

    /// Build the lateral surface between `start` (at position `start_index`)
    /// and `end` (at `end_index`).
    ///
    /// Failure is an ordinary outcome: some section pairs cannot be joined
    /// without an intermediate section.
    pub fn connect(
        start_index: usize,
        start: &Section,
        end_index: usize,
        end: &Section,
        settings: &ConnectSettings,
    ) -> Result<Self> {
        let edges = connect::connect(
            Side {
                index: start_index,
                section: start,
            },
            Side {
                index: end_index,
                section: end,
            },
            settings,
        )?;
        Ok(Self::from_parts(start_index, end_index, edges))
    }

    /// Replace all edges by a fresh construction from the given sections.
    ///
    /// On failure the existing edges are kept.
    pub fn rebuild(&mut self, start: &Section, end: &Section, settings: &ConnectSettings) -> Result<()> {
        let built = Self::connect(self.start_section, start, self.end_section, end, settings)?;
        self.edges = built.edges;
        Ok(())
    }

    /// Position of the start section.
    pub fn start_section(&self) -> usize {
        self.start_section
    }

    /// Position of the end section.
    pub fn end_section(&self) -> usize {
        self.end_section
    }

    /// Lateral edges in angular order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Mutable access to the edges.
    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Edge at `index`.
    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    /// Number of lateral edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// `true` if no edges have been built.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Append an edge; returns its position.
    pub fn add_edge(&mut self, edge: Edge) -> usize {
        self.edges.push(edge);
        self.edges.len() - 1
    }

    /// Remove the edge at `index`.
    pub fn remove_edge(&mut self, index: usize) -> Result<Edge> {
        if index >= self.edges.len() {
            return Err(SegmentError::EdgeOutOfRange {
                index,
                len: self.edges.len(),
            });
        }
        Ok(self.edges.remove(index))
    }

    /// Drop every edge.
    pub fn clear_edges(&mut self) {
        self.edges.clear();
    }

    /// `true` if this segment joins `a` and `b`, in either direction.
    pub fn joins(&self, a: usize, b: usize) -> bool {
        (self.start_section == a && self.end_section == b)
            || (self.start_section == b && self.end_section == a)
    }

    /// `true` if either end is at position `section`.
    pub fn touches(&self, section: usize) -> bool {
        self.start_section == section || self.end_section == section
    }

    // ---- measurements ----------------------------------------------------

    /// Summed length of edges anchored to vertices at both ends, measured on
    /// the current section geometry.
    pub fn total_length(&self, start: &Section, end: &Section) -> f32 {
        self.edges
            .iter()
            .filter_map(|e| {
                let a = self.vertex_position(&e.start_anchor, start, end)?;
                let b = self.vertex_position(&e.end_anchor, start, end)?;
                Some((b - a).norm())
            })
            .sum()
    }

    fn vertex_position(&self, anchor: &Anchor, start: &Section, end: &Section) -> Option<Vec3> {
        let Anchor::Vertex { section, point } = *anchor else {
            return None;
        };
        let owner = if section == self.start_section {
            start
        } else if section == self.end_section {
            end
        } else {
            return None;
        };
        owner.points().get(point).copied()
    }

    /// Unit vector from the start centroid to the end centroid.
    pub fn direction(&self, start: &Section, end: &Section) -> Vec3 {
        normalize_or_z(&(end.centroid() - start.centroid()))
    }

    // ---- validity --------------------------------------------------------

    /// Two distinct sections, at least one edge, every edge non-degenerate.
    pub fn is_valid(&self) -> bool {
        self.start_section != self.end_section
            && !self.edges.is_empty()
            && self.edges.iter().all(Edge::is_valid)
    }

    /// Every anchor references one of this segment's sections and every
    /// vertex anchor is in range for the given point counts.
    pub fn validate_indices(&self, start_len: usize, end_len: usize) -> bool {
        let check = |anchor: &Anchor| match *anchor {
            Anchor::Vertex { section, point } => {
                (section == self.start_section && point < start_len)
                    || (section == self.end_section && point < end_len)
            }
            Anchor::Interpolated { section, .. } => {
                section == self.start_section || section == self.end_section
            }
            Anchor::Unattached => false,
        };
        self.edges
            .iter()
            .all(|e| check(&e.start_anchor) && check(&e.end_anchor))
    }

    /// `true` if two vertex-anchored lateral edges cross in XY.
    pub fn has_intersecting_edges(&self) -> bool {
        let anchored: Vec<&Edge> = self
            .edges
            .iter()
            .filter(|e| e.start_anchor.is_vertex() && e.end_anchor.is_vertex())
            .collect();
        anchored
            .iter()
            .enumerate()
            .any(|(i, a)| anchored[i + 1..].iter().any(|b| a.intersects(b)))
    }

    /// `true` if both sections are valid and non-empty.
    pub fn can_connect(a: &Section, b: &Section) -> bool {
        a.is_valid() && b.is_valid()
    }

    // ---- edits -----------------------------------------------------------

    /// Swap start and end sections and reverse every edge.
    pub fn reverse_direction(&mut self) {
        std::mem::swap(&mut self.start_section, &mut self.end_section);
        for e in &mut self.edges {
            e.swap();
        }
    }

    /// Renumber section positions through `map`, anchors included.
    pub fn remap_sections(&mut self, map: impl Fn(usize) -> usize) {
        self.start_section = map(self.start_section);
        self.end_section = map(self.end_section);
        for e in &mut self.edges {
            for anchor in [&mut e.start_anchor, &mut e.end_anchor] {
                if let Some(s) = anchor.section() {
                    *anchor = anchor.with_section(map(s));
                }
            }
        }
    }

    /// Move every endpoint onto the current section geometry.
    ///
    /// Vertex endpoints are re-read by point index and boundary endpoints are
    /// re-evaluated from their [`EdgeParam`](tube_kernel_section::EdgeParam).
    /// Average-radius fallbacks cannot be re-derived and are counted as stale.
    pub fn refresh_geometry(&mut self, start: &Section, end: &Section) -> GeometryRefresh {
        let mut refresh = GeometryRefresh::default();
        let (start_index, end_index) = (self.start_section, self.end_section);
        let resolve = |anchor: &Anchor| -> Option<Option<Vec3>> {
            let section = anchor.section()?;
            let owner = if section == start_index {
                start
            } else if section == end_index {
                end
            } else {
                return None;
            };
            Some(match *anchor {
                Anchor::Vertex { point, .. } => owner.points().get(point).copied(),
                Anchor::Interpolated { on_edge, .. } => {
                    on_edge.and_then(|param| param.evaluate(owner.points()))
                }
                Anchor::Unattached => None,
            })
        };

        for e in &mut self.edges {
            for (anchor, point) in [(e.start_anchor, &mut e.start), (e.end_anchor, &mut e.end)] {
                match resolve(&anchor) {
                    Some(Some(p)) => {
                        *point = p;
                        refresh.updated += 1;
                    }
                    Some(None) => refresh.stale += 1,
                    None => {}
                }
            }
        }
        refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tube_kernel_section::EdgeParam;

    fn square(z: f32) -> Section {
        Section::from_xy(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)], z)
    }

    #[test]
    fn test_connect_congruent_squares() {
        let a = square(0.0);
        let b = square(100.0);
        let seg = Segment::connect(0, &a, 1, &b, &ConnectSettings::default()).unwrap();
        assert_eq!(seg.start_section(), 0);
        assert_eq!(seg.end_section(), 1);
        assert_eq!(seg.edge_count(), 4);
        assert!(seg.is_valid());
        assert!(seg.validate_indices(4, 4));
        assert!(!seg.has_intersecting_edges());
        assert_abs_diff_eq!(seg.total_length(&a, &b), 400.0, epsilon = 1e-3);
        assert_abs_diff_eq!(seg.direction(&a, &b), Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_triangle_to_hexagon_uses_boundary_points() {
        let tri = Section::regular(3, 10.0, Vec3::zeros(), 0.0);
        let hex = Section::regular(6, 4.0, Vec3::new(0.0, 0.0, 40.0), 0.0);
        let seg = Segment::connect(0, &tri, 1, &hex, &ConnectSettings::default()).unwrap();
        assert!(seg.is_valid());

        // every hexagon vertex is reached
        for p in 0..6 {
            let anchor = Anchor::Vertex { section: 1, point: p };
            assert!(seg.edges().iter().any(|e| e.end_anchor == anchor));
        }
        // interpolated ends sit on the triangle's true boundary
        for e in seg.edges() {
            if let Anchor::Interpolated {
                on_edge: Some(param),
                ..
            } = e.start_anchor
            {
                let expected = param.evaluate(tri.points()).unwrap();
                assert_abs_diff_eq!(e.start, expected, epsilon = 1e-4);
                assert!((0.0..=1.0).contains(&param.t));
            }
        }
    }

    #[test]
    fn test_concentric_convex_pair_has_no_crossings() {
        let a = Section::regular(5, 8.0, Vec3::zeros(), 0.3);
        let b = Section::regular(7, 12.0, Vec3::new(0.0, 0.0, 10.0), 0.1);
        let seg = Segment::connect(0, &a, 1, &b, &ConnectSettings::default()).unwrap();
        for (i, x) in seg.edges().iter().enumerate() {
            for y in &seg.edges()[i + 1..] {
                assert!(!x.intersects(y), "{x:?} crosses {y:?}");
            }
        }
    }

    #[test]
    fn test_edge_editing() {
        let mut seg = Segment::new(0, 1);
        assert!(seg.is_empty());
        assert!(!seg.is_valid());
        let i = seg.add_edge(Edge::new(Vec3::zeros(), Vec3::z()));
        assert_eq!(i, 0);
        assert!(seg.is_valid());
        assert_eq!(
            seg.remove_edge(3),
            Err(SegmentError::EdgeOutOfRange { index: 3, len: 1 })
        );
        assert!(seg.remove_edge(0).is_ok());
        seg.add_edge(Edge::new(Vec3::zeros(), Vec3::z()));
        seg.clear_edges();
        assert_eq!(seg.edge_count(), 0);
    }

    #[test]
    fn test_reverse_direction() {
        let a = square(0.0);
        let b = square(5.0);
        let mut seg = Segment::connect(0, &a, 1, &b, &ConnectSettings::default()).unwrap();
        seg.reverse_direction();
        assert_eq!(seg.start_section(), 1);
        assert!(seg.edges().iter().all(|e| e.start_anchor.section() == Some(1)));
        assert!(seg.edges().iter().all(|e| (e.start.z - 5.0).abs() < 1e-6));
    }

    #[test]
    fn test_remap_sections_updates_anchors() {
        let a = square(0.0);
        let b = square(5.0);
        let mut seg = Segment::connect(0, &a, 1, &b, &ConnectSettings::default()).unwrap();
        seg.remap_sections(|s| s + 2);
        assert!(seg.joins(3, 2));
        assert!(seg.touches(2));
        assert!(seg
            .edges()
            .iter()
            .all(|e| e.start_anchor.section() == Some(2) && e.end_anchor.section() == Some(3)));
    }

    #[test]
    fn test_refresh_geometry_follows_sections() {
        let a = square(0.0);
        let b = square(5.0);
        let mut seg = Segment::connect(0, &a, 1, &b, &ConnectSettings::default()).unwrap();
        let fallback = Anchor::Interpolated {
            section: 1,
            on_edge: None,
        };
        let param = Anchor::Interpolated {
            section: 1,
            on_edge: Some(EdgeParam { from: 0, to: 1, t: 0.5 }),
        };
        seg.add_edge(Edge::anchored(
            Vec3::zeros(),
            Anchor::Vertex { section: 0, point: 0 },
            Vec3::new(5.0, 5.0, 5.0),
            fallback,
        ));
        seg.add_edge(Edge::anchored(
            Vec3::new(10.0, 0.0, 0.0),
            Anchor::Vertex { section: 0, point: 1 },
            Vec3::new(5.0, 0.0, 5.0),
            param,
        ));

        let mut moved = b.clone();
        moved.translate(&Vec3::new(1.0, 2.0, 3.0));
        let refresh = seg.refresh_geometry(&a, &moved);
        assert_eq!(refresh.stale, 1);
        assert_eq!(refresh.updated, 11);
        assert!(!refresh.is_complete());

        assert_abs_diff_eq!(seg.edges()[5].end, Vec3::new(6.0, 2.0, 8.0), epsilon = 1e-5);
        assert_abs_diff_eq!(seg.edges()[4].end, Vec3::new(5.0, 5.0, 5.0), epsilon = 1e-6);
        for e in &seg.edges()[..4] {
            let p = e.end_anchor.point().unwrap();
            assert_abs_diff_eq!(e.end, moved.points()[p], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_can_connect_requires_valid_sections() {
        let ok = square(0.0);
        let bad = Section::from_xy(&[(0.0, 0.0), (1.0, 0.0)], 1.0);
        assert!(Segment::can_connect(&ok, &square(1.0)));
        assert!(!Segment::can_connect(&ok, &bad));
    }
}
