//! Directed edges between two points, with provenance for each end.

use tube_kernel_math::{normalize_or_z, segments_cross, to_xy, Tolerance, Vec3};

/// Location of a point on a section boundary: `lerp(points[from], points[to], t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParam {
    /// Zero-based index of the boundary edge's first vertex.
    pub from: usize,
    /// Zero-based index of the boundary edge's second vertex.
    pub to: usize,
    /// Parameter along the boundary edge, in `[0, 1]`.
    pub t: f32,
}

impl EdgeParam {
    /// Evaluate against a section's point list. `None` if an index is out of range.
    pub fn evaluate(&self, points: &[Vec3]) -> Option<Vec3> {
        let a = points.get(self.from)?;
        let b = points.get(self.to)?;
        Some(a + (b - a) * self.t)
    }
}

/// Where an edge endpoint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Anchor {
    /// An original vertex of a section.
    Vertex {
        /// Zero-based section position in the tube.
        section: usize,
        /// Zero-based point slot in that section.
        point: usize,
    },
    /// A synthesized point on (or near) a section boundary.
    Interpolated {
        /// Zero-based section position in the tube.
        section: usize,
        /// Boundary location, when the point lies exactly on a boundary edge.
        on_edge: Option<EdgeParam>,
    },
    /// Not tied to any section.
    #[default]
    Unattached,
}

impl Anchor {
    /// Section this endpoint belongs to.
    pub fn section(&self) -> Option<usize> {
        match *self {
            Anchor::Vertex { section, .. } | Anchor::Interpolated { section, .. } => Some(section),
            Anchor::Unattached => None,
        }
    }

    /// Point slot, for vertex anchors.
    pub fn point(&self) -> Option<usize> {
        match *self {
            Anchor::Vertex { point, .. } => Some(point),
            _ => None,
        }
    }

    /// `true` for an original section vertex.
    pub fn is_vertex(&self) -> bool {
        matches!(self, Anchor::Vertex { .. })
    }

    /// `true` for a synthesized point.
    pub fn is_interpolated(&self) -> bool {
        matches!(self, Anchor::Interpolated { .. })
    }

    /// Same anchor, re-targeted at another section position.
    pub fn with_section(self, section: usize) -> Self {
        match self {
            Anchor::Vertex { point, .. } => Anchor::Vertex { section, point },
            Anchor::Interpolated { on_edge, .. } => Anchor::Interpolated { section, on_edge },
            Anchor::Unattached => Anchor::Unattached,
        }
    }
}

/// A directed edge from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edge {
    /// Start point.
    pub start: Vec3,
    /// End point.
    pub end: Vec3,
    /// Provenance of the start point.
    pub start_anchor: Anchor,
    /// Provenance of the end point.
    pub end_anchor: Anchor,
}

impl Edge {
    /// An edge with no provenance.
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self {
            start,
            end,
            start_anchor: Anchor::Unattached,
            end_anchor: Anchor::Unattached,
        }
    }

    /// An edge with provenance on both ends.
    pub fn anchored(start: Vec3, start_anchor: Anchor, end: Vec3, end_anchor: Anchor) -> Self {
        Self {
            start,
            end,
            start_anchor,
            end_anchor,
        }
    }

    /// A valid edge has distinct endpoints.
    pub fn is_valid(&self) -> bool {
        (self.end - self.start).norm() >= Tolerance::POINT
    }

    /// Edge length.
    pub fn length(&self) -> f32 {
        (self.end - self.start).norm()
    }

    /// Unit direction from start to end.
    pub fn direction(&self) -> Vec3 {
        normalize_or_z(&(self.end - self.start))
    }

    /// Midpoint.
    pub fn midpoint(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// `true` if any endpoint of `self` coincides with any endpoint of `other`.
    pub fn has_common_point(&self, other: &Edge) -> bool {
        let tol = Tolerance::DEFAULT;
        tol.points_equal(&self.start, &other.start)
            || tol.points_equal(&self.start, &other.end)
            || tol.points_equal(&self.end, &other.start)
            || tol.points_equal(&self.end, &other.end)
    }

    /// Strict crossing of the XY projections.
    ///
    /// Edges sharing an endpoint never intersect.
    pub fn intersects(&self, other: &Edge) -> bool {
        if self.has_common_point(other) {
            return false;
        }
        segments_cross(
            &to_xy(&self.start),
            &to_xy(&self.end),
            &to_xy(&other.start),
            &to_xy(&other.end),
        )
    }

    /// `true` if both edges join the same two points, in either direction.
    pub fn coincides(&self, other: &Edge, tolerance: f32) -> bool {
        let near = |a: &Vec3, b: &Vec3| (a - b).norm() < tolerance;
        (near(&self.start, &other.start) && near(&self.end, &other.end))
            || (near(&self.start, &other.end) && near(&self.end, &other.start))
    }

    /// Reverse in place, swapping both points and anchors.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
        std::mem::swap(&mut self.start_anchor, &mut self.end_anchor);
    }

    /// Reversed copy.
    pub fn reversed(&self) -> Edge {
        let mut e = *self;
        e.swap();
        e
    }
}
