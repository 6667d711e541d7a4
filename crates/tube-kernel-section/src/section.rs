//! Closed planar cross-section polygons.

use tube_kernel_math::{
    point_in_polygon, point_on_segment, segments_cross, to_xy, BoundingBox, Tolerance, Transform,
    Vec2, Vec3,
};

use crate::edge::{Anchor, Edge};
use crate::error::{Result, SectionError};
use crate::point::Point3D;

/// An ordered, implicitly closed polygon of points at one Z.
///
/// Point identity is the position in the list. Every mutation leaves the
/// slots contiguous, so the one-based numbers reported through
/// [`Section::indexed_points`] are always `1..=N`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    points: Vec<Vec3>,
    rotation_angle: f32,
}

impl Section {
    /// An empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// A section from an ordered point list.
    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self {
            points,
            rotation_angle: 0.0,
        }
    }

    /// A section from XY coordinates, all placed at height `z`.
    pub fn from_xy(coords: &[(f32, f32)], z: f32) -> Self {
        Self::from_points(coords.iter().map(|&(x, y)| Vec3::new(x, y, z)).collect())
    }

    /// Regular polygon with `n` vertices, the first at angle `phase` (radians).
    pub fn regular(n: usize, radius: f32, center: Vec3, phase: f32) -> Self {
        let points = (0..n)
            .map(|i| {
                let a = phase + std::f32::consts::TAU * i as f32 / n as f32;
                center + Vec3::new(radius * a.cos(), radius * a.sin(), 0.0)
            })
            .collect();
        Self::from_points(points)
    }

    // ---- point access --------------------------------------------------

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` if the section has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point coordinates in polygon order.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Mutable coordinates. The slice cannot change length, so slots are preserved.
    pub fn points_mut(&mut self) -> &mut [Vec3] {
        &mut self.points
    }

    /// Point at slot `index`, carrying its slot.
    pub fn point(&self, index: usize) -> Option<Point3D> {
        self.points
            .get(index)
            .map(|p| Point3D::at(*p).with_index(index))
    }

    /// All points with their slots attached.
    pub fn indexed_points(&self) -> impl Iterator<Item = Point3D> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| Point3D::at(*p).with_index(i))
    }

    /// Append a point, returning its slot.
    pub fn add_point(&mut self, p: Vec3) -> usize {
        self.points.push(p);
        self.points.len() - 1
    }

    /// Insert a point before slot `index` (`index == len` appends).
    pub fn insert_point(&mut self, index: usize, p: Vec3) -> Result<()> {
        if index > self.points.len() {
            return Err(self.out_of_range(index));
        }
        self.points.insert(index, p);
        Ok(())
    }

    /// Remove the point at `index`; later points shift down one slot.
    pub fn remove_point(&mut self, index: usize) -> Result<Vec3> {
        if index >= self.points.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.points.remove(index))
    }

    /// Move the point at `index`.
    pub fn set_point(&mut self, index: usize, p: Vec3) -> Result<()> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(index)
            .ok_or(SectionError::PointOutOfRange { index, len })?;
        *slot = p;
        Ok(())
    }

    /// Remove all points.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    fn out_of_range(&self, index: usize) -> SectionError {
        SectionError::PointOutOfRange {
            index,
            len: self.points.len(),
        }
    }

    /// Z of the first point; the tube orders sections by this.
    pub fn z(&self) -> Option<f32> {
        self.points.first().map(|p| p.z)
    }

    /// Display rotation in degrees, in `[0, 360)`.
    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }

    /// Set the display rotation; wrapped into `[0, 360)`.
    pub fn set_rotation_angle(&mut self, degrees: f32) {
        self.rotation_angle = degrees.rem_euclid(360.0);
    }

    // ---- derived geometry ----------------------------------------------

    /// Slot pairs of the implicit edges: consecutive points, last wrapping to first.
    pub fn edge_indices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.points.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| (i, (i + 1) % n))
    }

    /// The implicit boundary edges, anchored to their vertices.
    ///
    /// `section` is the position recorded in the anchors.
    pub fn implicit_edges(&self, section: usize) -> Vec<Edge> {
        self.edge_indices()
            .map(|(i, j)| {
                Edge::anchored(
                    self.points[i],
                    Anchor::Vertex { section, point: i },
                    self.points[j],
                    Anchor::Vertex { section, point: j },
                )
            })
            .collect()
    }

    /// Arithmetic mean of the points; the origin when empty.
    pub fn centroid(&self) -> Vec3 {
        if self.points.is_empty() {
            return Vec3::zeros();
        }
        let sum: Vec3 = self.points.iter().sum();
        sum / self.points.len() as f32
    }

    /// Largest distance between any two points.
    pub fn diameter(&self) -> f32 {
        let mut max = 0.0f32;
        for (i, a) in self.points.iter().enumerate() {
            for b in &self.points[i + 1..] {
                max = max.max((a - b).norm());
            }
        }
        max
    }

    /// Boundary length, including the closing edge.
    pub fn perimeter(&self) -> f32 {
        self.edge_indices()
            .map(|(i, j)| (self.points[j] - self.points[i]).norm())
            .sum()
    }

    /// Axis-aligned bounds, `None` when empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }

    /// Mean distance from the centroid to the points.
    pub fn average_radius(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let c = self.centroid();
        self.points.iter().map(|p| (p - c).norm()).sum::<f32>() / self.points.len() as f32
    }

    /// XY projection of the points.
    pub fn points_xy(&self) -> Vec<Vec2> {
        self.points.iter().map(to_xy).collect()
    }

    // ---- transforms ----------------------------------------------------

    /// Apply an affine transform to every point.
    pub fn transform(&mut self, t: &Transform) {
        for p in &mut self.points {
            *p = t.apply_point(p);
        }
    }

    /// Translate by `offset`.
    pub fn translate(&mut self, offset: &Vec3) {
        for p in &mut self.points {
            *p += offset;
        }
    }

    /// Uniform scale about the centroid.
    pub fn scale(&mut self, factor: f32) {
        let c = self.centroid();
        self.transform(&Transform::scale_about(&c, factor));
    }

    /// Scale about the centroid so the diameter becomes `diameter`.
    ///
    /// No-op for degenerate sections.
    pub fn scale_to_diameter(&mut self, diameter: f32) {
        let current = self.diameter();
        if current < Tolerance::POINT {
            return;
        }
        self.scale(diameter / current);
    }

    /// Rotate about the Z-parallel axis through the centroid by `degrees`.
    pub fn rotate_about_center(&mut self, degrees: f32) {
        let c = self.centroid();
        self.transform(&Transform::rotation_z_about(&c, degrees.to_radians()));
        self.set_rotation_angle(self.rotation_angle + degrees);
    }

    /// Translate so the centroid lands on `target`.
    pub fn center_at(&mut self, target: &Vec3) {
        let offset = target - self.centroid();
        self.translate(&offset);
    }

    /// Zero every Z coordinate.
    pub fn flatten(&mut self) {
        for p in &mut self.points {
            p.z = 0.0;
        }
    }

    // ---- orientation ---------------------------------------------------

    /// Shoelace area of the XY projection; positive when counter-clockwise.
    pub fn signed_area(&self) -> f32 {
        self.edge_indices()
            .map(|(i, j)| {
                let (a, b) = (self.points[i], self.points[j]);
                a.x * b.y - b.x * a.y
            })
            .sum::<f32>()
            * 0.5
    }

    /// `true` if the XY projection winds clockwise.
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Reverse the point order. Slots are re-derived, so segments built
    /// against the old order go stale.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Ensure clockwise winding.
    pub fn make_clockwise(&mut self) {
        if self.signed_area() > 0.0 {
            self.reverse();
        }
    }

    /// Ensure counter-clockwise winding.
    pub fn make_counter_clockwise(&mut self) {
        if self.signed_area() < 0.0 {
            self.reverse();
        }
    }

    // ---- containment ---------------------------------------------------

    /// Even-odd containment of `p`'s XY projection.
    pub fn contains_point(&self, p: &Vec3) -> bool {
        point_in_polygon(&to_xy(p), &self.points_xy())
    }

    /// `true` if the centroid lies inside the polygon.
    pub fn is_centroid_inside(&self) -> bool {
        self.contains_point(&self.centroid())
    }

    // ---- validation ----------------------------------------------------

    /// Check the section's geometry.
    ///
    /// Checks run in order: point count, duplicate points, crossing
    /// implicit edges, edges through vertices, centroid containment.
    pub fn validate(&self) -> Result<()> {
        let n = self.points.len();
        if n < 3 {
            return Err(SectionError::TooFewPoints(n));
        }

        let tol = Tolerance::DEFAULT;
        for i in 0..n {
            for j in i + 1..n {
                if tol.points_equal(&self.points[i], &self.points[j]) {
                    return Err(SectionError::DuplicatePoints {
                        first: i,
                        second: j,
                    });
                }
            }
        }

        let xy = self.points_xy();
        for a in 0..n {
            for b in a + 1..n {
                let adjacent = b == a + 1 || (a == 0 && b == n - 1);
                if adjacent {
                    continue;
                }
                if segments_cross(&xy[a], &xy[(a + 1) % n], &xy[b], &xy[(b + 1) % n]) {
                    return Err(SectionError::SelfIntersection {
                        first: a,
                        second: b,
                    });
                }
            }
        }

        for (i, j) in self.edge_indices() {
            for k in 0..n {
                if k == i || k == j {
                    continue;
                }
                if point_on_segment(&xy[k], &xy[i], &xy[j]) {
                    return Err(SectionError::EdgeThroughVertex { edge: i, vertex: k });
                }
            }
        }

        if !self.is_centroid_inside() {
            return Err(SectionError::CentroidOutside);
        }

        Ok(())
    }

    /// `true` when [`Section::validate`] passes.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Human-readable description of the first geometry problem, if any.
    pub fn geometry_errors(&self) -> Option<String> {
        self.validate().err().map(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(size: f32, z: f32) -> Section {
        Section::from_xy(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)], z)
    }

    #[test]
    fn test_indices_stay_contiguous() {
        let mut s = square(4.0, 0.0);
        s.insert_point(1, Vec3::new(2.0, -1.0, 0.0)).unwrap();
        s.remove_point(3).unwrap();
        s.add_point(Vec3::new(-1.0, 2.0, 0.0));
        let numbers: Vec<usize> = s.indexed_points().filter_map(|p| p.number()).collect();
        assert_eq!(numbers, (1..=s.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut s = square(1.0, 0.0);
        assert_eq!(
            s.remove_point(4),
            Err(SectionError::PointOutOfRange { index: 4, len: 4 })
        );
        assert!(s.insert_point(5, Vec3::zeros()).is_err());
        assert!(s.set_point(9, Vec3::zeros()).is_err());
    }

    #[test]
    fn test_implicit_edges_wrap() {
        let s = square(1.0, 0.0);
        let edges = s.implicit_edges(2);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3].start_anchor.point(), Some(3));
        assert_eq!(edges[3].end_anchor.point(), Some(0));
        assert_eq!(edges[0].start_anchor.section(), Some(2));
        assert!(Section::from_xy(&[(0.0, 0.0)], 0.0).implicit_edges(0).is_empty());
    }

    #[test]
    fn test_measurements() {
        let s = square(2.0, 5.0);
        let c = s.centroid();
        assert_abs_diff_eq!(c.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.z, 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(s.perimeter(), 8.0, epsilon = 1e-5);
        assert_abs_diff_eq!(s.diameter(), 8f32.sqrt(), epsilon = 1e-5);
        let bbox = s.bounding_box().unwrap();
        assert_eq!(bbox.max, Vec3::new(2.0, 2.0, 5.0));
        assert!(Section::new().bounding_box().is_none());
        assert_eq!(s.z(), Some(5.0));
    }

    #[test]
    fn test_scale_and_center() {
        let mut s = square(2.0, 0.0);
        s.scale(0.5);
        assert_abs_diff_eq!(s.perimeter(), 4.0, epsilon = 1e-5);
        assert!((s.centroid() - Vec3::new(1.0, 1.0, 0.0)).norm() < 1e-5);

        s.center_at(&Vec3::new(10.0, -3.0, 7.0));
        assert!((s.centroid() - Vec3::new(10.0, -3.0, 7.0)).norm() < 1e-4);

        s.scale_to_diameter(10.0);
        assert_abs_diff_eq!(s.diameter(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rotation_wraps_angle() {
        let mut s = square(2.0, 0.0);
        s.rotate_about_center(270.0);
        s.rotate_about_center(180.0);
        assert_abs_diff_eq!(s.rotation_angle(), 90.0, epsilon = 1e-4);
        // rotating a square by 90 degrees maps its corner set onto itself
        let corner = s.points()[0];
        assert!((corner - Vec3::new(2.0, 0.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn test_orientation() {
        let mut s = square(1.0, 0.0);
        assert!(!s.is_clockwise());
        assert_abs_diff_eq!(s.signed_area(), 1.0, epsilon = 1e-6);
        s.make_clockwise();
        assert!(s.is_clockwise());
        s.make_counter_clockwise();
        assert!(!s.is_clockwise());
    }

    #[test]
    fn test_containment() {
        let s = square(4.0, 3.0);
        assert!(s.contains_point(&Vec3::new(1.0, 1.0, -50.0)));
        assert!(!s.contains_point(&Vec3::new(5.0, 1.0, 3.0)));
        assert!(s.is_centroid_inside());
    }

    #[test]
    fn test_validate_ok() {
        assert!(square(3.0, 0.0).validate().is_ok());
        assert!(Section::regular(7, 5.0, Vec3::zeros(), 0.3).is_valid());
    }

    #[test]
    fn test_validate_errors() {
        assert_eq!(
            Section::from_xy(&[(0.0, 0.0), (1.0, 0.0)], 0.0).validate(),
            Err(SectionError::TooFewPoints(2))
        );

        let dup = Section::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0005)], 0.0);
        assert_eq!(
            dup.validate(),
            Err(SectionError::DuplicatePoints {
                first: 0,
                second: 3
            })
        );

        // bow-tie
        let bow = Section::from_xy(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)], 0.0);
        assert!(matches!(
            bow.validate(),
            Err(SectionError::SelfIntersection { .. })
        ));

        // vertex 3 sits on the edge 0 -> 1
        let through = Section::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 0.0)], 0.0);
        assert!(matches!(
            through.validate(),
            Err(SectionError::EdgeThroughVertex { .. })
        ));

        // thin crescent whose centroid falls in the notch
        let crescent = Section::from_xy(
            &[
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 1.0),
                (1.0, 1.0),
                (1.0, 9.0),
                (10.0, 9.0),
                (10.0, 10.0),
                (0.0, 10.0),
            ],
            0.0,
        );
        assert_eq!(crescent.validate(), Err(SectionError::CentroidOutside));
        assert!(crescent.geometry_errors().is_some());
    }
}
