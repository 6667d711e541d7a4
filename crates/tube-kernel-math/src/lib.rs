#![warn(missing_docs)]

//! Math types for the tube kernel.
//!
//! Thin wrappers around nalgebra providing the single-precision types used
//! by cross-sections, lateral edges and the deformation engine, plus the
//! tolerance constants and the planar predicates shared by every crate.

use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

pub mod predicates;

pub use predicates::{
    line_intersection, orient2d, point_in_polygon, point_on_segment, ray_segment_hit,
    segments_cross,
};

/// A vector (or point) in 3D space.
pub type Vec3 = Vector3<f32>;

/// A vector in the XY plane.
pub type Vec2 = Vector2<f32>;

/// Drop the Z component.
#[inline]
pub fn to_xy(v: &Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Normalize `v`, returning the +Z axis when `v` is shorter than
/// [`Tolerance::DEGENERATE`].
pub fn normalize_or_z(v: &Vec3) -> Vec3 {
    let len = v.norm();
    if len < Tolerance::DEGENERATE {
        Vec3::z()
    } else {
        v / len
    }
}

/// Divide `v` by `s`, yielding the zero vector when `|s|` is below
/// [`Tolerance::POINT`].
pub fn safe_div(v: &Vec3, s: f32) -> Vec3 {
    if s.abs() < Tolerance::POINT {
        Vec3::zeros()
    } else {
        v / s
    }
}

/// `true` when every component is finite.
#[inline]
pub fn is_finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Box enclosing all `points`, or `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    /// Grow to include `p`.
    pub fn include(&mut self, p: &Vec3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Union of two boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Size along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f32>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `offset`.
    pub fn translation(offset: &Vec3) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = offset.x;
        m[(1, 3)] = offset.y;
        m[(2, 3)] = offset.z;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)` about the origin.
    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Uniform scale by `factor` about `center`.
    pub fn scale_about(center: &Vec3, factor: f32) -> Self {
        Self::translation(center)
            .then(&Self::scale(factor, factor, factor))
            .then(&Self::translation(&-center))
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Rotation about a Z-parallel axis through `center` by `angle` radians.
    pub fn rotation_z_about(center: &Vec3, angle: f32) -> Self {
        Self::translation(center)
            .then(&Self::rotation_z(angle))
            .then(&Self::translation(&-center))
    }

    /// Compose: `self * other`, i.e. `other` is applied first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Vec3) -> Vec3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Vec3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance constants for geometric comparisons.
///
/// Cross-sections are authored on a millimetre grid, so coincidence is
/// judged at a thousandth of a unit rather than at CAD precision.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f32,
    /// Angular tolerance in radians.
    pub angular: f32,
}

impl Tolerance {
    /// Coordinate equality, vertex snapping and dedup rounding.
    pub const POINT: f32 = 1e-3;
    /// Polar angle tie tolerance in radians.
    pub const ANGLE: f32 = 1e-3;
    /// Vector lengths and weights below this are treated as zero.
    pub const DEGENERATE: f32 = 1e-6;
    /// A ray and a segment whose directions' cross product is below this are parallel.
    pub const RAY_PARALLEL: f32 = 1e-3;

    /// Default tolerances.
    pub const DEFAULT: Self = Self {
        linear: Self::POINT,
        angular: Self::ANGLE,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Vec3, b: &Vec3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f32) -> bool {
        d.abs() < self.linear
    }

    /// Check if two angles are effectively equal (in radians).
    pub fn angles_equal(&self, a: f32, b: f32) -> bool {
        (a - b).abs() < self.angular
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!((t.apply_point(&p) - p).norm() < 1e-6);
    }

    #[test]
    fn test_translation() {
        let t = Transform::translation(&Vec3::new(10.0, 20.0, 30.0));
        let r = t.apply_point(&Vec3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(r.x, 11.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.y, 22.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.z, 33.0, epsilon = 1e-5);
        // directions ignore translation
        let d = t.apply_vec(&Vec3::x());
        assert!((d - Vec3::x()).norm() < 1e-6);
    }

    #[test]
    fn test_scale_about_center() {
        let c = Vec3::new(1.0, 1.0, 0.0);
        let t = Transform::scale_about(&c, 2.0);
        let r = t.apply_point(&Vec3::new(2.0, 1.0, 0.0));
        assert_abs_diff_eq!(r.x, 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-5);
        // the center is a fixed point
        assert!((t.apply_point(&c) - c).norm() < 1e-5);
    }

    #[test]
    fn test_rotation_z_about() {
        let c = Vec3::new(1.0, 0.0, 5.0);
        let t = Transform::rotation_z_about(&c, PI / 2.0);
        let r = t.apply_point(&Vec3::new(2.0, 0.0, 5.0));
        assert_abs_diff_eq!(r.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_inverse() {
        let t = Transform::scale_about(&Vec3::new(3.0, -2.0, 0.0), 0.5)
            .then(&Transform::translation(&Vec3::new(1.0, 2.0, 3.0)));
        let inv = t.inverse().unwrap();
        let p = Vec3::new(5.0, 6.0, 7.0);
        let back = inv.apply_point(&t.apply_point(&p));
        assert!((back - p).norm() < 1e-4);
    }

    #[test]
    fn test_normalize_or_z() {
        let n = normalize_or_z(&Vec3::new(3.0, 0.0, 4.0));
        assert_abs_diff_eq!(n.norm(), 1.0, epsilon = 1e-6);
        assert_eq!(normalize_or_z(&Vec3::new(1e-8, 0.0, 0.0)), Vec3::z());
        assert_eq!(normalize_or_z(&Vec3::zeros()), Vec3::z());
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(&Vec3::new(1.0, 2.0, 3.0), 0.0005), Vec3::zeros());
        let r = safe_div(&Vec3::new(2.0, 4.0, 6.0), 2.0);
        assert!((r - Vec3::new(1.0, 2.0, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn test_bounding_box() {
        let pts = [
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 4.0, 2.0),
            Vec3::new(0.5, 0.0, -3.0),
        ];
        let bbox = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(bbox.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 4.0, 2.0));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert!(tol.points_equal(&a, &Vec3::new(1.0005, 2.0, 3.0)));
        assert!(!tol.points_equal(&a, &Vec3::new(1.01, 2.0, 3.0)));
    }
}
