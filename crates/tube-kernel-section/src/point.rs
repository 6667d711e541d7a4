//! Section points with slot identity.

use std::ops::{Add, Mul, Sub};

use tube_kernel_math::{normalize_or_z, safe_div, Tolerance, Vec3};

/// A 3D point that remembers which slot of its section it came from.
///
/// The index is the zero-based position inside the owning [`crate::Section`]
/// and is re-derived from that position every time it is read, so it can
/// never drift out of sync with the point list. It is not a global identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point3D {
    /// Coordinates.
    pub position: Vec3,
    /// Zero-based slot in the owning section, if any.
    pub index: Option<usize>,
}

impl Point3D {
    /// A free point with no slot.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self::at(Vec3::new(x, y, z))
    }

    /// A free point at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            index: None,
        }
    }

    /// Attach a zero-based slot index.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// One-based point number as shown to users and persisted.
    pub fn number(&self) -> Option<usize> {
        self.index.map(|i| i + 1)
    }

    /// X coordinate.
    pub fn x(&self) -> f32 {
        self.position.x
    }

    /// Y coordinate.
    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Z coordinate.
    pub fn z(&self) -> f32 {
        self.position.z
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point3D) -> f32 {
        (self.position - other.position).norm()
    }

    /// Length of the position vector.
    pub fn length(&self) -> f32 {
        self.position.norm()
    }

    /// Dot product of the position vectors.
    pub fn dot(&self, other: &Point3D) -> f32 {
        self.position.dot(&other.position)
    }

    /// Cross product of the position vectors.
    pub fn cross(&self, other: &Point3D) -> Point3D {
        Point3D::at(self.position.cross(&other.position))
    }

    /// Unit vector in the same direction, `(0, 0, 1)` if degenerate.
    pub fn normalized(&self) -> Point3D {
        Point3D::at(normalize_or_z(&self.position))
    }

    /// Division that yields zero instead of blowing up on tiny divisors.
    pub fn div(&self, s: f32) -> Point3D {
        Point3D {
            position: safe_div(&self.position, s),
            index: self.index,
        }
    }

    /// Projection onto the XY plane, keeping the index.
    pub fn to_xy(&self) -> Point3D {
        Point3D {
            position: Vec3::new(self.position.x, self.position.y, 0.0),
            index: self.index,
        }
    }

    /// `true` if every coordinate is within tolerance of zero.
    pub fn is_zero(&self) -> bool {
        self.position.iter().all(|c| c.abs() < Tolerance::POINT)
    }
}

impl PartialEq for Point3D {
    fn eq(&self, other: &Self) -> bool {
        Tolerance::DEFAULT.points_equal(&self.position, &other.position) && self.index == other.index
    }
}

impl From<Vec3> for Point3D {
    fn from(position: Vec3) -> Self {
        Self::at(position)
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Point3D) -> Point3D {
        Point3D::at(self.position + rhs.position)
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Point3D) -> Point3D {
        Point3D::at(self.position - rhs.position)
    }
}

impl Mul<f32> for Point3D {
    type Output = Point3D;

    fn mul(self, s: f32) -> Point3D {
        Point3D::at(self.position * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_uses_tolerance_and_index() {
        let a = Point3D::new(1.0, 2.0, 3.0).with_index(0);
        let b = Point3D::new(1.0004, 2.0, 3.0).with_index(0);
        let c = Point3D::new(1.0, 2.0, 3.0).with_index(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Point3D::new(1.01, 2.0, 3.0).with_index(0));
    }

    #[test]
    fn test_number_is_one_based() {
        assert_eq!(Point3D::new(0.0, 0.0, 0.0).with_index(4).number(), Some(5));
        assert_eq!(Point3D::new(0.0, 0.0, 0.0).number(), None);
    }

    #[test]
    fn test_degenerate_operations() {
        let p = Point3D::new(2.0, 4.0, 6.0);
        assert!(p.div(0.0).is_zero());
        assert_eq!(Point3D::new(0.0, 0.0, 0.0).normalized().position, Vec3::z());
        assert!((p.normalized().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_dot() {
        let x = Point3D::new(1.0, 0.0, 0.0);
        let y = Point3D::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Point3D::new(0.0, 0.0, 1.0));
        assert_eq!(x.dot(&y), 0.0);
        assert_eq!((x + y) * 2.0, Point3D::new(2.0, 2.0, 0.0));
        assert!((x.distance(&y) - 2f32.sqrt()).abs() < 1e-6);
        assert_eq!(Point3D::new(1.0, 2.0, 3.0).to_xy().z(), 0.0);
    }
}
