//! Local frames carried along a centerline.

use tube_kernel_math::{normalize_or_z, Vec3};

const DEGENERATE: f32 = 1e-6;

/// Orthonormal basis attached to a centerline point.
///
/// Section points are stored as `(normal, binormal, tangent)` coordinates
/// relative to the center, so re-expressing them in another frame carries
/// the section rigidly along a bent centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    /// First in-plane axis.
    pub normal: Vec3,
    /// Second in-plane axis.
    pub binormal: Vec3,
    /// Unit direction along the centerline.
    pub tangent: Vec3,
}

impl LocalFrame {
    /// Frame for a tangent direction.
    ///
    /// The normal is `tangent × Z`, or `tangent × X` when the tangent is
    /// within about 25° of Z, with a `tangent × Y` fallback.
    pub fn from_tangent(tangent: &Vec3) -> Self {
        let tangent = normalize_or_z(tangent);
        let helper = if tangent.z.abs() < 0.9 {
            Vec3::z()
        } else {
            Vec3::x()
        };

        let mut normal = tangent.cross(&helper);
        if normal.norm() < DEGENERATE {
            normal = tangent.cross(&Vec3::y());
        }
        if normal.norm() < DEGENERATE {
            return Self {
                normal: Vec3::x(),
                binormal: Vec3::y(),
                tangent,
            };
        }
        let normal = normal.normalize();
        let binormal = normalize_or_z(&tangent.cross(&normal));

        Self {
            normal,
            binormal,
            tangent,
        }
    }

    /// World offset to frame coordinates.
    pub fn to_local(&self, offset: &Vec3) -> Vec3 {
        Vec3::new(
            offset.dot(&self.normal),
            offset.dot(&self.binormal),
            offset.dot(&self.tangent),
        )
    }

    /// Frame coordinates to a world offset.
    pub fn to_world(&self, local: &Vec3) -> Vec3 {
        self.normal * local.x + self.binormal * local.y + self.tangent * local.z
    }
}
