//! Planar predicates on the XY projection.
//!
//! Everything here ignores Z. Cross-sections are planar and the lateral
//! connection algorithm works on flattened copies, so every crossing and
//! containment question reduces to 2D.

use crate::{Tolerance, Vec2};

/// Signed area of the parallelogram `(b - a) x (c - a)`.
///
/// Positive if `c` is to the left of the directed line `a -> b`.
#[inline]
pub fn orient2d(a: &Vec2, b: &Vec2, c: &Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Strict crossing test for segments `p1p2` and `p3p4`.
///
/// Each segment's endpoints must lie strictly on opposite sides of the
/// other's supporting line. Touching, collinear overlap and shared
/// endpoints are not crossings.
pub fn segments_cross(p1: &Vec2, p2: &Vec2, p3: &Vec2, p4: &Vec2) -> bool {
    let d1 = orient2d(p3, p4, p1);
    let d2 = orient2d(p3, p4, p2);
    let d3 = orient2d(p1, p2, p3);
    let d4 = orient2d(p1, p2, p4);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Intersection of the infinite lines through `p1p2` and `p3p4`.
///
/// Returns `None` when the lines are (nearly) parallel.
pub fn line_intersection(p1: &Vec2, p2: &Vec2, p3: &Vec2, p4: &Vec2) -> Option<Vec2> {
    let denom = (p1.x - p2.x) * (p3.y - p4.y) - (p1.y - p2.y) * (p3.x - p4.x);
    if denom.abs() < Tolerance::POINT {
        return None;
    }
    let t = ((p1.x - p3.x) * (p3.y - p4.y) - (p1.y - p3.y) * (p3.x - p4.x)) / denom;
    Some(p1 + (p2 - p1) * t)
}

/// Where a ray hits a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the ray, in units of the ray direction.
    pub t: f32,
    /// Parameter along the segment, in `[0, 1]`.
    pub u: f32,
    /// The hit point.
    pub point: Vec2,
}

/// Intersect the ray `origin + t * dir` (t >= 0) with segment `ab`.
pub fn ray_segment_hit(origin: &Vec2, dir: &Vec2, a: &Vec2, b: &Vec2) -> Option<RayHit> {
    let seg = b - a;
    let diff = a - origin;
    let cross = dir.x * seg.y - dir.y * seg.x;
    if cross.abs() < Tolerance::RAY_PARALLEL {
        return None;
    }

    let t = (diff.x * seg.y - diff.y * seg.x) / cross;
    let u = (diff.x * dir.y - diff.y * dir.x) / cross;

    if t >= 0.0 && (0.0..=1.0).contains(&u) {
        Some(RayHit {
            t,
            u,
            point: origin + dir * t,
        })
    } else {
        None
    }
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(point: &Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// `true` if `p` lies on the closed segment `ab` within [`Tolerance::POINT`].
pub fn point_on_segment(p: &Vec2, a: &Vec2, b: &Vec2) -> bool {
    let ab = b - a;
    let ap = p - a;
    if (ab.x * ap.y - ab.y * ap.x).abs() > Tolerance::POINT {
        return false;
    }
    let dot = ap.dot(&ab);
    dot >= 0.0 && dot <= ab.norm_squared()
}
