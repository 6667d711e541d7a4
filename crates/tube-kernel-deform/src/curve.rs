//! Polyline helpers for centerlines.

use tube_kernel_math::{is_finite, normalize_or_z, Vec3};

const DEGENERATE: f32 = 1e-6;

/// At least two points, all finite.
pub fn is_valid_curve(curve: &[Vec3]) -> bool {
    curve.len() >= 2 && curve.iter().all(is_finite)
}

/// Polyline length.
pub fn curve_length(curve: &[Vec3]) -> f32 {
    curve.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Resample to `target` points evenly spaced by arc length.
///
/// Endpoints are kept exactly. Returns the input when `target` does not add
/// points or the curve has no length.
pub fn resample(curve: &[Vec3], target: usize) -> Vec<Vec3> {
    if curve.len() < 2 || target <= curve.len() {
        return curve.to_vec();
    }
    let lengths: Vec<f32> = curve.windows(2).map(|w| (w[1] - w[0]).norm()).collect();
    let total: f32 = lengths.iter().sum();
    if total < DEGENERATE {
        return curve.to_vec();
    }

    let step = total / (target - 1) as f32;
    let mut out = Vec::with_capacity(target);
    out.push(curve[0]);

    let mut piece = 0;
    let mut walked = 0.0;
    for i in 1..target - 1 {
        let s = i as f32 * step;
        while piece + 1 < lengths.len() && walked + lengths[piece] < s {
            walked += lengths[piece];
            piece += 1;
        }
        let len = lengths[piece];
        if len < DEGENERATE {
            out.push(curve[piece]);
            continue;
        }
        let u = ((s - walked) / len).clamp(0.0, 1.0);
        out.push(curve[piece] + (curve[piece + 1] - curve[piece]) * u);
    }

    if let Some(last) = curve.last() {
        out.push(*last);
    }
    out
}

/// Point of the curve at height `z`.
///
/// Interpolates inside the first piece whose Z range contains `z` (midpoint
/// for a flat piece). Falls back to the point closest in Z. The returned
/// point always has `z` as its height, except for the fallback.
pub fn interpolate_at_z(curve: &[Vec3], z: f32) -> Vec3 {
    match curve {
        [] => return Vec3::new(0.0, 0.0, z),
        [only] => return *only,
        _ => {}
    }

    for w in curve.windows(2) {
        let (lo, hi) = if w[0].z <= w[1].z { (w[0], w[1]) } else { (w[1], w[0]) };
        if z < lo.z || z > hi.z {
            continue;
        }
        let dz = hi.z - lo.z;
        if dz < DEGENERATE {
            let m = (lo + hi) * 0.5;
            return Vec3::new(m.x, m.y, z);
        }
        let t = (z - lo.z) / dz;
        let p = lo + (hi - lo) * t;
        return Vec3::new(p.x, p.y, z);
    }

    curve
        .iter()
        .min_by(|a, b| (a.z - z).abs().total_cmp(&(b.z - z).abs()))
        .copied()
        .unwrap_or_else(|| Vec3::new(0.0, 0.0, z))
}

/// Unit finite-difference tangent at `index`: one-sided at the ends,
/// central inside.
pub fn tangent_at(curve: &[Vec3], index: usize) -> Vec3 {
    let n = curve.len();
    if n < 2 || index >= n {
        return Vec3::z();
    }
    let d = if index == 0 {
        curve[1] - curve[0]
    } else if index == n - 1 {
        curve[n - 1] - curve[n - 2]
    } else {
        curve[index + 1] - curve[index - 1]
    };
    normalize_or_z(&d)
}

/// Tangent at height `z`, blended between the tangents at the ends of the
/// bracketing piece and clamped to the end tangents outside the curve.
pub fn tangent_at_z(curve: &[Vec3], z: f32) -> Vec3 {
    let n = curve.len();
    if n < 2 {
        return Vec3::z();
    }
    if z <= curve[0].z {
        return tangent_at(curve, 0);
    }
    if z >= curve[n - 1].z {
        return tangent_at(curve, n - 1);
    }
    for i in 0..n - 1 {
        let (a, b) = (curve[i].z, curve[i + 1].z);
        if z >= a && z <= b {
            let t = if b - a < DEGENERATE { 0.0 } else { (z - a) / (b - a) };
            let ta = tangent_at(curve, i);
            let tb = tangent_at(curve, i + 1);
            return normalize_or_z(&(ta + (tb - ta) * t));
        }
    }
    Vec3::z()
}

/// Blend each interior point toward the average of itself and its
/// neighbours. Endpoints are fixed.
pub fn smooth(points: &[Vec3], factor: f32) -> Vec<Vec3> {
    if points.len() < 3 || factor <= 0.0 {
        return points.to_vec();
    }
    let mut out = points.to_vec();
    for i in 1..points.len() - 1 {
        let avg = (points[i - 1] + points[i] + points[i + 1]) / 3.0;
        out[i] = points[i] + (avg - points[i]) * factor;
    }
    out
}
