//! Polar views of working sections.

use std::f32::consts::TAU;

use tube_kernel_math::{ray_segment_hit, to_xy, Vec2, Vec3};
use tube_kernel_section::{EdgeParam, Section};

/// A section vertex seen from the section's centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PolarPoint {
    /// Point slot in the section.
    pub index: usize,
    /// Angle in `[0, 2π)`.
    pub angle: f32,
    /// Distance from the centroid in the XY plane.
    pub radius: f32,
}

/// Polar coordinates of every vertex around the section's own centroid.
pub(crate) fn polar_coordinates(section: &Section) -> Vec<PolarPoint> {
    let c = to_xy(&section.centroid());
    section
        .points()
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let d = to_xy(p) - c;
            PolarPoint {
                index,
                angle: normalize_angle(d.y.atan2(d.x)),
                radius: d.norm(),
            }
        })
        .collect()
}

/// Wrap an angle into `[0, 2π)`.
pub(crate) fn normalize_angle(a: f32) -> f32 {
    let wrapped = a.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Vertices of both sections that share one polar angle.
#[derive(Debug, Clone, Default)]
pub(crate) struct AngleGroup {
    /// Representative angle (smallest member).
    pub angle: f32,
    /// Members from the first section, nearest first.
    pub first: Vec<PolarPoint>,
    /// Members from the second section, nearest first.
    pub second: Vec<PolarPoint>,
}

/// Merge the angles of both sections into ascending groups.
///
/// Consecutive angles closer than `tolerance` share a group, and a group
/// straddling the 0/2π seam is folded into the first one.
pub(crate) fn group_angles(
    first: &[PolarPoint],
    second: &[PolarPoint],
    tolerance: f32,
) -> Vec<AngleGroup> {
    let mut tagged: Vec<(PolarPoint, bool)> = first
        .iter()
        .map(|p| (*p, true))
        .chain(second.iter().map(|p| (*p, false)))
        .collect();
    tagged.sort_by(|a, b| a.0.angle.total_cmp(&b.0.angle));

    let mut groups: Vec<AngleGroup> = Vec::new();
    let mut last_angle = f32::NEG_INFINITY;
    for (p, is_first) in tagged {
        if groups.is_empty() || p.angle - last_angle >= tolerance {
            groups.push(AngleGroup {
                angle: p.angle,
                ..Default::default()
            });
        }
        last_angle = p.angle;
        if let Some(group) = groups.last_mut() {
            if is_first {
                group.first.push(p);
            } else {
                group.second.push(p);
            }
        }
    }

    if groups.len() > 1 {
        let head = groups[0].angle;
        let tail_end = groups
            .last()
            .and_then(|g| g.first.iter().chain(&g.second).map(|p| p.angle).reduce(f32::max))
            .unwrap_or(head);
        if head + TAU - tail_end < tolerance {
            if let Some(tail) = groups.pop() {
                groups[0].first.extend(tail.first);
                groups[0].second.extend(tail.second);
            }
        }
    }

    for g in &mut groups {
        g.first.sort_by(|a, b| a.radius.total_cmp(&b.radius));
        g.second.sort_by(|a, b| a.radius.total_cmp(&b.radius));
    }
    groups
}

/// Where a ray from a section's centroid leaves its boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RayExit {
    /// Exit point in the section's own (working) coordinates, Z = 0.
    pub point: Vec3,
    /// Boundary edge and parameter, when the ray hit one.
    pub on_edge: Option<EdgeParam>,
}

/// Cast a ray from the section's centroid at `angle` and return the nearest
/// boundary crossing.
///
/// Falls back to the point at the section's average radius when no implicit
/// edge is hit (rays grazing a vertex parallel to both neighbours).
pub(crate) fn ray_exit(section: &Section, angle: f32) -> RayExit {
    let center = to_xy(&section.centroid());
    let dir = Vec2::new(angle.cos(), angle.sin());
    let points = section.points();

    let nearest = section
        .edge_indices()
        .filter_map(|(i, j)| {
            ray_segment_hit(&center, &dir, &to_xy(&points[i]), &to_xy(&points[j]))
                .map(|hit| (i, j, hit))
        })
        .min_by(|a, b| a.2.t.total_cmp(&b.2.t));

    match nearest {
        Some((from, to, hit)) => RayExit {
            point: Vec3::new(hit.point.x, hit.point.y, 0.0),
            on_edge: Some(EdgeParam {
                from,
                to,
                t: hit.u,
            }),
        },
        None => {
            let p = center + dir * section.average_radius();
            RayExit {
                point: Vec3::new(p.x, p.y, 0.0),
                on_edge: None,
            }
        }
    }
}
