//! Lateral edge construction between two sections.
//!
//! The two sections are flattened and centred on a shared point, the first
//! one is shrunk until the boundaries no longer cross, and the vertices of
//! both are then matched by polar angle around that shared centre. Every
//! edge is finally mapped back onto the true (unflattened, unscaled)
//! section geometry.

use tracing::debug;

use tube_kernel_math::{line_intersection, segments_cross, to_xy, Vec2, Vec3};
use tube_kernel_section::{Anchor, Edge, Section};

use crate::error::{Result, SegmentError};
use crate::polar::{group_angles, polar_coordinates, ray_exit, AngleGroup};
use crate::settings::ConnectSettings;

/// One input section of a connection attempt.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Side<'a> {
    /// Position of the section in the tube.
    pub index: usize,
    /// The section as stored.
    pub section: &'a Section,
}

/// A section copy in the shared working frame, with what is needed to map
/// working coordinates back.
struct Working<'a> {
    side: Side<'a>,
    /// Flattened, centred and scaled copy.
    work: Section,
    /// Original centroid in XY.
    origin_xy: Vec2,
    /// Shared working centre in XY.
    center_xy: Vec2,
    /// Cumulative scale applied to the working copy.
    scale: f32,
    /// Original centroid height, restored on every edge end.
    z: f32,
}

impl<'a> Working<'a> {
    fn new(side: Side<'a>, center: &Vec3) -> Self {
        let centroid = side.section.centroid();
        let mut work = side.section.clone();
        work.flatten();
        work.center_at(center);
        Self {
            side,
            work,
            origin_xy: to_xy(&centroid),
            center_xy: to_xy(center),
            scale: 1.0,
            z: centroid.z,
        }
    }

    fn shrink(&mut self, factor: f32) {
        self.work.scale(factor);
        self.scale *= factor;
    }

    /// Working point (XY) to true section space.
    fn to_true(&self, w: &Vec3) -> Vec3 {
        let p = self.origin_xy + (to_xy(w) - self.center_xy) / self.scale;
        Vec3::new(p.x, p.y, self.z)
    }

    fn vertex(&self, point: usize) -> End {
        let work = self.work.points()[point];
        End {
            work: Vec3::new(work.x, work.y, self.z),
            truth: self.side.section.points()[point],
            anchor: Anchor::Vertex {
                section: self.side.index,
                point,
            },
        }
    }

    fn boundary_at(&self, angle: f32) -> End {
        let exit = ray_exit(&self.work, angle);
        let truth = exit
            .on_edge
            .and_then(|param| param.evaluate(self.side.section.points()))
            .unwrap_or_else(|| self.to_true(&exit.point));
        End {
            work: Vec3::new(exit.point.x, exit.point.y, self.z),
            truth,
            anchor: Anchor::Interpolated {
                section: self.side.index,
                on_edge: exit.on_edge,
            },
        }
    }
}

/// One end of a lateral edge in both coordinate systems.
#[derive(Debug, Clone, Copy)]
struct End {
    work: Vec3,
    truth: Vec3,
    anchor: Anchor,
}

/// A lateral edge in both coordinate systems.
#[derive(Debug, Clone, Copy)]
struct Lateral {
    work: Edge,
    truth: Edge,
}

impl Lateral {
    fn new(start: End, end: End) -> Self {
        Self {
            work: Edge::anchored(start.work, start.anchor, end.work, end.anchor),
            truth: Edge::anchored(start.truth, start.anchor, end.truth, end.anchor),
        }
    }
}

/// Connect `start` and `end`, trying the canonical order first and the
/// swapped order second.
///
/// Returned edges run from `start` to `end` in ascending polar angle.
pub(crate) fn connect(start: Side<'_>, end: Side<'_>, settings: &ConnectSettings) -> Result<Vec<Edge>> {
    settings.validate()?;
    if start.section.is_empty() {
        return Err(SegmentError::EmptySection(start.index));
    }
    if end.section.is_empty() {
        return Err(SegmentError::EmptySection(end.index));
    }
    if start.index == end.index {
        return Err(SegmentError::SameSection(start.index));
    }

    let (first, second) = if start.index <= end.index {
        (start, end)
    } else {
        (end, start)
    };

    debug!(
        first = first.index,
        second = second.index,
        "connecting sections"
    );

    let edges = match attempt(first, second, settings) {
        Ok(edges) => edges,
        Err(first_err) => {
            debug!(error = %first_err, "canonical order failed, trying swapped order");
            attempt(second, first, settings).map_err(|second_err| SegmentError::Unconnectable {
                start: start.index,
                end: end.index,
                first: Box::new(first_err),
                second: Box::new(second_err),
            })?
        }
    };

    Ok(edges
        .into_iter()
        .map(|mut e| {
            if e.start_anchor.section() != Some(start.index) {
                e.swap();
            }
            e
        })
        .collect())
}

/// One construction attempt with `a` as the section that gets shrunk.
fn attempt(a: Side<'_>, b: Side<'_>, settings: &ConnectSettings) -> Result<Vec<Edge>> {
    let mut center = (a.section.centroid() + b.section.centroid()) * 0.5;
    center.z = 0.0;

    let mut wa = Working::new(a, &center);
    let wb = Working::new(b, &center);

    separate(&mut wa, &wb, settings)?;

    let laterals = polar_edges(&wa, &wb, settings)?;
    debug!(count = laterals.len(), "polar matching produced lateral edges");

    check_connectivity(&laterals, &wa).or_else(|_| check_connectivity(&laterals, &wb))?;
    check_boundary_crossings(&laterals, &wa, settings)?;

    Ok(laterals.into_iter().map(|l| l.truth).collect())
}

/// `true` if any implicit edge of `a` strictly crosses one of `b`.
fn boundaries_cross(a: &Section, b: &Section) -> bool {
    let ea = a.implicit_edges(0);
    let eb = b.implicit_edges(1);
    ea.iter().any(|x| eb.iter().any(|y| x.intersects(y)))
}

/// Shrink `wa` about its centre until its boundary no longer crosses `wb`'s.
fn separate(wa: &mut Working<'_>, wb: &Working<'_>, settings: &ConnectSettings) -> Result<()> {
    for iteration in 0..settings.max_iterations {
        if !boundaries_cross(&wa.work, &wb.work) {
            debug!(iteration, scale = wa.scale, "boundaries separated");
            return Ok(());
        }
        let next = wa.scale * settings.scale_factor;
        if next < settings.min_scale {
            return Err(SegmentError::ScalingExhausted { scale: next });
        }
        wa.shrink(settings.scale_factor);
        if iteration % 20 == 0 {
            debug!(iteration, scale = wa.scale, "shrinking first section");
        }
    }
    Err(SegmentError::ScalingExhausted { scale: wa.scale })
}

/// Match vertices of both working sections by polar angle.
fn polar_edges(wa: &Working<'_>, wb: &Working<'_>, settings: &ConnectSettings) -> Result<Vec<Lateral>> {
    let pa = polar_coordinates(&wa.work);
    let pb = polar_coordinates(&wb.work);
    let groups = group_angles(&pa, &pb, settings.angle_tolerance);

    let mut laterals: Vec<Lateral> = Vec::with_capacity(pa.len() + pb.len());
    for group in &groups {
        laterals.extend(edges_for_group(group, wa, wb));
    }

    laterals.retain(|l| l.truth.is_valid());

    let mut unique: Vec<Lateral> = Vec::with_capacity(laterals.len());
    for l in laterals {
        if !unique
            .iter()
            .any(|u| u.work.coincides(&l.work, settings.point_tolerance))
        {
            unique.push(l);
        }
    }

    if unique.is_empty() {
        return Err(SegmentError::NoEdges);
    }
    Ok(unique)
}

/// Edges for one angle group.
///
/// Vertices present on both sides are paired one-to-one, nearest radius
/// with nearest radius. Anything left over is wired to the other section's
/// boundary along its own angle.
fn edges_for_group(group: &AngleGroup, wa: &Working<'_>, wb: &Working<'_>) -> Vec<Lateral> {
    let paired = group.first.len().min(group.second.len());
    let mut out = Vec::with_capacity(group.first.len().max(group.second.len()));

    for (p, q) in group.first.iter().zip(&group.second) {
        out.push(Lateral::new(wa.vertex(p.index), wb.vertex(q.index)));
    }
    for p in &group.first[paired..] {
        out.push(Lateral::new(wa.vertex(p.index), wb.boundary_at(p.angle)));
    }
    for q in &group.second[paired..] {
        out.push(Lateral::new(wa.boundary_at(q.angle), wb.vertex(q.index)));
    }
    out
}

/// Every vertex of `w` may be touched by at most one lateral edge.
fn check_connectivity(laterals: &[Lateral], w: &Working<'_>) -> Result<()> {
    for vertex in 0..w.work.len() {
        let anchor = Anchor::Vertex {
            section: w.side.index,
            point: vertex,
        };
        let edges = laterals
            .iter()
            .filter(|l| l.work.start_anchor == anchor || l.work.end_anchor == anchor)
            .count();
        if edges > 1 {
            return Err(SegmentError::UnresolvedConnectivity {
                section: w.side.index,
                vertex,
                edges,
            });
        }
    }
    Ok(())
}

/// No lateral edge may cross the (shrunk) boundary of `w`, except where the
/// crossing is one of the lateral edge's own endpoints.
fn check_boundary_crossings(
    laterals: &[Lateral],
    w: &Working<'_>,
    settings: &ConnectSettings,
) -> Result<()> {
    let xy = w.work.points_xy();
    let mut count = 0;

    for l in laterals {
        let s = to_xy(&l.work.start);
        let e = to_xy(&l.work.end);
        for (i, j) in w.work.edge_indices() {
            if !segments_cross(&s, &e, &xy[i], &xy[j]) {
                continue;
            }
            let at_endpoint = line_intersection(&s, &e, &xy[i], &xy[j]).is_some_and(|x| {
                (x - s).norm() < settings.point_tolerance || (x - e).norm() < settings.point_tolerance
            });
            if !at_endpoint {
                count += 1;
            }
        }
    }

    if count > 0 {
        return Err(SegmentError::ResidualIntersection {
            section: w.side.index,
            count,
        });
    }
    Ok(())
}
