//! End-to-end scenarios across the kernel crates.

use approx::assert_abs_diff_eq;
use tube_kernel::tube_kernel_math::{segments_cross, to_xy};
use tube_kernel::{
    Anchor, Attenuation, ConnectSettings, DeformationEngine, DeformationPoint, MeshOptions, Section,
    Segment, Tube, Vec3,
};

fn square(size: f32, z: f32) -> Section {
    Section::from_xy(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)], z)
}

fn tube_of(sections: Vec<Section>) -> Tube {
    let mut tube = Tube::new();
    for s in sections {
        tube.add_section(s).unwrap();
    }
    let report = tube.build_all_segments(&ConnectSettings::default()).unwrap();
    assert!(report.is_success(), "failed pairs: {:?}", report.failed);
    tube
}

#[test]
fn test_congruent_squares_make_a_box() {
    let tube = tube_of(vec![square(10.0, 0.0), square(10.0, 100.0)]);
    let seg = tube.segment(0).unwrap();
    assert_eq!(seg.edge_count(), 4);
    for e in seg.edges() {
        assert_eq!(e.start_anchor.point(), e.end_anchor.point());
    }
    let result = tube.build_mesh(&MeshOptions::default());
    assert!(result.success);
    assert_eq!(result.mesh.face_count(), 8);
}

#[test]
fn test_triangle_to_hexagon_interpolates_on_triangle_boundary() {
    let tri = Section::regular(3, 10.0, Vec3::zeros(), 0.0);
    let hex = Section::regular(6, 4.0, Vec3::new(0.0, 0.0, 25.0), 0.0);
    let tube = tube_of(vec![tri.clone(), hex]);
    let seg = tube.segment(0).unwrap();

    let interpolated: Vec<_> = seg
        .edges()
        .iter()
        .filter(|e| e.start_anchor.is_interpolated())
        .collect();
    // three hexagon vertices have no triangle partner
    assert!(interpolated.len() >= 3);

    let pts = tri.points();
    for e in interpolated {
        let p = to_xy(&e.start);
        let on_boundary = tri.edge_indices().any(|(i, j)| {
            let a = to_xy(&pts[i]);
            let b = to_xy(&pts[j]);
            let cross = (b - a).perp(&(p - a));
            let dot = (p - a).dot(&(b - a));
            cross.abs() < 1e-3 && dot >= -1e-3 && dot <= (b - a).norm_squared() + 1e-3
        });
        assert!(on_boundary, "{:?} is off the triangle boundary", e.start);
        assert_abs_diff_eq!(e.start.z, 0.0, epsilon = 1e-5);
    }
}

#[test]
fn test_nested_convex_pairs_cover_every_vertex() {
    let settings = ConnectSettings::default();
    let shapes = [(3, 0.0), (4, 0.4), (5, 0.1), (8, 0.0), (12, 0.25)];
    for &(n1, p1) in &shapes {
        for &(n2, p2) in &shapes {
            for (r1, r2) in [(3.0, 9.0), (9.0, 3.0)] {
                let a = Section::regular(n1, r1, Vec3::zeros(), p1);
                let b = Section::regular(n2, r2, Vec3::new(0.2, -0.1, 12.0), p2);
                let seg = Segment::connect(0, &a, 1, &b, &settings)
                    .unwrap_or_else(|e| panic!("{n1}/{n2} r={r1}/{r2}: {e}"));

                let edges = seg.edges();
                for (k, x) in edges.iter().enumerate() {
                    assert_abs_diff_eq!(x.start.z, 0.0, epsilon = 1e-4);
                    assert_abs_diff_eq!(x.end.z, 12.0, epsilon = 1e-4);
                    for y in &edges[k + 1..] {
                        let cross = segments_cross(
                            &to_xy(&x.start),
                            &to_xy(&x.end),
                            &to_xy(&y.start),
                            &to_xy(&y.end),
                        );
                        assert!(
                            x.has_common_point(y) || !cross,
                            "{n1}/{n2} r={r1}/{r2}: {x:?} crosses {y:?}"
                        );
                    }
                }
                for (section, count) in [(0, n1), (1, n2)] {
                    for point in 0..count {
                        let anchor = Anchor::Vertex { section, point };
                        assert!(
                            seg.edges()
                                .iter()
                                .any(|e| e.start_anchor == anchor || e.end_anchor == anchor),
                            "{n1}/{n2} r={r1}/{r2}: vertex {point} of {section} is unused"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_face_count_formula_over_a_long_tube() {
    let tube = tube_of(vec![
        square(10.0, 0.0),
        Section::regular(8, 6.0, Vec3::new(5.0, 5.0, 10.0), 0.1),
        Section::regular(5, 4.0, Vec3::new(5.0, 5.0, 20.0), 0.3),
        square(10.0, 30.0),
    ]);
    let lateral: usize = tube.segments().iter().map(Segment::edge_count).sum();
    let result = tube.build_mesh(&MeshOptions::default());
    assert!(result.success);
    assert_eq!(
        result.mesh.face_count(),
        2 * lateral - 2 * result.skipped_quads
    );
}

#[test]
fn test_gaussian_drag_at_curve_midpoint() {
    let curve: Vec<Vec3> = (0..=20).map(|i| Vec3::new(0.0, 0.0, i as f32 * 5.0)).collect();
    let length = 100.0;
    let mut engine = DeformationEngine::new();
    engine
        .add_point(DeformationPoint::new(
            Vec3::new(0.0, 0.0, 50.0),
            Vec3::new(50.0, 0.0, 0.0),
            0.3 * length,
            Attenuation::Gaussian,
        ))
        .unwrap();

    let out = engine.apply_to_curve(&curve);
    assert_eq!(out.len(), curve.len());
    assert_abs_diff_eq!(out[10], Vec3::new(50.0, 0.0, 50.0), epsilon = 1e-4);
    let end_shift = (out[0] - curve[0]).norm();
    assert!(end_shift > 0.0 && end_shift < 50.0);
    assert!((out[20] - curve[20]).norm() < 50.0);
    assert!((out[5] - curve[5]).norm() > end_shift);
}

#[test]
fn test_disabled_points_are_identity() {
    let curve: Vec<Vec3> = (0..4).map(|i| Vec3::new(i as f32, 0.0, i as f32)).collect();
    let mut engine = DeformationEngine::new();
    let mut p = DeformationPoint::new(Vec3::zeros(), Vec3::x(), 10.0, Attenuation::Linear);
    p.set_enabled(false);
    engine.add_point(p).unwrap();
    assert_eq!(engine.apply_to_curve(&curve), curve);

    let mut tube = tube_of(vec![square(4.0, 0.0), square(4.0, 10.0)]);
    let before = tube.clone();
    let report = engine.apply_to_tube(&mut tube).unwrap();
    assert!(!report.changed());
    assert_eq!(tube, before);
}

#[test]
fn test_uniform_displacement_is_rigid_translation() {
    let mut tube = tube_of(vec![square(4.0, 0.0), square(4.0, 10.0), square(4.0, 20.0)]);
    let before = tube.clone();
    let mut engine = DeformationEngine::new();
    engine
        .add_point(DeformationPoint::new(
            Vec3::new(2.0, 2.0, 10.0),
            Vec3::new(3.0, -1.0, 0.0),
            5000.0,
            Attenuation::Gaussian,
        ))
        .unwrap();
    engine.apply_to_tube(&mut tube).unwrap();

    for (a, b) in tube.sections().iter().zip(before.sections()) {
        for (p, q) in a.points().iter().zip(b.points()) {
            assert_abs_diff_eq!(*p - *q, Vec3::new(3.0, -1.0, 0.0), epsilon = 1e-2);
        }
    }
}

#[test]
fn test_deformed_tube_still_meshes() {
    let mut tube = tube_of(vec![
        Section::regular(6, 3.0, Vec3::zeros(), 0.0),
        Section::regular(6, 3.0, Vec3::new(0.0, 0.0, 10.0), 0.0),
        Section::regular(6, 3.0, Vec3::new(0.0, 0.0, 20.0), 0.0),
    ]);
    let mut engine = DeformationEngine::new();
    engine
        .add_point(DeformationPoint::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(4.0, 0.0, 0.0),
            8.0,
            Attenuation::Gaussian,
        ))
        .unwrap();
    let report = engine.apply_to_tube(&mut tube).unwrap();
    assert!(!report.needs_rebuild());

    let result = tube.build_mesh(&MeshOptions { cap_ends: true });
    assert!(result.success);
    assert_eq!(result.mesh.face_count(), 2 * 12 + 2 * 4);
    for seg in tube.segments() {
        for e in seg.edges() {
            if let Anchor::Vertex { section, point } = e.end_anchor {
                assert_abs_diff_eq!(e.end, tube.sections()[section].points()[point]);
            }
        }
    }
}
