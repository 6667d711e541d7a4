//! Deformation of centerlines and whole tubes.

use tracing::{debug, info};

use tube_kernel_math::Vec3;
use tube_kernel_segment::GeometryRefresh;
use tube_kernel_tube::Tube;

use crate::curve::{curve_length, interpolate_at_z, is_valid_curve, resample, smooth, tangent_at, tangent_at_z};
use crate::error::{DeformError, Result};
use crate::frame::LocalFrame;
use crate::point::{Attenuation, DeformationPoint, WEIGHT_EPSILON};
use crate::settings::EngineSettings;

/// Share of the curve length used as the smallest drag radius.
const DRAG_RADIUS_FRACTION: f32 = 0.3;

/// What a tube deformation did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeformReport {
    /// Sections whose points were rewritten.
    pub sections_moved: usize,
    /// Largest distance a section center travelled.
    pub max_center_shift: f32,
    /// Lateral edge refresh after the move.
    pub refresh: GeometryRefresh,
}

impl DeformReport {
    /// Nothing was changed.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// `true` if the tube was modified.
    pub fn changed(&self) -> bool {
        self.sections_moved > 0
    }

    /// Some lateral endpoints could not follow; segments should be rebuilt.
    pub fn needs_rebuild(&self) -> bool {
        !self.refresh.is_complete()
    }
}

/// Holds deformation points and applies them to curves and tubes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeformationEngine {
    points: Vec<DeformationPoint>,
    settings: EngineSettings,
}

impl DeformationEngine {
    /// Engine with default settings and no points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the given settings.
    pub fn with_settings(settings: EngineSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            points: Vec::new(),
            settings,
        })
    }

    /// One drag point per `(source, target)` pair.
    pub fn from_points(
        sources: &[Vec3],
        targets: &[Vec3],
        influence_radius: f32,
        attenuation: Attenuation,
    ) -> Result<Self> {
        if sources.len() != targets.len() {
            return Err(DeformError::MismatchedPoints {
                sources: sources.len(),
                targets: targets.len(),
            });
        }
        let mut engine = Self::new();
        for (s, t) in sources.iter().zip(targets) {
            engine.add_point(DeformationPoint::from_drag(*s, *t, influence_radius, attenuation))?;
        }
        Ok(engine)
    }

    /// Current settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Replace the settings after validating them.
    pub fn set_settings(&mut self, settings: EngineSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    // ---- points ----------------------------------------------------------

    /// Add a point; returns its index. Invalid points are rejected.
    pub fn add_point(&mut self, point: DeformationPoint) -> Result<usize> {
        if !point.is_valid() {
            return Err(DeformError::InvalidPoint);
        }
        self.points.push(point);
        Ok(self.points.len() - 1)
    }

    /// Remove the point at `index`.
    pub fn remove_point(&mut self, index: usize) -> Result<DeformationPoint> {
        if index >= self.points.len() {
            return Err(DeformError::PointOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(self.points.remove(index))
    }

    /// Mutable point at `index`.
    pub fn point_mut(&mut self, index: usize) -> Option<&mut DeformationPoint> {
        self.points.get_mut(index)
    }

    /// Drop every point.
    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// All points.
    pub fn points(&self) -> &[DeformationPoint] {
        &self.points
    }

    /// `true` if any point is enabled.
    pub fn has_active_deformations(&self) -> bool {
        self.points.iter().any(DeformationPoint::is_enabled)
    }

    /// Settings valid and every point valid.
    pub fn is_valid(&self) -> bool {
        self.settings.validate().is_ok() && self.points.iter().all(DeformationPoint::is_valid)
    }

    /// Clear points and restore default settings.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ---- curves ----------------------------------------------------------

    /// Resample short curves so the field is sampled densely enough.
    fn working_curve(&self, curve: &[Vec3]) -> Vec<Vec3> {
        if curve.len() < self.settings.resample_threshold {
            let target = (curve.len() - 1) * self.settings.samples_per_segment + 1;
            resample(curve, target)
        } else {
            curve.to_vec()
        }
    }

    fn displace(&self, curve: &mut [Vec3]) {
        for dp in self.points.iter().filter(|p| p.is_enabled()) {
            let mut affected = 0usize;
            for p in curve.iter_mut() {
                let w = dp.weight_at(p);
                if w > WEIGHT_EPSILON {
                    *p += dp.displacement() * w;
                    affected += 1;
                }
            }
            debug!(affected, radius = dp.influence_radius(), "deformation point applied");
        }
    }

    /// Deformed copy of `curve`.
    ///
    /// Curves shorter than the resample threshold are first resampled to
    /// `samples_per_segment` points per piece, so the result may be longer
    /// than the input. Invalid curves, or an engine without enabled points,
    /// return the input unchanged.
    pub fn apply_to_curve(&self, curve: &[Vec3]) -> Vec<Vec3> {
        if !is_valid_curve(curve) || !self.has_active_deformations() {
            return curve.to_vec();
        }
        let mut working = self.working_curve(curve);
        self.displace(&mut working);
        working
    }

    /// Drag the curve from `source` toward `target` with a single point.
    ///
    /// The radius is at least 30% of the curve length. Stored points are
    /// not used.
    pub fn apply_single_drag(
        &self,
        curve: &[Vec3],
        source: Vec3,
        target: Vec3,
        influence_radius: f32,
        attenuation: Attenuation,
    ) -> Vec<Vec3> {
        if !is_valid_curve(curve) {
            return curve.to_vec();
        }
        let radius = influence_radius.max(curve_length(curve) * DRAG_RADIUS_FRACTION);
        let dp = DeformationPoint::from_drag(source, target, radius, attenuation);
        if !dp.is_valid() {
            return curve.to_vec();
        }
        curve
            .iter()
            .map(|p| {
                let w = dp.weight_at(p);
                if w > WEIGHT_EPSILON {
                    p + dp.displacement() * w
                } else {
                    *p
                }
            })
            .collect()
    }

    // ---- tubes -----------------------------------------------------------

    /// Bend the tube along its deformed centerline.
    ///
    /// Each section is carried rigidly: its points are expressed in the
    /// local frame of the undeformed centerline and re-emitted in the frame
    /// of the deformed one. Lateral edges are then refreshed; the report
    /// says whether a segment rebuild is still needed.
    pub fn apply_to_tube(&self, tube: &mut Tube) -> Result<DeformReport> {
        self.settings.validate()?;
        if tube.section_count() < 2 || !self.has_active_deformations() {
            return Ok(DeformReport::unchanged());
        }

        let original = tube.centers_curve();
        if !is_valid_curve(&original) {
            return Ok(DeformReport::unchanged());
        }
        let base = self.working_curve(&original);
        let mut deformed = base.clone();
        self.displace(&mut deformed);

        let direct = base.len() == original.len();
        let mut report = DeformReport::default();

        for (i, old_center) in original.iter().enumerate() {
            let (new_center, old_tangent, new_tangent) = if direct {
                (deformed[i], tangent_at(&base, i), tangent_at(&deformed, i))
            } else {
                let z = old_center.z;
                (
                    interpolate_at_z(&deformed, z),
                    tangent_at_z(&base, z),
                    tangent_at_z(&deformed, z),
                )
            };
            let old_frame = LocalFrame::from_tangent(&old_tangent);
            let new_frame = LocalFrame::from_tangent(&new_tangent);

            let Some(section) = tube.section_mut(i) else {
                continue;
            };
            for p in section.points_mut() {
                let local = old_frame.to_local(&(*p - old_center));
                *p = new_center + new_frame.to_world(&local);
            }

            report.sections_moved += 1;
            report.max_center_shift = report.max_center_shift.max((new_center - old_center).norm());
        }

        report.refresh = tube.update_segment_geometry();
        info!(
            sections = report.sections_moved,
            max_shift = report.max_center_shift,
            stale = report.refresh.stale,
            "tube deformed"
        );
        Ok(report)
    }

    /// Translate each section by the field evaluated at its centroid.
    ///
    /// Displacements are clamped to `max_magnitude` and, when enabled, the
    /// new centers are smoothed before moving.
    pub fn apply_translation_mode(&self, tube: &mut Tube) -> Result<DeformReport> {
        self.settings.validate()?;
        if tube.section_count() < 2 || !self.has_active_deformations() {
            return Ok(DeformReport::unchanged());
        }

        let old_centers = tube.centers_curve();
        let mut new_centers: Vec<Vec3> = old_centers
            .iter()
            .map(|c| {
                let mut d: Vec3 = self.points.iter().map(|p| p.displacement_at(c)).sum();
                let len = d.norm();
                if len > self.settings.max_magnitude {
                    d *= self.settings.max_magnitude / len;
                }
                c + d
            })
            .collect();
        if self.settings.smoothing_enabled {
            new_centers = smooth(&new_centers, self.settings.smoothing_factor);
        }

        let mut report = DeformReport::default();
        for (i, (old, new)) in old_centers.iter().zip(&new_centers).enumerate() {
            let shift = new - old;
            if let Some(section) = tube.section_mut(i) {
                section.translate(&shift);
                report.sections_moved += 1;
                report.max_center_shift = report.max_center_shift.max(shift.norm());
            }
        }
        report.refresh = tube.update_segment_geometry();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tube_kernel_section::Section;
    use tube_kernel_segment::ConnectSettings;

    fn straight_tube(zs: &[f32]) -> Tube {
        let mut tube = Tube::new();
        for &z in zs {
            tube.add_section(Section::regular(6, 3.0, Vec3::new(0.0, 0.0, z), 0.0))
                .unwrap();
        }
        tube.build_all_segments(&ConnectSettings::default()).unwrap();
        tube
    }

    fn push_x(at: Vec3, amount: f32, radius: f32) -> DeformationPoint {
        DeformationPoint::new(at, Vec3::new(amount, 0.0, 0.0), radius, Attenuation::Gaussian)
    }

    #[test]
    fn test_point_management() {
        let mut engine = DeformationEngine::new();
        assert!(!engine.has_active_deformations());
        engine.add_point(push_x(Vec3::zeros(), 1.0, 1.0)).unwrap();
        assert!(engine.has_active_deformations());
        engine.point_mut(0).unwrap().set_enabled(false);
        assert!(!engine.has_active_deformations());
        assert!(matches!(
            engine.remove_point(4),
            Err(DeformError::PointOutOfRange { index: 4, len: 1 })
        ));
        engine.remove_point(0).unwrap();
        assert_eq!(engine.point_count(), 0);
    }

    #[test]
    fn test_from_points_mismatch() {
        let err = DeformationEngine::from_points(&[Vec3::zeros()], &[], 1.0, Attenuation::Linear);
        assert_eq!(
            err,
            Err(DeformError::MismatchedPoints {
                sources: 1,
                targets: 0
            })
        );
        let engine =
            DeformationEngine::from_points(&[Vec3::zeros()], &[Vec3::x()], 1.0, Attenuation::Linear).unwrap();
        assert_eq!(engine.points()[0].displacement(), Vec3::x());
    }

    #[test]
    fn test_curve_is_resampled_and_displaced() {
        let mut engine = DeformationEngine::new();
        engine.add_point(push_x(Vec3::new(0.0, 0.0, 10.0), 2.0, 4.0)).unwrap();
        let curve = [Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 20.0)];
        let out = engine.apply_to_curve(&curve);
        assert_eq!(out.len(), 201);
        assert_abs_diff_eq!(out[100], Vec3::new(2.0, 0.0, 10.0), epsilon = 1e-3);
        assert_abs_diff_eq!(out[0], Vec3::zeros(), epsilon = 1e-4);
    }

    #[test]
    fn test_curve_without_points_is_unchanged() {
        let engine = DeformationEngine::new();
        let curve = [Vec3::zeros(), Vec3::z()];
        assert_eq!(engine.apply_to_curve(&curve), curve.to_vec());
        assert_eq!(engine.apply_to_curve(&curve[..1]), curve[..1].to_vec());
    }

    #[test]
    fn test_single_drag_uses_adaptive_radius() {
        let engine = DeformationEngine::new();
        let curve: Vec<Vec3> = (0..=20).map(|i| Vec3::new(0.0, 0.0, i as f32)).collect();
        let out = engine.apply_single_drag(
            &curve,
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(1.0, 0.0, 10.0),
            0.1,
            Attenuation::Gaussian,
        );
        assert_abs_diff_eq!(out[10].x, 1.0, epsilon = 1e-6);
        // radius 6 from the curve length, so neighbours move too
        assert!(out[12].x > 0.5);
        assert_eq!(out.len(), curve.len());
    }

    #[test]
    fn test_far_point_leaves_tube_unchanged() {
        let mut tube = straight_tube(&[0.0, 10.0, 20.0]);
        let before = tube.clone();
        let mut engine = DeformationEngine::new();
        engine.add_point(push_x(Vec3::new(1000.0, 0.0, 0.0), 5.0, 1.0)).unwrap();
        let report = engine.apply_to_tube(&mut tube).unwrap();
        assert!(report.max_center_shift < 1e-4);
        for (a, b) in tube.sections().iter().zip(before.sections()) {
            for (p, q) in a.points().iter().zip(b.points()) {
                assert_abs_diff_eq!(p, q, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_gaussian_bend_moves_middle_most() {
        let mut tube = straight_tube(&[0.0, 10.0, 20.0]);
        let diameters: Vec<f32> = tube.sections().iter().map(Section::diameter).collect();
        let mut engine = DeformationEngine::new();
        engine.add_point(push_x(Vec3::new(0.0, 0.0, 10.0), 5.0, 10.0)).unwrap();

        let report = engine.apply_to_tube(&mut tube).unwrap();
        assert_eq!(report.sections_moved, 3);
        assert!(report.refresh.is_complete());

        let centers = tube.centers_curve();
        assert_abs_diff_eq!(centers[1], Vec3::new(5.0, 0.0, 10.0), epsilon = 1e-2);
        assert!(centers[0].x > 0.0 && centers[0].x < centers[1].x);
        assert!(centers[2].x > 0.0 && centers[2].x < centers[1].x);

        // sections move rigidly
        for (s, d) in tube.sections().iter().zip(&diameters) {
            assert_abs_diff_eq!(s.diameter(), *d, epsilon = 1e-3);
            assert_eq!(s.len(), 6);
        }
        // lateral edges follow the new vertices
        for seg in tube.segments() {
            for e in seg.edges() {
                if let Some(p) = e.start_anchor.point() {
                    assert_abs_diff_eq!(e.start, tube.sections()[seg.start_section()].points()[p]);
                }
            }
        }
    }

    #[test]
    fn test_end_sections_tilt_with_the_bend() {
        let mut tube = straight_tube(&[0.0, 10.0, 20.0]);
        let mut engine = DeformationEngine::new();
        engine.add_point(push_x(Vec3::new(0.0, 0.0, 10.0), 5.0, 10.0)).unwrap();
        engine.apply_to_tube(&mut tube).unwrap();
        // the first section leans toward +X, so its points no longer share a height
        let zs: Vec<f32> = tube.sections()[0].points().iter().map(|p| p.z).collect();
        let spread = zs.iter().cloned().fold(f32::MIN, f32::max) - zs.iter().cloned().fold(f32::MAX, f32::min);
        assert!(spread > 1e-2);
    }

    #[test]
    fn test_translation_mode_clamps() {
        let mut tube = straight_tube(&[0.0, 10.0, 20.0]);
        let mut engine = DeformationEngine::with_settings(EngineSettings {
            smoothing_enabled: false,
            max_magnitude: 2.0,
            ..Default::default()
        })
        .unwrap();
        engine.add_point(push_x(Vec3::new(0.0, 0.0, 10.0), 5.0, 10.0)).unwrap();
        let report = engine.apply_translation_mode(&mut tube).unwrap();
        assert_abs_diff_eq!(report.max_center_shift, 2.0, epsilon = 1e-5);
        let centers = tube.centers_curve();
        assert_abs_diff_eq!(centers[1], Vec3::new(2.0, 0.0, 10.0), epsilon = 1e-5);
        // sections only translate, so they stay flat
        assert!(tube.sections().iter().all(|s| s.points().iter().all(|p| (p.z - s.points()[0].z).abs() < 1e-5)));
    }

    #[test]
    fn test_too_few_sections_is_noop() {
        let mut tube = Tube::new();
        tube.add_section(Section::regular(4, 1.0, Vec3::zeros(), 0.0)).unwrap();
        let mut engine = DeformationEngine::new();
        engine.add_point(push_x(Vec3::zeros(), 1.0, 1.0)).unwrap();
        assert_eq!(engine.apply_to_tube(&mut tube).unwrap(), DeformReport::unchanged());
    }
}
