//! Radial displacement fields.

use serde::{Deserialize, Serialize};
use tube_kernel_math::{is_finite, Vec3};

/// Smallest accepted influence radius.
pub const MIN_RADIUS: f32 = 0.1;
/// Largest accepted influence radius.
pub const MAX_RADIUS: f32 = 5000.0;
/// Smallest accepted strength.
pub const MIN_STRENGTH: f32 = 0.0;
/// Largest accepted strength.
pub const MAX_STRENGTH: f32 = 10.0;

/// Weights at or below this are treated as no influence.
pub const WEIGHT_EPSILON: f32 = 1e-6;

/// Falloff of a deformation point's influence with distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attenuation {
    /// `exp(-0.5 (d / (r/2))²)`, cut off at `3r`.
    #[default]
    Gaussian,
    /// `exp(-d / r)`, cut off at `5r`.
    Exponential,
    /// `1 - d/r`, cut off at `r`.
    Linear,
    /// `1 - (d/r)²`, cut off at `r`.
    Quadratic,
}

impl Attenuation {
    /// Distance past which the weight is zero, for radius `r`.
    pub fn cutoff(&self, r: f32) -> f32 {
        match self {
            Attenuation::Gaussian => 3.0 * r,
            Attenuation::Exponential => 5.0 * r,
            Attenuation::Linear | Attenuation::Quadratic => r,
        }
    }

    /// Unscaled falloff at distance `d` for radius `r`.
    pub fn evaluate(&self, d: f32, r: f32) -> f32 {
        if r <= f32::EPSILON {
            return if d <= f32::EPSILON { 1.0 } else { 0.0 };
        }
        match self {
            Attenuation::Gaussian => {
                let n = d / (0.5 * r);
                (-0.5 * n * n).exp()
            }
            Attenuation::Exponential => (-d / r).exp(),
            Attenuation::Linear => (1.0 - d / r).max(0.0),
            Attenuation::Quadratic => {
                let n = d / r;
                (1.0 - n * n).max(0.0)
            }
        }
    }
}

fn finite_or_zero(v: Vec3) -> Vec3 {
    v.map(|c| if c.is_finite() { c } else { 0.0 })
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// A control point that pushes nearby geometry by a weighted displacement.
///
/// Stateless: the weight depends only on the distance to `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeformationPoint {
    position: Vec3,
    displacement: Vec3,
    influence_radius: f32,
    strength: f32,
    attenuation: Attenuation,
    enabled: bool,
}

impl Default for DeformationPoint {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            displacement: Vec3::zeros(),
            influence_radius: 1.0,
            strength: 1.0,
            attenuation: Attenuation::Gaussian,
            enabled: true,
        }
    }
}

impl DeformationPoint {
    /// New enabled point with strength 1.
    ///
    /// The radius is clamped to `[0.1, 5000]` and non-finite coordinates
    /// become zero.
    pub fn new(position: Vec3, displacement: Vec3, influence_radius: f32, attenuation: Attenuation) -> Self {
        Self {
            position: finite_or_zero(position),
            displacement: finite_or_zero(displacement),
            influence_radius: clamp_or(influence_radius, MIN_RADIUS, MAX_RADIUS, 1.0),
            strength: 1.0,
            attenuation,
            enabled: true,
        }
    }

    /// Point at `source` that drags geometry toward `target`.
    pub fn from_drag(source: Vec3, target: Vec3, influence_radius: f32, attenuation: Attenuation) -> Self {
        Self::new(source, target - source, influence_radius, attenuation)
    }

    /// Builder-style strength.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.set_strength(strength);
        self
    }

    /// Center of influence.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Full displacement applied at weight 1.
    pub fn displacement(&self) -> Vec3 {
        self.displacement
    }

    /// Influence radius.
    pub fn influence_radius(&self) -> f32 {
        self.influence_radius
    }

    /// Strength multiplier.
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Falloff function.
    pub fn attenuation(&self) -> Attenuation {
        self.attenuation
    }

    /// Whether this point contributes.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the center; non-finite components become zero.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = finite_or_zero(position);
    }

    /// Set the displacement; non-finite components become zero.
    pub fn set_displacement(&mut self, displacement: Vec3) {
        self.displacement = finite_or_zero(displacement);
    }

    /// Set the radius, clamped to `[0.1, 5000]`.
    pub fn set_influence_radius(&mut self, radius: f32) {
        self.influence_radius = clamp_or(radius, MIN_RADIUS, MAX_RADIUS, self.influence_radius);
    }

    /// Set the strength, clamped to `[0, 10]`.
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = clamp_or(strength, MIN_STRENGTH, MAX_STRENGTH, self.strength);
    }

    /// Set the falloff function.
    pub fn set_attenuation(&mut self, attenuation: Attenuation) {
        self.attenuation = attenuation;
    }

    /// Enable or disable.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Distance past which this point has no effect.
    pub fn max_influence_distance(&self) -> f32 {
        self.attenuation.cutoff(self.influence_radius)
    }

    /// Weight at `distance`: falloff times strength, zero past the cutoff or
    /// when disabled.
    pub fn weight(&self, distance: f32) -> f32 {
        if !self.enabled || distance < 0.0 || distance > self.max_influence_distance() {
            return 0.0;
        }
        self.attenuation.evaluate(distance, self.influence_radius) * self.strength
    }

    /// Like [`weight`](Self::weight), but exactly `strength` at the center.
    pub fn influence_weight(&self, distance: f32) -> f32 {
        if distance < WEIGHT_EPSILON {
            return if self.enabled { self.strength } else { 0.0 };
        }
        self.weight(distance)
    }

    /// Weight at a point.
    pub fn weight_at(&self, p: &Vec3) -> f32 {
        self.weight((p - self.position).norm())
    }

    /// Weighted displacement at `p`.
    pub fn displacement_at(&self, p: &Vec3) -> Vec3 {
        self.displacement * self.weight_at(p)
    }

    /// `true` if `p` is measurably affected.
    pub fn is_point_in_influence(&self, p: &Vec3) -> bool {
        self.weight_at(p) > WEIGHT_EPSILON
    }

    /// Finite coordinates and parameters in range.
    pub fn is_valid(&self) -> bool {
        is_finite(&self.position)
            && is_finite(&self.displacement)
            && (MIN_RADIUS..=MAX_RADIUS).contains(&self.influence_radius)
            && (MIN_STRENGTH..=MAX_STRENGTH).contains(&self.strength)
    }

    /// Back to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
