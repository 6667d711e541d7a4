//! Tuning knobs for the lateral connection algorithm.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentError};

/// Connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectSettings {
    /// Maximum shrink iterations while the two boundaries overlap.
    pub max_iterations: u32,
    /// Per-iteration shrink factor for the first section.
    pub scale_factor: f32,
    /// Give up once the cumulative scale drops below this.
    pub min_scale: f32,
    /// Polar angles closer than this (radians) are treated as one.
    pub angle_tolerance: f32,
    /// Distance under which two edge endpoints coincide.
    pub point_tolerance: f32,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            scale_factor: 0.95,
            min_scale: 0.1,
            angle_tolerance: 1e-3,
            point_tolerance: 1e-3,
        }
    }
}

impl ConnectSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SegmentError::InvalidSettings(
                "max_iterations must be at least 1".into(),
            ));
        }
        if !(self.scale_factor > 0.0 && self.scale_factor < 1.0) {
            return Err(SegmentError::InvalidSettings(
                "scale_factor must be between 0 and 1".into(),
            ));
        }
        if !(self.min_scale > 0.0 && self.min_scale < 1.0) {
            return Err(SegmentError::InvalidSettings(
                "min_scale must be between 0 and 1".into(),
            ));
        }
        if !(self.angle_tolerance > 0.0) || !(self.point_tolerance > 0.0) {
            return Err(SegmentError::InvalidSettings(
                "tolerances must be positive".into(),
            ));
        }
        Ok(())
    }
}
