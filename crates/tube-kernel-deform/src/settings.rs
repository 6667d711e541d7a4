//! Engine tuning.

use serde::{Deserialize, Serialize};

use crate::error::{DeformError, Result};

/// Deformation engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Smooth section centers in translation mode.
    pub smoothing_enabled: bool,
    /// Blend toward the 3-point average, in `[0, 1]`.
    pub smoothing_factor: f32,
    /// Largest displacement applied to a section center in translation mode.
    pub max_magnitude: f32,
    /// Curves with fewer points than this are resampled before deforming.
    pub resample_threshold: usize,
    /// Points per original curve piece when resampling.
    pub samples_per_segment: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            smoothing_enabled: true,
            smoothing_factor: 0.5,
            max_magnitude: 10.0,
            resample_threshold: 10,
            samples_per_segment: 100,
        }
    }
}

impl EngineSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.smoothing_factor) {
            return Err(DeformError::InvalidSettings(
                "smoothing_factor must be between 0 and 1".into(),
            ));
        }
        if !(self.max_magnitude > 0.0) || !self.max_magnitude.is_finite() {
            return Err(DeformError::InvalidSettings(
                "max_magnitude must be positive".into(),
            ));
        }
        if self.samples_per_segment == 0 {
            return Err(DeformError::InvalidSettings(
                "samples_per_segment must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Set the smoothing factor, clamped to `[0, 1]`.
    pub fn set_smoothing_factor(&mut self, factor: f32) {
        self.smoothing_factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = EngineSettings {
            smoothing_factor: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = EngineSettings {
            max_magnitude: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_smoothing_factor_clamps() {
        let mut s = EngineSettings::default();
        s.set_smoothing_factor(3.0);
        assert_eq!(s.smoothing_factor, 1.0);
        s.set_smoothing_factor(-1.0);
        assert_eq!(s.smoothing_factor, 0.0);
    }
}
