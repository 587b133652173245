//! Renderer-side temporal smoothing of glasses transforms.
//!
//! The smoother blends the committed transform toward the latest target
//! every render frame. Blend factors are specified per update at a
//! reference rate and rescaled by the elapsed time, so the perceived
//! responsiveness does not depend on the render frame rate.

use crate::{
    filters::kalman::KalmanParams,
    geometry::{lerp, slerp, Vec3},
    transform::GlassesTransform,
    Error, Result,
};
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

/// Smoothing parameters for the renderer and the pose strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Position blend per reference update
    pub position: f64,
    /// Rotation slerp per reference update
    pub rotation: f64,
    /// Scale blend per reference update
    pub scale: f64,
    /// Rate (Hz) at which the blend factors above apply as-is
    pub reference_hz: f64,
    /// Euler smoothing of the basic strategy
    pub euler_factor: f64,
    /// Landmark filter of the kalman-filtered strategy
    pub landmark_filter: String,
    pub kalman: KalmanParams,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            position: 0.5,
            rotation: 0.5,
            scale: 0.5,
            reference_hz: 30.0,
            euler_factor: 0.5,
            landmark_filter: "kalman".to_string(),
            kalman: KalmanParams::default(),
        }
    }
}

impl SmoothingConfig {
    /// # Errors
    ///
    /// Returns an error if a factor is outside `[0, 1]` or the rate is not positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("position", self.position),
            ("rotation", self.rotation),
            ("scale", self.scale),
            ("euler_factor", self.euler_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!("Smoothing {name} must be in [0, 1], got {value}")));
            }
        }
        if self.reference_hz <= 0.0 {
            return Err(Error::ConfigError("Smoothing reference rate must be positive".to_string()));
        }
        if self.kalman.process_noise <= 0.0 || self.kalman.measurement_noise <= 0.0 {
            return Err(Error::ConfigError("Kalman noise parameters must be positive".to_string()));
        }
        Ok(())
    }
}

/// The renderer's committed transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingState {
    pub position: Vec3,
    pub quaternion: UnitQuaternion<f64>,
    pub scale: f64,
}

impl Default for SmoothingState {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            quaternion: UnitQuaternion::identity(),
            scale: 1.0,
        }
    }
}

/// Frame-rate independent lerp/slerp toward a target transform
#[derive(Debug, Clone, Copy)]
pub struct TransformSmoother {
    position: f64,
    rotation: f64,
    scale: f64,
    reference_hz: f64,
}

impl Default for TransformSmoother {
    fn default() -> Self {
        Self::new(&SmoothingConfig::default())
    }
}

impl TransformSmoother {
    #[must_use]
    pub fn new(config: &SmoothingConfig) -> Self {
        Self {
            position: config.position,
            rotation: config.rotation,
            scale: config.scale,
            reference_hz: config.reference_hz,
        }
    }

    /// Blend factor for `factor` per reference update after `dt` seconds
    #[must_use]
    pub fn rate_adjusted(&self, factor: f64, dt: f64) -> f64 {
        if dt <= 0.0 || !dt.is_finite() {
            return 0.0;
        }
        1.0 - (1.0 - factor.clamp(0.0, 1.0)).powf(dt * self.reference_hz)
    }

    /// Advance the committed transform toward `target` by `dt` seconds
    pub fn step(&self, state: &mut SmoothingState, target: &GlassesTransform, dt: f64) {
        let position = self.rate_adjusted(self.position, dt);
        let rotation = self.rate_adjusted(self.rotation, dt);
        let scale = self.rate_adjusted(self.scale, dt);

        state.position = state.position.lerp(&target.position, position);
        state.quaternion = slerp(&state.quaternion, &target.quaternion, rotation);
        state.scale = lerp(state.scale, target.scale, scale);
    }
}
