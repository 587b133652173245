//! Glasses transform assembly: the pipeline's per-tick output.

use crate::{
    distance::DistanceInfo,
    geometry::Vec3,
    offsets::{pitch_depth_offset, pitch_vertical_offset, yaw_forward_shift, yaw_lateral_shift, OffsetConfig},
    pose_estimation::PoseEstimate,
    Error, Result,
};
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

/// Rigid transform for the glasses model, immutable once produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlassesTransform {
    pub position: Vec3,
    pub scale: f64,
    pub quaternion: UnitQuaternion<f64>,
    pub distance_info: DistanceInfo,
}

/// Per-model fitting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Model scale per world unit of eye distance
    pub scale_multiplier: f64,
    /// World offset added to the eye midpoint
    pub offset: Vec3,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            scale_multiplier: 1.0,
            offset: Vec3::zeros(),
        }
    }
}

impl ModelParams {
    #[must_use]
    pub fn new(scale_multiplier: f64, offset: Vec3) -> Self {
        Self {
            scale_multiplier,
            offset,
        }
    }

    /// # Errors
    ///
    /// Returns an error for a non-positive multiplier or non-finite offset.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_multiplier.is_finite() && self.scale_multiplier > 0.0) {
            return Err(Error::ConfigError(format!(
                "Model scale multiplier must be positive, got {}",
                self.scale_multiplier
            )));
        }
        if !self.offset.iter().all(|c| c.is_finite()) {
            return Err(Error::ConfigError("Model offset must be finite".to_string()));
        }
        Ok(())
    }
}

/// Builds a [`GlassesTransform`] from a pose estimate and distance state
#[derive(Debug, Clone, Default)]
pub struct TransformAssembler {
    offsets: OffsetConfig,
}

impl TransformAssembler {
    #[must_use]
    pub fn new(offsets: OffsetConfig) -> Self {
        Self { offsets }
    }

    #[must_use]
    pub fn offsets(&self) -> &OffsetConfig {
        &self.offsets
    }

    #[must_use]
    pub fn assemble(&self, estimate: &PoseEstimate, distance_info: DistanceInfo, model: &ModelParams) -> GlassesTransform {
        let config = &self.offsets;
        let anchors = &estimate.anchors;
        let basis = &estimate.basis;

        let mut position = anchors.eye_midpoint() + model.offset;
        let scale = anchors.eye_distance() * model.scale_multiplier;

        // Yaw shifts use the raw heading, not the eased angle
        let yaw = basis.heading();
        let mut intensities = config.anchors.interpolate(distance_info.range_m, config.interpolation);
        if config.scale_with_gain {
            intensities.forward *= distance_info.ratio;
            intensities.lateral *= distance_info.ratio;
        }
        position += yaw_forward_shift(yaw, &basis.forward, intensities.forward, config.max_yaw);
        position += yaw_lateral_shift(yaw, &basis.right, intensities.lateral, config.max_yaw);

        let pitch = estimate.raw.pitch;
        position.y -= pitch_vertical_offset(pitch, config.pitch_vertical_intensity, config.max_pitch);
        position.z -= pitch_depth_offset(pitch, config.pitch_depth_intensity, config.max_pitch);

        log::trace!(
            "Assembled transform yaw={yaw:.3} pitch={pitch:.3} forward={:.4} lateral={:.4} scale={scale:.4}",
            intensities.forward,
            intensities.lateral
        );

        GlassesTransform {
            position,
            scale,
            quaternion: estimate.quaternion,
            distance_info,
        }
    }
}
