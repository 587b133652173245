//! Configuration management for the glasses tracker

use crate::{
    distance::{DistanceConfig, DistanceModel},
    offsets::OffsetConfig,
    overlay2d::Overlay2dConfig,
    pipeline::{DetectionGate, TrackingSession},
    pose_estimation::{AnchorIndices, RotationEasing},
    projection::{ProjectionConfig, Projector},
    smoothing::{SmoothingConfig, TransformSmoother},
    strategies::{create_strategy, PoseStrategy, StrategyKind},
    transform::{ModelParams, TransformAssembler},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landmark to world projection
    pub projection: ProjectionConfig,

    /// Landmark indices of the pose and range anchors
    pub anchors: AnchorIndices,

    /// Per-axis rotation easing
    pub rotation: RotationEasing,

    /// Glasses model fitting
    pub model: ModelParams,

    /// Distance estimation
    pub distance: DistanceConfig,

    /// Yaw, pitch and distance driven position offsets
    pub offsets: OffsetConfig,

    /// Temporal smoothing
    pub smoothing: SmoothingConfig,

    /// Strategy selection and detection cadence
    pub tracking: TrackingConfig,

    /// Flat PNG overlay placement
    pub overlay2d: Overlay2dConfig,
}

/// Tracking loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Pose strategy
    pub strategy: StrategyKind,

    /// Target detection rate
    pub target_fps: f64,

    /// Run detection on a worker thread
    pub threaded: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            target_fps: crate::constants::DEFAULT_TARGET_FPS,
            threaded: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the configured pose strategy
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot be built.
    pub fn create_strategy(&self) -> Result<Box<dyn PoseStrategy>> {
        create_strategy(self.tracking.strategy, &self.rotation, &self.smoothing)
    }

    #[must_use]
    pub fn projector(&self) -> Projector {
        Projector::new(&self.projection)
    }

    #[must_use]
    pub fn smoother(&self) -> TransformSmoother {
        TransformSmoother::new(&self.smoothing)
    }

    #[must_use]
    pub fn detection_gate(&self) -> DetectionGate {
        DetectionGate::new(self.tracking.target_fps)
    }

    /// Build a tracking session from this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build_session(&self) -> Result<TrackingSession> {
        self.validate()?;
        TrackingSession::new(
            self.projector(),
            self.anchors.clone(),
            self.create_strategy()?,
            DistanceModel::new(self.distance)?,
            TransformAssembler::new(self.offsets.clone()),
            self.model,
        )
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        // Validate projection
        let scale = &self.projection.scale;
        if !(scale.x.is_finite() && scale.y.is_finite() && scale.z.is_finite()) || scale.x == 0.0 || scale.y == 0.0 {
            return Err(Error::ConfigError(
                "Projection scale must be finite with non-zero x and y".to_string(),
            ));
        }
        if !self.projection.plane_z.is_finite() {
            return Err(Error::ConfigError("Projection plane depth must be finite".to_string()));
        }

        // Validate rotation multipliers
        for (axis, settings) in [
            ("pitch", &self.rotation.pitch),
            ("yaw", &self.rotation.yaw),
            ("roll", &self.rotation.roll),
        ] {
            if !settings.multiplier.is_finite() {
                return Err(Error::ConfigError(format!("Rotation {axis} multiplier must be finite")));
            }
        }

        self.model.validate()?;
        self.distance.validate()?;
        self.offsets.validate()?;
        self.smoothing.validate()?;

        // Validate tracking settings
        if !(self.tracking.target_fps.is_finite() && self.tracking.target_fps > 0.0) {
            return Err(Error::ConfigError("Target FPS must be greater than 0".to_string()));
        }
        if self.overlay2d.width_multiplier <= 0.0 {
            return Err(Error::ConfigError(
                "2D overlay width multiplier must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Glasses Tracker Configuration

# Normalized landmark -> world projection
projection:
  scale: { x: 0.95, y: 1.0, z: 0.6 }
  plane_z: 0.0
  depth_boost:
    enabled: false
    strong_indices: [1, 2, 4, 5, 6, 9, 10, 11, 13, 14, 17, 18, 84, 91, 185, 152, 377, 378, 379, 400]
    strong_factor: 4.0
    moderate_indices: [50, 280, 115, 345]
    moderate_factor: 2.5
    default_factor: 1.5

# Face mesh landmark indices
anchors:
  left_eye: 224
  right_eye: 444
  top: 10
  chin: 175
  range_left: 133
  range_right: 463

# Per-axis easing: angle / 90deg -> curve -> * 90deg * multiplier
rotation:
  pitch:
    multiplier: 1.0
    ease: { kind: points, points: [] }
  yaw:
    multiplier: 1.0
    ease:
      kind: points
      points:
        - { t: 0.0, v: 0.0 }
        - { t: 0.05, v: 0.08 }
        - { t: 0.15, v: 0.2 }
        - { t: 0.35, v: 0.43 }
        - { t: 1.0, v: 1.0 }
  roll:
    multiplier: 1.0
    ease: { kind: linear }

# Glasses model fitting
model:
  scale_multiplier: 1.0
  offset: [0.0, 0.0, 0.0]

# Distance estimation
distance:
  ewma_alpha: 0.02
  gain_min: 0.7
  gain_max: 1.5
  gain_max_step: 0.05
  yaw_baseline_max: 0.35
  hfov_deg: 65.0
  ipd_m: 0.063
  min_range_m: 0.2
  max_range_m: 3.5
  calibration:
    min_frames: 25
    yaw_max: 0.25
    rel_std_max: 0.06

# Position offsets
offsets:
  anchors:
    - { distance_m: 0.45, forward: 0.035, lateral: 0.07 }
    - { distance_m: 0.55, forward: 0.025, lateral: 0.055 }
    - { distance_m: 0.65, forward: 0.022, lateral: 0.05 }
    - { distance_m: 0.75, forward: 0.015, lateral: 0.038 }
    - { distance_m: 0.85, forward: 0.008, lateral: 0.03 }
    - { distance_m: 1.1, forward: 0.012, lateral: 0.03 }
    - { distance_m: 1.6, forward: 0.012, lateral: 0.03 }
  interpolation: smoothstep
  max_yaw: 0.6
  max_pitch: 0.5
  pitch_vertical_intensity: 0.02
  pitch_depth_intensity: 0.0
  scale_with_gain: false

# Temporal smoothing
smoothing:
  position: 0.5
  rotation: 0.5
  scale: 0.5
  reference_hz: 30.0
  euler_factor: 0.5
  landmark_filter: "kalman"
  kalman:
    process_noise: 0.01
    measurement_noise: 0.0005

# Tracking loop
tracking:
  strategy: eased-quaternion
  target_fps: 30.0
  threaded: false

# Flat PNG overlay
overlay2d:
  width_multiplier: 2.0
  left_eye: 33
  right_eye: 263
  nose: 168
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("tracking:\n  strategy: kalman-filtered\n").unwrap();
        assert_eq!(config.tracking.strategy, StrategyKind::KalmanFiltered);
        assert_eq!(config.distance, DistanceConfig::default());
        assert_eq!(config.create_strategy().unwrap().name(), "kalman-filtered");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.tracking.target_fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.projection.scale.x = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rotation.yaw.multiplier = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_session() {
        let session = Config::default().build_session().unwrap();
        assert_eq!(session.strategy_name(), "eased-quaternion");
        assert!(session.last_transform().is_none());
    }
}
