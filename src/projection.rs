//! Landmark projection from normalized image space into world space.

use crate::{geometry::Vec3, landmark::Landmark};
use serde::{Deserialize, Serialize};

/// Per-axis scale from normalized coordinates to world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneScale {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for PlaneScale {
    fn default() -> Self {
        Self { x: 0.95, y: 1.0, z: 0.6 }
    }
}

/// Per-landmark depth exaggeration table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthBoost {
    /// Apply the boost when projecting pose anchors
    pub enabled: bool,
    /// Nose, lips and chin
    pub strong_indices: Vec<usize>,
    pub strong_factor: f64,
    /// Cheekbones
    pub moderate_indices: Vec<usize>,
    pub moderate_factor: f64,
    /// Everything else
    pub default_factor: f64,
}

impl Default for DepthBoost {
    fn default() -> Self {
        Self {
            enabled: false,
            strong_indices: vec![
                1, 2, 4, 5, 6, 9, 10, 11, // nose bridge and tip
                13, 14, 17, 18, 84, 91, 185, // lips
                152, 377, 378, 379, 400, // chin
            ],
            strong_factor: 4.0,
            moderate_indices: vec![50, 280, 115, 345],
            moderate_factor: 2.5,
            default_factor: 1.5,
        }
    }
}

impl DepthBoost {
    /// Multiplier applied to the depth of a landmark index
    #[must_use]
    pub fn factor(&self, index: usize) -> f64 {
        if self.strong_indices.contains(&index) {
            self.strong_factor
        } else if self.moderate_indices.contains(&index) {
            self.moderate_factor
        } else {
            self.default_factor
        }
    }

    /// Boosted depth; NaN collapses to zero
    #[must_use]
    pub fn apply(&self, z: f64, index: usize) -> f64 {
        if z.is_nan() {
            0.0
        } else {
            z * self.factor(index)
        }
    }
}

/// Projection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub scale: PlaneScale,
    /// World depth of the video plane
    pub plane_z: f64,
    pub depth_boost: DepthBoost,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            scale: PlaneScale::default(),
            plane_z: 0.0,
            depth_boost: DepthBoost::default(),
        }
    }
}

/// Maps landmarks to world points with a fixed affine transform
#[derive(Debug, Clone)]
pub struct Projector {
    scale: PlaneScale,
    plane_z: f64,
    boost: DepthBoost,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(&ProjectionConfig::default())
    }
}

impl Projector {
    #[must_use]
    pub fn new(config: &ProjectionConfig) -> Self {
        Self {
            scale: config.scale,
            plane_z: config.plane_z,
            boost: config.depth_boost.clone(),
        }
    }

    /// Project a landmark; a missing depth sits on the video plane
    #[must_use]
    pub fn project(&self, landmark: &Landmark) -> Vec3 {
        Vec3::new(
            (landmark.x - 0.5) * self.scale.x,
            (0.5 - landmark.y) * self.scale.y,
            landmark.z.map_or(self.plane_z, |z| (-z).mul_add(self.scale.z, self.plane_z)),
        )
    }

    /// Project with the per-index depth boost, regardless of the enabled flag
    #[must_use]
    pub fn project_boosted(&self, landmark: &Landmark, index: usize) -> Vec3 {
        Vec3::new(
            (landmark.x - 0.5) * self.scale.x,
            (0.5 - landmark.y) * self.scale.y,
            landmark
                .z
                .map_or(self.plane_z, |z| (-self.boost.apply(z, index)).mul_add(self.scale.z, self.plane_z)),
        )
    }

    /// Project an anchor landmark, boosting depth only when configured to
    #[must_use]
    pub fn project_anchor(&self, landmark: &Landmark, index: usize) -> Vec3 {
        if self.boost.enabled {
            self.project_boosted(landmark, index)
        } else {
            self.project(landmark)
        }
    }

    /// Inverse of [`Projector::project`]
    #[must_use]
    pub fn unproject(&self, point: &Vec3) -> Landmark {
        let z = if self.scale.z.abs() > f64::EPSILON {
            Some(-(point.z - self.plane_z) / self.scale.z)
        } else {
            None
        };
        Landmark {
            x: point.x / self.scale.x + 0.5,
            y: 0.5 - point.y / self.scale.y,
            z,
        }
    }
}
