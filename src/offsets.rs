//! Positional corrections driven by head yaw, pitch and camera distance.
//!
//! Turning the head pushes the glasses forward along the face normal and
//! sideways along the head's right axis so they do not clip into the cheeks.
//! How strong those pushes are depends on the camera distance through a
//! small table of tuned anchors.

use crate::{
    constants::{LATERAL_EASE_EXPONENT, PITCH_EASE_EXPONENT},
    easing::{signum_or_zero, smoothstep},
    geometry::{lerp, Vec3},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Tuned offset intensities at one camera distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceOffsetAnchor {
    pub distance_m: f64,
    pub forward: f64,
    pub lateral: f64,
}

impl DistanceOffsetAnchor {
    #[must_use]
    pub const fn new(distance_m: f64, forward: f64, lateral: f64) -> Self {
        Self {
            distance_m,
            forward,
            lateral,
        }
    }
}

/// Interpolation between neighbouring anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorInterpolation {
    Linear,
    #[default]
    Smoothstep,
}

/// Forward and lateral offset intensities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceOffsets {
    pub forward: f64,
    pub lateral: f64,
}

/// Sorted table of distance anchors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DistanceOffsetAnchor>", into = "Vec<DistanceOffsetAnchor>")]
pub struct OffsetAnchorTable {
    anchors: Vec<DistanceOffsetAnchor>,
}

impl Default for OffsetAnchorTable {
    fn default() -> Self {
        Self {
            anchors: vec![
                DistanceOffsetAnchor::new(0.45, 0.035, 0.07),
                DistanceOffsetAnchor::new(0.55, 0.025, 0.055),
                DistanceOffsetAnchor::new(0.65, 0.022, 0.05),
                DistanceOffsetAnchor::new(0.75, 0.015, 0.038),
                DistanceOffsetAnchor::new(0.85, 0.008, 0.03),
                DistanceOffsetAnchor::new(1.1, 0.012, 0.03),
                DistanceOffsetAnchor::new(1.6, 0.012, 0.03),
            ],
        }
    }
}

impl TryFrom<Vec<DistanceOffsetAnchor>> for OffsetAnchorTable {
    type Error = Error;

    fn try_from(anchors: Vec<DistanceOffsetAnchor>) -> Result<Self> {
        Self::new(anchors)
    }
}

impl From<OffsetAnchorTable> for Vec<DistanceOffsetAnchor> {
    fn from(table: OffsetAnchorTable) -> Self {
        table.anchors
    }
}

impl OffsetAnchorTable {
    /// Sort anchors by distance.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty table or non-finite values.
    pub fn new(mut anchors: Vec<DistanceOffsetAnchor>) -> Result<Self> {
        if anchors.is_empty() {
            return Err(Error::ConfigError("Offset anchor table is empty".to_string()));
        }
        if anchors
            .iter()
            .any(|a| !(a.distance_m.is_finite() && a.forward.is_finite() && a.lateral.is_finite()))
        {
            return Err(Error::ConfigError("Offset anchors must be finite".to_string()));
        }
        anchors.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        Ok(Self { anchors })
    }

    #[must_use]
    pub fn anchors(&self) -> &[DistanceOffsetAnchor] {
        &self.anchors
    }

    /// Offsets at a distance.
    ///
    /// Clamps outside the table; an unknown distance uses the middle anchor.
    #[must_use]
    pub fn interpolate(&self, distance_m: Option<f64>, interpolation: AnchorInterpolation) -> DistanceOffsets {
        let anchors = &self.anchors;
        let at = |a: &DistanceOffsetAnchor| DistanceOffsets {
            forward: a.forward,
            lateral: a.lateral,
        };

        let Some(distance) = distance_m.filter(|d| d.is_finite()) else {
            return at(&anchors[anchors.len() / 2]);
        };

        let (first, last) = (&anchors[0], &anchors[anchors.len() - 1]);
        if distance <= first.distance_m {
            return at(first);
        }
        if distance >= last.distance_m {
            return at(last);
        }

        let Some(pair) = anchors.windows(2).find(|pair| distance <= pair[1].distance_m) else {
            return at(last);
        };
        let (a, b) = (&pair[0], &pair[1]);
        let mut t = (distance - a.distance_m) / (b.distance_m - a.distance_m);
        if interpolation == AnchorInterpolation::Smoothstep {
            t = smoothstep(t.clamp(0.0, 1.0));
        }

        DistanceOffsets {
            forward: lerp(a.forward, b.forward, t),
            lateral: lerp(a.lateral, b.lateral, t),
        }
    }
}

/// Offset model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetConfig {
    pub anchors: OffsetAnchorTable,
    pub interpolation: AnchorInterpolation,
    /// Yaw (radians) at which the yaw shifts saturate
    pub max_yaw: f64,
    /// Pitch (radians) at which the pitch shifts saturate
    pub max_pitch: f64,
    pub pitch_vertical_intensity: f64,
    /// Depth pull when looking down
    pub pitch_depth_intensity: f64,
    /// Scale the yaw shifts by the dynamic distance gain
    pub scale_with_gain: bool,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            anchors: OffsetAnchorTable::default(),
            interpolation: AnchorInterpolation::Smoothstep,
            max_yaw: 0.6,
            max_pitch: 0.5,
            pitch_vertical_intensity: 0.02,
            pitch_depth_intensity: 0.0,
            scale_with_gain: false,
        }
    }
}

impl OffsetConfig {
    /// # Errors
    ///
    /// Returns an error if a saturation angle is not positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_yaw > 0.0 && self.max_pitch > 0.0) {
            return Err(Error::ConfigError("Offset saturation angles must be positive".to_string()));
        }
        Ok(())
    }
}

/// Push along the face normal, growing linearly with |yaw|
#[must_use]
pub fn yaw_forward_shift(yaw: f64, forward: &Vec3, intensity: f64, max_yaw: f64) -> Vec3 {
    let strength = yaw.abs().min(max_yaw) / max_yaw;
    forward * (strength * intensity)
}

/// Signed push along the head's right axis, eased in with |s|^1.8
#[must_use]
pub fn yaw_lateral_shift(yaw: f64, right: &Vec3, intensity: f64, max_yaw: f64) -> Vec3 {
    let strength = yaw.clamp(-max_yaw, max_yaw) / max_yaw;
    let eased = signum_or_zero(strength) * strength.abs().powf(LATERAL_EASE_EXPONENT);
    right * (eased * intensity)
}

/// Vertical pitch offset, subtracted from the position's y
#[must_use]
pub fn pitch_vertical_offset(pitch: f64, intensity: f64, max_pitch: f64) -> f64 {
    let normalized = pitch.clamp(-max_pitch, max_pitch) / max_pitch;
    signum_or_zero(normalized) * normalized.abs().powf(PITCH_EASE_EXPONENT) * intensity
}

/// Depth pitch offset, subtracted from the position's z; zero unless pitch > 0
#[must_use]
pub fn pitch_depth_offset(pitch: f64, intensity: f64, max_pitch: f64) -> f64 {
    if pitch <= 0.0 {
        return 0.0;
    }
    (pitch.min(max_pitch) / max_pitch).powf(PITCH_EASE_EXPONENT) * intensity
}
