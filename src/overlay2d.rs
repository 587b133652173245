//! Placement of flat (PNG) glasses in pixel space.

use crate::{constants::landmarks, distance::FrameSize, landmark::Face};
use serde::{Deserialize, Serialize};

/// 2D overlay parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overlay2dConfig {
    /// Glasses width per pixel of outer eye-corner distance
    pub width_multiplier: f64,
    pub left_eye: usize,
    pub right_eye: usize,
    /// Must be present for a placement to be produced
    pub nose: usize,
}

impl Default for Overlay2dConfig {
    fn default() -> Self {
        Self {
            width_multiplier: 2.0,
            left_eye: landmarks::LEFT_EYE_OUTER,
            right_eye: landmarks::RIGHT_EYE_OUTER,
            nose: landmarks::NOSE_BRIDGE,
        }
    }
}

/// Where to draw the glasses image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacement {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation of the eye line in radians
    pub angle: f64,
}

/// Place a glasses image of `image_width` x `image_height` over the eyes
#[must_use]
pub fn place_glasses(
    face: &Face,
    frame: FrameSize,
    image_width: u32,
    image_height: u32,
    config: &Overlay2dConfig,
) -> Option<OverlayPlacement> {
    if !frame.is_valid() || image_width == 0 {
        return None;
    }
    let left = face.get(config.left_eye)?;
    let right = face.get(config.right_eye)?;
    face.get(config.nose)?;

    let (w, h) = (f64::from(frame.width), f64::from(frame.height));
    let dx = (right.x - left.x) * w;
    let dy = (right.y - left.y) * h;

    let width = dx.hypot(dy) * config.width_multiplier;
    Some(OverlayPlacement {
        center_x: (left.x + right.x) / 2.0 * w,
        center_y: (left.y + right.y) / 2.0 * h,
        width,
        height: width * f64::from(image_height) / f64::from(image_width),
        angle: dy.atan2(dx),
    })
}
