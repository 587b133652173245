//! Constants used throughout the library

use std::f64::consts::FRAC_PI_2;

/// Face mesh landmark indices (MediaPipe 478-point schema)
pub mod landmarks {
    /// Left eye outer corner
    pub const LEFT_EYE_OUTER: usize = 33;
    /// Right eye outer corner
    pub const RIGHT_EYE_OUTER: usize = 263;
    /// Left eye inner corner
    pub const LEFT_EYE_INNER: usize = 133;
    /// Right eye inner corner
    pub const RIGHT_EYE_INNER: usize = 463;
    /// Left upper eyelid
    pub const LEFT_EYELID: usize = 224;
    /// Right upper eyelid
    pub const RIGHT_EYELID: usize = 444;
    /// Top-most forehead point
    pub const FOREHEAD_TOP: usize = 10;
    /// Chin
    pub const CHIN: usize = 175;
    /// Nose bridge between the eyes
    pub const NOSE_BRIDGE: usize = 168;
}

/// Number of points in a full face mesh with irises
pub const FACE_MESH_LANDMARKS: usize = 478;

/// Quarter turn; easing normalizes angles against it
pub const QUARTER_TURN: f64 = FRAC_PI_2;

/// `|m[1][2]|` at or above this value is treated as gimbal lock
pub const GIMBAL_LOCK_THRESHOLD: f64 = 0.99999;

/// Vectors shorter than this normalize to zero
pub const NORMALIZE_EPSILON: f64 = 1e-12;

/// Baselines and means at or below this value are treated as unset
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// Minimum pixel distance accepted by the pinhole inversion
pub const MIN_EYE_DISTANCE_PX: f64 = 1e-3;

/// Lower bound for `cos(yaw)` when undoing foreshortening
pub const MIN_YAW_COSINE: f64 = 0.3;

/// Average human interpupillary distance in meters
pub const DEFAULT_IPD_M: f64 = 0.063;

/// Assumed horizontal field of view of a webcam
pub const DEFAULT_HFOV_DEG: f64 = 65.0;

/// Range clamp for absolute distance estimates
pub const MIN_RANGE_M: f64 = 0.2;
pub const MAX_RANGE_M: f64 = 3.5;

/// Default target detection rate
pub const DEFAULT_TARGET_FPS: f64 = 30.0;

/// Exponent of the lateral yaw shift ease
pub const LATERAL_EASE_EXPONENT: f64 = 1.8;

/// Exponent of the pitch shift ease
pub const PITCH_EASE_EXPONENT: f64 = 1.5;
