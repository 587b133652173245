//! Camera distance estimation.
//!
//! Three signals are tracked side by side:
//! - an absolute range in meters from the pixel inter-ocular distance and a
//!   pinhole camera model,
//! - a dynamic gain: the world eye span relative to a slowly adapting,
//!   yaw-gated EWMA baseline, clamped and rate limited,
//! - a static ratio against a one-time calibration that locks once enough
//!   steady, frontal samples have been seen.

use crate::{
    constants::{
        DEFAULT_HFOV_DEG, DEFAULT_IPD_M, DISTANCE_EPSILON, MAX_RANGE_M, MIN_EYE_DISTANCE_PX, MIN_RANGE_M,
        MIN_YAW_COSINE,
    },
    filters::exponential::ExponentialFilter,
    geometry::Vec3,
    landmark::Landmark,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A frame with zero width or height carries no size information
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Static calibration gates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Samples required before the calibration may lock
    pub min_frames: usize,
    /// Only frames with |yaw| at or below this are sampled (radians)
    pub yaw_max: f64,
    /// Lock when std / mean drops below this
    pub rel_std_max: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_frames: 25,
            yaw_max: 0.25,
            rel_std_max: 0.06,
        }
    }
}

/// Distance model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// EWMA weight of the dynamic baseline
    pub ewma_alpha: f64,
    pub gain_min: f64,
    pub gain_max: f64,
    /// Largest gain change per tick
    pub gain_max_step: f64,
    /// Yaw (radians) at which the baseline stops adapting
    pub yaw_baseline_max: f64,
    /// Horizontal camera field of view in degrees
    pub hfov_deg: f64,
    /// Assumed inter-pupillary distance in meters
    pub ipd_m: f64,
    pub min_range_m: f64,
    pub max_range_m: f64,
    pub calibration: CalibrationConfig,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            ewma_alpha: 0.02,
            gain_min: 0.7,
            gain_max: 1.5,
            gain_max_step: 0.05,
            yaw_baseline_max: 0.35,
            hfov_deg: DEFAULT_HFOV_DEG,
            ipd_m: DEFAULT_IPD_M,
            min_range_m: MIN_RANGE_M,
            max_range_m: MAX_RANGE_M,
            calibration: CalibrationConfig::default(),
        }
    }
}

impl DistanceConfig {
    /// # Errors
    ///
    /// Returns an error if any parameter is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(self.ewma_alpha > 0.0 && self.ewma_alpha <= 1.0) {
            return Err(Error::ConfigError(format!("EWMA alpha must be in (0, 1], got {}", self.ewma_alpha)));
        }
        if !(self.gain_min > 0.0 && self.gain_min <= self.gain_max) {
            return Err(Error::ConfigError(format!(
                "Gain bounds must satisfy 0 < min <= max, got [{}, {}]",
                self.gain_min, self.gain_max
            )));
        }
        if self.gain_max_step.is_nan() || self.gain_max_step <= 0.0 {
            return Err(Error::ConfigError(format!("Gain max step must be positive, got {}", self.gain_max_step)));
        }
        if self.yaw_baseline_max.is_nan() || self.yaw_baseline_max <= 0.0 {
            return Err(Error::ConfigError(format!(
                "Baseline yaw limit must be positive, got {}",
                self.yaw_baseline_max
            )));
        }
        if !(self.hfov_deg > 0.0 && self.hfov_deg < 180.0) {
            return Err(Error::ConfigError(format!("HFOV must be in (0, 180), got {}", self.hfov_deg)));
        }
        if !(self.ipd_m > 0.0 && self.ipd_m.is_finite()) {
            return Err(Error::ConfigError(format!("IPD must be positive, got {}", self.ipd_m)));
        }
        if !(self.min_range_m > 0.0 && self.min_range_m <= self.max_range_m) {
            return Err(Error::ConfigError("Range bounds must satisfy 0 < min <= max".to_string()));
        }
        if self.calibration.min_frames < 2 {
            return Err(Error::ConfigError("Calibration needs at least 2 frames".to_string()));
        }
        if !(self.calibration.yaw_max > 0.0 && self.calibration.rel_std_max > 0.0) {
            return Err(Error::ConfigError("Calibration yaw and spread limits must be positive".to_string()));
        }
        Ok(())
    }
}

/// Absolute camera distance from the pixel distance between two eye points.
///
/// The pixel distance is corrected for yaw foreshortening, then inverted
/// through a pinhole model. Returns `None` without a usable frame size.
#[must_use]
pub fn estimate_range(
    left: &Landmark,
    right: &Landmark,
    frame: Option<FrameSize>,
    yaw: f64,
    config: &DistanceConfig,
) -> Option<f64> {
    let frame = frame.filter(FrameSize::is_valid)?;
    let (width, height) = (f64::from(frame.width), f64::from(frame.height));

    let dx_px = (right.x - left.x) * width;
    let dy_px = (right.y - left.y) * height;
    let cos_yaw = yaw.cos().max(MIN_YAW_COSINE);
    let eye_px = dx_px.hypot(dy_px) / cos_yaw;

    let focal_px = 0.5 * width / (config.hfov_deg.to_radians() / 2.0).tan();
    let range = focal_px * config.ipd_m / eye_px.max(MIN_EYE_DISTANCE_PX);
    range.is_finite().then(|| range.clamp(config.min_range_m, config.max_range_m))
}

/// World eye span measured along the head's right axis
#[must_use]
pub fn projected_eye_span(left_eye: &Vec3, right_eye: &Vec3, right_axis: &Vec3) -> f64 {
    (right_eye - left_eye).dot(right_axis).abs()
}

/// Running mean and variance (Welford's algorithm)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStatistics {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStatistics {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance, zero with fewer than two samples
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).max(0.0)
        }
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard deviation relative to the mean; 1 when the mean is ~0
    #[must_use]
    pub fn relative_std(&self) -> f64 {
        if self.mean > DISTANCE_EPSILON {
            self.std_dev() / self.mean
        } else {
            1.0
        }
    }
}

/// One-time calibration of the frontal eye span
#[derive(Debug, Clone)]
pub struct StaticCalibration {
    config: CalibrationConfig,
    stats: RunningStatistics,
    locked: bool,
}

impl StaticCalibration {
    #[must_use]
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            stats: RunningStatistics::default(),
            locked: false,
        }
    }

    /// Feed one sample; no-op once locked or when the head is turned
    pub fn update(&mut self, value: f64, yaw_abs: f64) {
        if self.locked || yaw_abs > self.config.yaw_max {
            return;
        }
        self.stats.push(value);
        if self.stats.count() >= self.config.min_frames && self.stats.relative_std() < self.config.rel_std_max {
            self.locked = true;
            log::info!(
                "Distance calibration locked after {} samples (mean {:.4})",
                self.stats.count(),
                self.stats.mean()
            );
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn statistics(&self) -> &RunningStatistics {
        &self.stats
    }

    /// `value / mean` once locked
    #[must_use]
    pub fn ratio(&self, value: f64) -> Option<f64> {
        (self.locked && self.stats.mean() > DISTANCE_EPSILON).then(|| value / self.stats.mean())
    }
}

/// Yaw-gated EWMA of the eye span
pub struct BaselineTracker {
    filter: ExponentialFilter,
    yaw_max: f64,
}

impl BaselineTracker {
    /// # Errors
    ///
    /// Returns an error if `alpha` is outside `(0, 1]`.
    pub fn new(alpha: f64, yaw_max: f64) -> Result<Self> {
        Ok(Self {
            filter: ExponentialFilter::new(alpha)?,
            yaw_max,
        })
    }

    /// Feed one sample; adaptation fades out linearly as |yaw| grows
    pub fn update(&mut self, value: f64, yaw_abs: f64) -> f64 {
        let yaw_weight = (1.0 - yaw_abs / self.yaw_max).max(0.0);
        self.filter.apply_weighted(value, yaw_weight)
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.filter.value()
    }
}

/// Clamp-then-rate-limit stage for the dynamic distance gain
#[derive(Debug, Clone, Copy)]
pub struct GainLimiter {
    min: f64,
    max: f64,
    max_step: f64,
    last: f64,
}

impl GainLimiter {
    #[must_use]
    pub fn new(min: f64, max: f64, max_step: f64) -> Self {
        Self {
            min,
            max,
            max_step,
            last: 1.0,
        }
    }

    pub fn step(&mut self, raw_gain: f64) -> f64 {
        let target = if raw_gain.is_finite() { raw_gain.clamp(self.min, self.max) } else { self.last };
        let delta = (target - self.last).clamp(-self.max_step, self.max_step);
        self.last += delta;
        self.last
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.last
    }
}

/// Coarse distance label for UI feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceCategory {
    VeryClose,
    Close,
    Medium,
    Far,
    VeryFar,
}

impl DistanceCategory {
    /// Categorize an absolute range in meters
    #[must_use]
    pub fn from_range(range_m: f64) -> Self {
        if !range_m.is_finite() {
            Self::Medium
        } else if range_m < 0.45 {
            Self::VeryClose
        } else if range_m < 0.7 {
            Self::Close
        } else if range_m < 0.85 {
            Self::Medium
        } else if range_m < 1.1 {
            Self::Far
        } else {
            Self::VeryFar
        }
    }

    /// Categorize a ratio against the calibrated eye span
    #[must_use]
    pub fn from_static_ratio(ratio: f64) -> Self {
        if ratio > 1.4 {
            Self::VeryClose
        } else if ratio > 1.2 {
            Self::Close
        } else if ratio > 0.9 {
            Self::Medium
        } else if ratio > 0.7 {
            Self::Far
        } else {
            Self::VeryFar
        }
    }
}

impl fmt::Display for DistanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::VeryClose => "Very Close",
            Self::Close => "Close",
            Self::Medium => "Medium",
            Self::Far => "Far",
            Self::VeryFar => "Very Far",
        };
        f.write_str(label)
    }
}

/// Per-tick distance diagnostics carried with each transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceInfo {
    /// Rate-limited dynamic gain
    pub ratio: f64,
    /// Ratio against the locked calibration, or the dynamic gain before it locks
    pub static_ratio: f64,
    /// World eye span along the head's right axis
    pub raw: f64,
    pub baseline: f64,
    pub yaw_abs: f64,
    /// Absolute range in meters, when the frame size is known
    pub range_m: Option<f64>,
    pub category: DistanceCategory,
}

/// Stateful distance model for one tracking session
pub struct DistanceModel {
    config: DistanceConfig,
    baseline: BaselineTracker,
    gain: GainLimiter,
    calibration: StaticCalibration,
}

impl DistanceModel {
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: DistanceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            baseline: BaselineTracker::new(config.ewma_alpha, config.yaw_baseline_max)?,
            gain: GainLimiter::new(config.gain_min, config.gain_max, config.gain_max_step),
            calibration: StaticCalibration::new(config.calibration),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &DistanceConfig {
        &self.config
    }

    #[must_use]
    pub fn calibration(&self) -> &StaticCalibration {
        &self.calibration
    }

    /// Update the model with one frame.
    ///
    /// `raw` is the world eye span along the head's right axis; `range_eyes`
    /// are the normalized landmarks used for the pixel range estimate.
    pub fn compute_distance(
        &mut self,
        raw: f64,
        range_eyes: Option<(&Landmark, &Landmark)>,
        frame: Option<FrameSize>,
        yaw: f64,
    ) -> DistanceInfo {
        let yaw_abs = yaw.abs();

        self.calibration.update(raw, yaw_abs);
        let baseline = self.baseline.update(raw, yaw_abs);

        let raw_gain = if baseline > DISTANCE_EPSILON { raw / baseline } else { 1.0 };
        let ratio = self.gain.step(raw_gain);
        let static_ratio = self.calibration.ratio(raw).unwrap_or(ratio);

        let range_m = range_eyes.and_then(|(left, right)| estimate_range(left, right, frame, yaw, &self.config));
        let category = range_m.map_or_else(
            || DistanceCategory::from_static_ratio(static_ratio),
            DistanceCategory::from_range,
        );

        log::debug!(
            "Distance raw={raw:.4} baseline={baseline:.4} gain={ratio:.3} static={static_ratio:.3} range={range_m:?}"
        );

        DistanceInfo {
            ratio,
            static_ratio,
            raw,
            baseline,
            yaw_abs,
            range_m,
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welford_matches_batch_statistics() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut stats = RunningStatistics::default();
        for value in data {
            stats.push(value);
        }
        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-12);
        // Sample variance: 10 / 4
        assert!((stats.variance() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_relative_std_with_zero_mean() {
        let mut stats = RunningStatistics::default();
        stats.push(0.0);
        stats.push(0.0);
        assert_eq!(stats.relative_std(), 1.0);
    }

    #[test]
    fn test_calibration_locks_on_steady_frontal_samples() {
        let mut calibration = StaticCalibration::new(CalibrationConfig::default());
        for i in 0..24 {
            calibration.update(0.06 + if i % 2 == 0 { 0.0005 } else { -0.0005 }, 0.0);
            assert!(!calibration.is_ready());
        }
        calibration.update(0.06, 0.1);
        assert!(calibration.is_ready());

        // Locked: further samples are ignored
        let mean = calibration.statistics().mean();
        calibration.update(1.0, 0.0);
        assert_eq!(calibration.statistics().mean(), mean);
        assert!((calibration.ratio(0.12).unwrap() - 0.12 / mean).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_ignores_turned_head() {
        let mut calibration = StaticCalibration::new(CalibrationConfig::default());
        for _ in 0..40 {
            calibration.update(0.06, 0.3);
        }
        assert_eq!(calibration.statistics().count(), 0);
        assert!(calibration.ratio(0.06).is_none());
    }

    #[test]
    fn test_calibration_never_locks_on_noisy_samples() {
        let mut calibration = StaticCalibration::new(CalibrationConfig::default());
        for i in 0..100 {
            calibration.update(if i % 2 == 0 { 0.04 } else { 0.08 }, 0.0);
        }
        assert!(!calibration.is_ready());
    }

    #[test]
    fn test_gain_rate_limit() {
        let mut limiter = GainLimiter::new(0.7, 1.5, 0.05);
        let mut previous = limiter.value();
        for _ in 0..10 {
            let gain = limiter.step(1.5);
            assert!(gain - previous <= 0.05 + 1e-12);
            previous = gain;
        }
        assert!((previous - 1.5).abs() < 1e-9);
        assert!((limiter.step(3.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_gain_ignores_non_finite() {
        let mut limiter = GainLimiter::new(0.7, 1.5, 0.05);
        assert_eq!(limiter.step(f64::NAN), 1.0);
    }

    #[test]
    fn test_baseline_seeded_then_yaw_gated() {
        let mut baseline = BaselineTracker::new(0.02, 0.35).unwrap();
        assert_eq!(baseline.update(0.06, 0.5), 0.06);
        // Beyond the yaw limit the baseline holds
        assert_eq!(baseline.update(0.09, 0.4), 0.06);
        let moved = baseline.update(0.09, 0.0);
        assert!((moved - 0.0606).abs() < 1e-12);
    }

    #[test]
    fn test_range_estimate() {
        let config = DistanceConfig::default();
        let frame = Some(FrameSize::new(640, 480));
        let left = Landmark::flat(0.45, 0.5);
        let right = Landmark::flat(0.55, 0.5);

        let focal = 320.0 / (65.0_f64.to_radians() / 2.0).tan();
        let expected = focal * 0.063 / 64.0;
        let range = estimate_range(&left, &right, frame, 0.0, &config).unwrap();
        assert!((range - expected).abs() < 1e-9);

        // Yaw foreshortening is undone
        let turned = estimate_range(&left, &right, frame, 0.5, &config).unwrap();
        assert!((turned - expected * 0.5_f64.cos()).abs() < 1e-9);
    }

    #[test]
    fn test_range_clamped_and_missing_frame() {
        let config = DistanceConfig::default();
        let same = Landmark::flat(0.5, 0.5);
        assert_eq!(
            estimate_range(&same, &same, Some(FrameSize::new(640, 480)), 0.0, &config),
            Some(MAX_RANGE_M)
        );
        assert!(estimate_range(&same, &same, None, 0.0, &config).is_none());
        assert!(estimate_range(&same, &same, Some(FrameSize::new(0, 480)), 0.0, &config).is_none());
    }

    #[test]
    fn test_categories() {
        assert_eq!(DistanceCategory::from_range(0.3), DistanceCategory::VeryClose);
        assert_eq!(DistanceCategory::from_range(0.6), DistanceCategory::Close);
        assert_eq!(DistanceCategory::from_range(0.8), DistanceCategory::Medium);
        assert_eq!(DistanceCategory::from_range(1.0), DistanceCategory::Far);
        assert_eq!(DistanceCategory::from_range(2.0), DistanceCategory::VeryFar);
        assert_eq!(DistanceCategory::from_static_ratio(1.5), DistanceCategory::VeryClose);
        assert_eq!(DistanceCategory::from_static_ratio(1.0), DistanceCategory::Medium);
        assert_eq!(DistanceCategory::from_static_ratio(0.5), DistanceCategory::VeryFar);
        assert_eq!(DistanceCategory::VeryFar.to_string(), "Very Far");
    }

    #[test]
    fn test_static_ratio_falls_back_to_gain() {
        let mut model = DistanceModel::new(DistanceConfig::default()).unwrap();
        let info = model.compute_distance(0.06, None, None, 0.0);
        assert_eq!(info.ratio, 1.0);
        assert_eq!(info.static_ratio, info.ratio);
        assert_eq!(info.baseline, 0.06);
        assert!(info.range_m.is_none());
        assert_eq!(info.category, DistanceCategory::Medium);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DistanceConfig {
            gain_min: 2.0,
            ..DistanceConfig::default()
        };
        assert!(DistanceModel::new(config).is_err());
    }

    #[test]
    fn test_nan_limits_rejected() {
        for config in [
            DistanceConfig {
                gain_max_step: f64::NAN,
                ..DistanceConfig::default()
            },
            DistanceConfig {
                yaw_baseline_max: f64::NAN,
                ..DistanceConfig::default()
            },
            DistanceConfig {
                ipd_m: f64::NAN,
                ..DistanceConfig::default()
            },
        ] {
            assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
            assert!(DistanceModel::new(config).is_err());
        }

        let mut config = DistanceConfig::default();
        config.calibration.rel_std_max = f64::NAN;
        assert!(config.validate().is_err());
    }
}
