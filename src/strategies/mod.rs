//! Interchangeable head pose strategies.
//!
//! Every strategy turns the four anchor landmarks of a face into a
//! [`PoseEstimate`]; they differ in how the rotation is shaped and smoothed.

/// Three.js-style Euler decomposition with amplification and Euler smoothing
pub mod basic;

/// Per-axis eased quaternion
pub mod eased;

/// Kalman-filtered anchors feeding the eased estimator
pub mod kalman;

use crate::{
    pose_estimation::{AnchorLandmarks, PoseEstimate, RotationEasing},
    projection::Projector,
    smoothing::SmoothingConfig,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Trait for all pose strategies
pub trait PoseStrategy: Send {
    /// Estimate the head pose for one frame; `None` when the anchors are unusable
    fn estimate(&mut self, landmarks: &AnchorLandmarks, projector: &Projector) -> Option<PoseEstimate>;

    /// Reset strategy state
    fn reset(&mut self);

    /// Get strategy name
    fn name(&self) -> &str;
}

/// Strategy selector used by configuration and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    BasicEuler,
    #[default]
    EasedQuaternion,
    KalmanFiltered,
}

impl StrategyKind {
    pub const ALL: [Self; 3] = [Self::BasicEuler, Self::EasedQuaternion, Self::KalmanFiltered];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicEuler => "basic-euler",
            Self::EasedQuaternion => "eased-quaternion",
            Self::KalmanFiltered => "kalman-filtered",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "basic" | "basic-euler" => Ok(Self::BasicEuler),
            "eased" | "eased-quaternion" | "advanced" => Ok(Self::EasedQuaternion),
            "kalman" | "kalman-filtered" => Ok(Self::KalmanFiltered),
            _ => Err(Error::StrategyError(format!("Unknown pose strategy: {s}"))),
        }
    }
}

/// Create a pose strategy
///
/// # Errors
///
/// Returns an error if the strategy's landmark filter is unknown.
pub fn create_strategy(
    kind: StrategyKind,
    easing: &RotationEasing,
    smoothing: &SmoothingConfig,
) -> Result<Box<dyn PoseStrategy>> {
    log::info!("Using pose strategy: {kind}");
    match kind {
        StrategyKind::BasicEuler => Ok(Box::new(basic::BasicEulerStrategy::new(smoothing.euler_factor))),
        StrategyKind::EasedQuaternion => Ok(Box::new(eased::EasedQuaternionStrategy::new(easing.clone()))),
        StrategyKind::KalmanFiltered => Ok(Box::new(kalman::KalmanFilteredStrategy::new(
            easing.clone(),
            &smoothing.landmark_filter,
            smoothing.kalman,
        )?)),
    }
}
