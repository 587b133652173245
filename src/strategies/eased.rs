use super::PoseStrategy;
use crate::{
    pose_estimation::{AnchorLandmarks, PoseEstimate, PoseEstimator, RotationEasing},
    projection::Projector,
};

/// Stateless eased-quaternion strategy
pub struct EasedQuaternionStrategy {
    estimator: PoseEstimator,
}

impl EasedQuaternionStrategy {
    #[must_use]
    pub fn new(easing: RotationEasing) -> Self {
        Self {
            estimator: PoseEstimator::new(easing),
        }
    }
}

impl PoseStrategy for EasedQuaternionStrategy {
    fn estimate(&mut self, landmarks: &AnchorLandmarks, projector: &Projector) -> Option<PoseEstimate> {
        self.estimator.estimate(&landmarks.project(projector))
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "eased-quaternion"
    }
}
