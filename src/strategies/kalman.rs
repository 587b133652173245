use super::PoseStrategy;
use crate::{
    filters::{kalman::KalmanParams, VectorFilter},
    landmark::Landmark,
    pose_estimation::{AnchorLandmarks, PoseEstimate, PoseEstimator, RotationEasing},
    projection::Projector,
    Result,
};

/// Eased estimator fed with per-coordinate filtered anchors
pub struct KalmanFilteredStrategy {
    estimator: PoseEstimator,
    // One filter per anchor slot
    filters: [VectorFilter; 4],
}

impl KalmanFilteredStrategy {
    /// `filter_type` picks the landmark filter; "kalman" uses `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter type is unknown.
    pub fn new(easing: RotationEasing, filter_type: &str, params: KalmanParams) -> Result<Self> {
        let make = || -> Result<VectorFilter> {
            if filter_type.eq_ignore_ascii_case("kalman") {
                Ok(VectorFilter::kalman(params))
            } else {
                VectorFilter::from_name(filter_type)
            }
        };
        Ok(Self {
            estimator: PoseEstimator::new(easing),
            filters: [make()?, make()?, make()?, make()?],
        })
    }
}

impl PoseStrategy for KalmanFilteredStrategy {
    fn estimate(&mut self, landmarks: &AnchorLandmarks, projector: &Projector) -> Option<PoseEstimate> {
        let filters = &mut self.filters;
        let smoothed = landmarks.map(|slot, landmark| {
            let (x, y, z) = filters[slot].apply_partial(landmark.x, landmark.y, landmark.z);
            Landmark { x, y, z }
        });
        self.estimator.estimate(&smoothed.project(projector))
    }

    fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    fn name(&self) -> &str {
        "kalman-filtered"
    }
}
