use super::PoseStrategy;
use crate::{
    geometry::{EulerAngles, Vec3},
    pose_estimation::{rotation_matrix_to_euler, AnchorLandmarks, PoseEstimate, RotationBasis},
    projection::Projector,
};
use nalgebra::UnitQuaternion;

/// Amplification applied before smoothing (pitch, yaw, roll)
const AXIS_GAIN: EulerAngles = EulerAngles::new(2.0, 2.0, 1.0);

/// Euler-space strategy: decompose, amplify, smooth, recompose in YXZ order
pub struct BasicEulerStrategy {
    factor: f64,
    smoothed: EulerAngles,
}

impl BasicEulerStrategy {
    #[must_use]
    pub fn new(factor: f64) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            smoothed: EulerAngles::default(),
        }
    }
}

/// Intrinsic Y-X-Z rotation
fn yxz_quaternion(angles: &EulerAngles) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vec3::y_axis(), angles.yaw)
        * UnitQuaternion::from_axis_angle(&Vec3::x_axis(), angles.pitch)
        * UnitQuaternion::from_axis_angle(&Vec3::z_axis(), angles.roll)
}

impl PoseStrategy for BasicEulerStrategy {
    fn estimate(&mut self, landmarks: &AnchorLandmarks, projector: &Projector) -> Option<PoseEstimate> {
        let anchors = landmarks.project(projector);
        if !anchors.is_finite() {
            return None;
        }

        let basis = RotationBasis::from_anchors(&anchors);
        let raw = rotation_matrix_to_euler(&basis.matrix());
        let target = EulerAngles::new(
            raw.pitch * AXIS_GAIN.pitch,
            raw.yaw * AXIS_GAIN.yaw,
            raw.roll * AXIS_GAIN.roll,
        );

        let k = self.factor;
        self.smoothed = EulerAngles::new(
            (target.pitch - self.smoothed.pitch).mul_add(k, self.smoothed.pitch),
            (target.yaw - self.smoothed.yaw).mul_add(k, self.smoothed.yaw),
            (target.roll - self.smoothed.roll).mul_add(k, self.smoothed.roll),
        );

        Some(PoseEstimate {
            quaternion: yxz_quaternion(&self.smoothed),
            basis,
            raw,
            eased: self.smoothed,
            anchors,
        })
    }

    fn reset(&mut self) {
        self.smoothed = EulerAngles::default();
    }

    fn name(&self) -> &str {
        "basic-euler"
    }
}
