//! Head pose estimation from four anchor landmarks.
//!
//! The estimator builds an orthonormal basis from the eyes, the top of the
//! head and the chin, decomposes it into pitch/yaw/roll, reshapes each angle
//! with a per-axis easing curve and recomposes the result into a quaternion.

use crate::{
    constants::{landmarks, GIMBAL_LOCK_THRESHOLD},
    easing::{AxisSettings, Easing, PointCurve},
    geometry::{basis_matrix, euler_to_quaternion, matrix_to_quaternion, normalize_or_zero, EulerAngles, Vec3},
    landmark::{Face, Landmark},
    projection::Projector,
};
use nalgebra::{Matrix3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// Landmark indices the pipeline reads from a face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorIndices {
    /// Left eye anchor for the basis, midpoint and scale
    pub left_eye: usize,
    /// Right eye anchor for the basis, midpoint and scale
    pub right_eye: usize,
    pub top: usize,
    pub chin: usize,
    /// Left eye point used for the pixel range estimate
    pub range_left: usize,
    /// Right eye point used for the pixel range estimate
    pub range_right: usize,
}

impl Default for AnchorIndices {
    fn default() -> Self {
        Self {
            left_eye: landmarks::LEFT_EYELID,
            right_eye: landmarks::RIGHT_EYELID,
            top: landmarks::FOREHEAD_TOP,
            chin: landmarks::CHIN,
            range_left: landmarks::LEFT_EYE_INNER,
            range_right: landmarks::RIGHT_EYE_INNER,
        }
    }
}

impl AnchorIndices {
    /// Shortest face that contains every anchor
    #[must_use]
    pub fn required_len(&self) -> usize {
        [self.left_eye, self.right_eye, self.top, self.chin, self.range_left, self.range_right]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// The four pose anchor landmarks of one face, in normalized image space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorLandmarks {
    pub left_eye: Landmark,
    pub right_eye: Landmark,
    pub top: Landmark,
    pub chin: Landmark,
    // Schema indices, for the per-index depth boost
    indices: [usize; 4],
}

impl AnchorLandmarks {
    /// Pick the anchors out of a face; `None` if any is missing
    #[must_use]
    pub fn from_face(face: &Face, indices: &AnchorIndices) -> Option<Self> {
        Some(Self {
            left_eye: *face.get(indices.left_eye)?,
            right_eye: *face.get(indices.right_eye)?,
            top: *face.get(indices.top)?,
            chin: *face.get(indices.chin)?,
            indices: [indices.left_eye, indices.right_eye, indices.top, indices.chin],
        })
    }

    /// Apply `f` to every anchor, passing its slot (0 = left eye, 1 = right
    /// eye, 2 = top, 3 = chin)
    #[must_use]
    pub fn map(&self, mut f: impl FnMut(usize, &Landmark) -> Landmark) -> Self {
        Self {
            left_eye: f(0, &self.left_eye),
            right_eye: f(1, &self.right_eye),
            top: f(2, &self.top),
            chin: f(3, &self.chin),
            indices: self.indices,
        }
    }

    /// Project into world space
    #[must_use]
    pub fn project(&self, projector: &Projector) -> Anchors {
        let [l, r, t, c] = self.indices;
        Anchors {
            left_eye: projector.project_anchor(&self.left_eye, l),
            right_eye: projector.project_anchor(&self.right_eye, r),
            top: projector.project_anchor(&self.top, t),
            chin: projector.project_anchor(&self.chin, c),
        }
    }
}

/// The four pose anchors in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub left_eye: Vec3,
    pub right_eye: Vec3,
    pub top: Vec3,
    pub chin: Vec3,
}

impl Anchors {
    /// Project the anchors of a face; `None` if any is missing
    #[must_use]
    pub fn from_face(face: &Face, indices: &AnchorIndices, projector: &Projector) -> Option<Self> {
        AnchorLandmarks::from_face(face, indices).map(|landmarks| landmarks.project(projector))
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.left_eye, self.right_eye, self.top, self.chin]
            .iter()
            .all(|v| v.iter().all(|c| c.is_finite()))
    }

    /// Midpoint between the eye anchors
    #[must_use]
    pub fn eye_midpoint(&self) -> Vec3 {
        (self.left_eye + self.right_eye) * 0.5
    }

    /// World distance between the eye anchors
    #[must_use]
    pub fn eye_distance(&self) -> f64 {
        (self.right_eye - self.left_eye).norm()
    }
}

/// Orthonormal head basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl RotationBasis {
    /// Build the basis, treating the top-chin axis as ground truth
    #[must_use]
    pub fn from_anchors(anchors: &Anchors) -> Self {
        let up = normalize_or_zero(&(anchors.top - anchors.chin));
        let initial_right = normalize_or_zero(&(anchors.right_eye - anchors.left_eye));
        let forward = normalize_or_zero(&initial_right.cross(&up));
        let right = normalize_or_zero(&up.cross(&forward));
        Self { right, up, forward }
    }

    /// Rotation matrix with columns (right, up, forward)
    #[must_use]
    pub fn matrix(&self) -> Matrix3<f64> {
        basis_matrix(&self.right, &self.up, &self.forward)
    }

    /// Direct (uneased) rotation of the basis
    #[must_use]
    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        matrix_to_quaternion(&self.matrix())
    }

    /// Yaw of the forward vector about the vertical axis
    #[must_use]
    pub fn heading(&self) -> f64 {
        self.forward.x.atan2(self.forward.z)
    }

    /// True when pairwise dot products and unit lengths are within `tolerance`
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |v: &Vec3| (v.norm() - 1.0).abs() <= tolerance;
        unit(&self.right)
            && unit(&self.up)
            && unit(&self.forward)
            && self.right.dot(&self.up).abs() <= tolerance
            && self.right.dot(&self.forward).abs() <= tolerance
            && self.up.dot(&self.forward).abs() <= tolerance
    }
}

/// Convert rotation matrix to Euler angles (radians), gimbal-lock safe.
///
/// Looking straight up or down makes yaw and roll indistinguishable; roll is
/// then pinned to zero and yaw is recovered from the remaining terms.
#[must_use]
pub fn rotation_matrix_to_euler(m: &Matrix3<f64>) -> EulerAngles {
    let m12 = m[(1, 2)];
    let pitch = (-m12).clamp(-1.0, 1.0).asin();

    if m12.abs() < GIMBAL_LOCK_THRESHOLD {
        EulerAngles {
            pitch,
            yaw: m[(0, 2)].atan2(m[(2, 2)]),
            roll: m[(1, 0)].atan2(m[(1, 1)]),
        }
    } else {
        EulerAngles {
            pitch,
            yaw: (-m[(2, 0)]).atan2(m[(0, 0)]),
            roll: 0.0,
        }
    }
}

/// Per-axis easing applied to decomposed angles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationEasing {
    pub pitch: AxisSettings,
    pub yaw: AxisSettings,
    pub roll: AxisSettings,
}

impl Default for RotationEasing {
    fn default() -> Self {
        Self {
            pitch: AxisSettings::new(1.0, Easing::Points(PointCurve::identity())),
            yaw: AxisSettings::new(1.0, Easing::Points(PointCurve::default_yaw())),
            roll: AxisSettings::new(1.0, Easing::Linear),
        }
    }
}

impl RotationEasing {
    /// All axes linear with unit multipliers
    #[must_use]
    pub fn identity() -> Self {
        Self {
            pitch: AxisSettings::default(),
            yaw: AxisSettings::default(),
            roll: AxisSettings::default(),
        }
    }

    #[must_use]
    pub fn apply(&self, angles: &EulerAngles) -> EulerAngles {
        EulerAngles {
            pitch: self.pitch.apply(angles.pitch),
            yaw: self.yaw.apply(angles.yaw),
            roll: self.roll.apply(angles.roll),
        }
    }
}

/// Result of one pose estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEstimate {
    /// Final (eased) head rotation
    pub quaternion: UnitQuaternion<f64>,
    pub basis: RotationBasis,
    /// Angles decomposed from the basis
    pub raw: EulerAngles,
    /// Angles after per-axis easing
    pub eased: EulerAngles,
    /// World anchors the estimate was built from
    pub anchors: Anchors,
}

/// Eased-quaternion head pose estimator
#[derive(Debug, Clone, Default)]
pub struct PoseEstimator {
    easing: RotationEasing,
}

impl PoseEstimator {
    #[must_use]
    pub fn new(easing: RotationEasing) -> Self {
        Self { easing }
    }

    #[must_use]
    pub fn easing(&self) -> &RotationEasing {
        &self.easing
    }

    /// Estimate head pose from world-space anchors.
    ///
    /// Returns `None` when an anchor holds non-finite coordinates.
    #[must_use]
    pub fn estimate(&self, anchors: &Anchors) -> Option<PoseEstimate> {
        if !anchors.is_finite() {
            log::warn!("Skipping pose estimate: non-finite anchor coordinates");
            return None;
        }

        let basis = RotationBasis::from_anchors(anchors);
        let raw = rotation_matrix_to_euler(&basis.matrix());
        let eased = self.easing.apply(&raw);
        log::trace!(
            "Pose raw p={:.3} y={:.3} r={:.3} eased p={:.3} y={:.3} r={:.3}",
            raw.pitch,
            raw.yaw,
            raw.roll,
            eased.pitch,
            eased.yaw,
            eased.roll
        );

        Some(PoseEstimate {
            quaternion: euler_to_quaternion(&eased),
            basis,
            raw,
            eased,
            anchors: *anchors,
        })
    }

    /// Estimate directly from a face; `None` if any anchor is missing
    #[must_use]
    pub fn estimate_face(&self, face: &Face, indices: &AnchorIndices, projector: &Projector) -> Option<PoseEstimate> {
        Anchors::from_face(face, indices, projector).and_then(|anchors| self.estimate(&anchors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn frontal() -> Anchors {
        Anchors {
            left_eye: Vec3::new(-0.03, 0.0, 0.0),
            right_eye: Vec3::new(0.03, 0.0, 0.0),
            top: Vec3::new(0.0, 0.12, 0.0),
            chin: Vec3::new(0.0, -0.1, 0.0),
        }
    }

    #[test]
    fn test_euler_angle_conversion() {
        // Identity matrix
        let angles = rotation_matrix_to_euler(&Matrix3::identity());
        assert!(angles.pitch.abs() < 1e-12);
        assert!(angles.yaw.abs() < 1e-12);
        assert!(angles.roll.abs() < 1e-12);
    }

    #[test]
    fn test_frontal_basis_is_identity() {
        let basis = RotationBasis::from_anchors(&frontal());
        assert!(basis.is_orthonormal(1e-9));
        assert!((basis.right - Vec3::x()).norm() < 1e-12);
        assert!((basis.up - Vec3::y()).norm() < 1e-12);
        assert!((basis.forward - Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn test_noisy_basis_reorthogonalized() {
        let anchors = Anchors {
            left_eye: Vec3::new(-0.031, 0.004, 0.01),
            right_eye: Vec3::new(0.029, -0.002, -0.007),
            top: Vec3::new(0.01, 0.12, 0.02),
            chin: Vec3::new(-0.005, -0.1, -0.01),
        };
        let basis = RotationBasis::from_anchors(&anchors);
        assert!(basis.is_orthonormal(1e-9));
        // forward = right x up holds for a right-handed basis
        assert!((basis.right.cross(&basis.up) - basis.forward).norm() < 1e-9);
    }

    #[test]
    fn test_gimbal_lock_branch() {
        // Forward pointing straight up
        let m = basis_matrix(&Vec3::x(), &Vec3::new(0.0, 0.0, -1.0), &Vec3::y());
        let angles = rotation_matrix_to_euler(&m);
        assert_eq!(angles.roll, 0.0);
        assert!(angles.yaw.is_finite());
        assert!((angles.pitch + FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_near_vertical_pitch_is_finite() {
        for degrees in [-89.0_f64, 89.0] {
            let pitch = degrees.to_radians();
            let q = UnitQuaternion::from_axis_angle(&Vec3::x_axis(), pitch);
            let angles = rotation_matrix_to_euler(&q.to_rotation_matrix().into_inner());
            assert!(angles.is_finite());
            assert!((angles.pitch.abs() - pitch.abs()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_anchors_stay_finite() {
        let anchors = Anchors {
            left_eye: Vec3::zeros(),
            right_eye: Vec3::zeros(),
            top: Vec3::zeros(),
            chin: Vec3::zeros(),
        };
        let estimate = PoseEstimator::default().estimate(&anchors).unwrap();
        assert!(estimate.raw.is_finite());
        assert!(estimate.quaternion.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_non_finite_anchor_rejected() {
        let mut anchors = frontal();
        anchors.top.y = f64::NAN;
        assert!(PoseEstimator::default().estimate(&anchors).is_none());
    }

    #[test]
    fn test_identity_easing_matches_direct_yaw_rotation() {
        let anchors = Anchors {
            left_eye: Vec3::new(-0.03, 0.0, 0.01),
            right_eye: Vec3::new(0.03, 0.0, -0.01),
            top: Vec3::new(0.0, 0.12, 0.0),
            chin: Vec3::new(0.0, -0.1, 0.0),
        };
        let estimate = PoseEstimator::new(RotationEasing::identity()).estimate(&anchors).unwrap();
        let direct = estimate.basis.to_quaternion();
        assert!(estimate.quaternion.angle_to(&direct) < 1e-9);
    }

    #[test]
    fn test_required_len() {
        assert_eq!(AnchorIndices::default().required_len(), 464);
    }
}
