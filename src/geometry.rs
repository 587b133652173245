//! Vector and quaternion helpers on top of `nalgebra`.
//!
//! Every function here is total: degenerate inputs (zero-length vectors,
//! collapsed bases) produce finite outputs instead of NaN so that one bad
//! frame cannot poison the tracking session.

use crate::constants::NORMALIZE_EPSILON;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// World-space 3D vector
pub type Vec3 = Vector3<f64>;

/// Euler angles in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation about the lateral (x) axis
    pub pitch: f64,
    /// Rotation about the vertical (y) axis
    pub yaw: f64,
    /// Rotation about the forward (z) axis
    pub roll: f64,
}

impl EulerAngles {
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// True when all three angles are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

/// Normalize a vector, returning the zero vector for near-zero lengths
#[must_use]
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let length = v.norm();
    if !length.is_finite() || length <= NORMALIZE_EPSILON {
        Vec3::zeros()
    } else {
        v / length
    }
}

/// Build a rotation matrix whose columns are the given basis vectors
#[must_use]
pub fn basis_matrix(right: &Vec3, up: &Vec3, forward: &Vec3) -> Matrix3<f64> {
    Matrix3::from_columns(&[*right, *up, *forward])
}

/// Convert a rotation matrix to a unit quaternion (trace method).
///
/// A collapsed matrix still yields a finite unit quaternion; a matrix that
/// produces a zero quaternion maps to identity.
#[must_use]
pub fn matrix_to_quaternion(m: &Matrix3<f64>) -> UnitQuaternion<f64> {
    let (m00, m01, m02) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (m10, m11, m12) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (m20, m21, m22) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);
    let trace = m00 + m11 + m22;

    let (w, x, y, z) = if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        (0.25 / s, (m21 - m12) * s, (m02 - m20) * s, (m10 - m01) * s)
    } else if m00 > m11 && m00 > m22 {
        let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
        ((m21 - m12) / s, 0.25 * s, (m01 + m10) / s, (m02 + m20) / s)
    } else if m11 > m22 {
        let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
        ((m02 - m20) / s, (m01 + m10) / s, 0.25 * s, (m12 + m21) / s)
    } else {
        let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
        ((m10 - m01) / s, (m02 + m20) / s, (m12 + m21) / s, 0.25 * s)
    };

    let q = Quaternion::new(w, x, y, z);
    let norm = q.norm();
    if norm.is_finite() && norm > NORMALIZE_EPSILON {
        UnitQuaternion::new_normalize(q)
    } else {
        UnitQuaternion::identity()
    }
}

/// Compose Euler angles into a quaternion: yaw first, then roll, then pitch
/// (`Ry * Rz * Rx`).
#[must_use]
pub fn euler_to_quaternion(angles: &EulerAngles) -> UnitQuaternion<f64> {
    let (s1, c1) = (angles.yaw / 2.0).sin_cos();
    let (s2, c2) = (angles.roll / 2.0).sin_cos();
    let (s3, c3) = (angles.pitch / 2.0).sin_cos();

    let w = c1 * c2 * c3 - s1 * s2 * s3;
    let x = s1 * s2 * c3 + c1 * c2 * s3;
    let y = s1 * c2 * c3 + c1 * s2 * s3;
    let z = c1 * s2 * c3 - s1 * c2 * s3;

    // Product of unit half-angle rotations, already unit length
    UnitQuaternion::new_unchecked(Quaternion::new(w, x, y, z))
}

/// Scalar linear interpolation
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}

/// Spherical interpolation along the shortest arc, falling back to a
/// normalized lerp when the arc is ill-defined.
#[must_use]
pub fn slerp(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    a.try_slerp(b, t, 1e-9).unwrap_or_else(|| {
        let target = if a.coords.dot(&b.coords) < 0.0 { -b.into_inner() } else { b.into_inner() };
        let blended = a.into_inner().lerp(&target, t);
        if blended.norm() > NORMALIZE_EPSILON {
            UnitQuaternion::new_normalize(blended)
        } else {
            *b
        }
    })
}
