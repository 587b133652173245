//! Easing curves for perceptual tuning of rotation angles and distances.
//!
//! Every curve maps `[0, 1]` onto `[0, 1]` with `f(0) = 0` and `f(1) = 1`.

use crate::constants::QUARTER_TURN;
use serde::{Deserialize, Serialize};

/// One control point of a piecewise-linear curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Input in `[0, 1]`
    pub t: f64,
    /// Output in `[0, 1]`
    pub v: f64,
}

impl CurvePoint {
    #[must_use]
    pub const fn new(t: f64, v: f64) -> Self {
        Self { t, v }
    }
}

/// A user-edited piecewise-linear curve.
///
/// Points are kept sorted by `t` and the curve is pinned to `(0, 0)` and
/// `(1, 1)`. Points outside `0 < t < 1` are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurvePoint>", into = "Vec<CurvePoint>")]
pub struct PointCurve {
    points: Vec<CurvePoint>,
}

impl PointCurve {
    #[must_use]
    pub fn new(points: Vec<CurvePoint>) -> Self {
        let mut points: Vec<CurvePoint> = points
            .into_iter()
            .filter(|p| p.t > 0.0 && p.t < 1.0 && p.v.is_finite())
            .collect();
        points.push(CurvePoint::new(0.0, 0.0));
        points.push(CurvePoint::new(1.0, 1.0));
        points.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { points }
    }

    /// Identity curve
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Vec::new())
    }

    /// Default yaw tuning: slightly amplifies small turns
    #[must_use]
    pub fn default_yaw() -> Self {
        Self::new(vec![
            CurvePoint::new(0.0, 0.0),
            CurvePoint::new(0.05, 0.08),
            CurvePoint::new(0.15, 0.2),
            CurvePoint::new(0.35, 0.43),
            CurvePoint::new(1.0, 1.0),
        ])
    }

    #[must_use]
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Evaluate at `t`, clamped to `[0, 1]`
    #[must_use]
    pub fn eval(&self, t: f64) -> f64 {
        let t = clamp01(t);
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t >= a.t && t <= b.t {
                let span = if (b.t - a.t).abs() > 0.0 { b.t - a.t } else { 1e-6 };
                let k = (t - a.t) / span;
                return (b.v - a.v).mul_add(k, a.v);
            }
        }
        t
    }
}

impl From<Vec<CurvePoint>> for PointCurve {
    fn from(points: Vec<CurvePoint>) -> Self {
        Self::new(points)
    }
}

impl From<PointCurve> for Vec<CurvePoint> {
    fn from(curve: PointCurve) -> Self {
        curve.points
    }
}

/// Supported easing curves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    /// Hermite smoothstep
    Smoothstep,
    /// Piecewise-linear user curve
    Points(PointCurve),
}

impl Easing {
    /// Apply the curve to `t`, clamped to `[0, 1]`
    #[must_use]
    pub fn apply(&self, t: f64) -> f64 {
        let t = clamp01(t);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => t * (2.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    (4.0 - 2.0 * t).mul_add(t, -1.0)
                }
            }
            Self::Smoothstep => smoothstep(t),
            Self::Points(curve) => curve.eval(t),
        }
    }

    /// Short name used in logs and debug output
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Linear => "linear",
            Self::InQuad => "in-quad",
            Self::OutQuad => "out-quad",
            Self::InOutQuad => "in-out-quad",
            Self::Smoothstep => "smoothstep",
            Self::Points(_) => "points",
        }
    }
}

/// Per-axis rotation mapping: easing curve plus amplification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSettings {
    pub multiplier: f64,
    pub ease: Easing,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            ease: Easing::Linear,
        }
    }
}

/// How one raw angle was mapped, for on-screen tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisMapping {
    /// Normalized input in `[0, 1]`
    pub t: f64,
    /// Curve output in `[0, 1]`
    pub v: f64,
    /// Resulting angle in radians
    pub final_angle: f64,
    pub multiplier: f64,
    /// Control points in the curve, zero for analytic curves
    pub points: usize,
}

impl AxisSettings {
    #[must_use]
    pub fn new(multiplier: f64, ease: Easing) -> Self {
        Self { multiplier, ease }
    }

    /// Ease an angle relative to a quarter turn, keeping its sign
    #[must_use]
    pub fn apply(&self, angle: f64) -> f64 {
        self.mapping(angle).final_angle
    }

    #[must_use]
    pub fn mapping(&self, angle: f64) -> AxisMapping {
        let sign = signum_or_zero(angle);
        let t = clamp01(angle.abs() / QUARTER_TURN);
        let v = self.ease.apply(t);
        AxisMapping {
            t,
            v,
            final_angle: sign * v * QUARTER_TURN * self.multiplier,
            multiplier: self.multiplier,
            points: match &self.ease {
                Easing::Points(curve) => curve.points().len(),
                _ => 0,
            },
        }
    }
}

/// Hermite smoothstep on `[0, 1]`
#[must_use]
pub fn smoothstep(t: f64) -> f64 {
    t * t * 2.0f64.mul_add(-t, 3.0)
}

/// Clamp to `[0, 1]`; NaN maps to zero
#[must_use]
pub fn clamp01(t: f64) -> f64 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Sign that treats zero as zero (`f64::signum` returns ±1 for ±0)
#[must_use]
pub fn signum_or_zero(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
