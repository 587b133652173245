//! Landmark and face types validated at the detector boundary.
//!
//! Detector output enters the pipeline only through [`Face::new`] or
//! [`Face::from_raw`]; everything downstream can assume finite x/y
//! coordinates and either a finite z or none at all.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single facial landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0 = left edge, 1 = right edge
    pub x: f64,
    /// Vertical position, 0 = top edge, 1 = bottom edge
    pub y: f64,
    /// Detector-relative depth, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Landmark without depth information
    #[must_use]
    pub const fn flat(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Coerce a raw detector point.
    ///
    /// # Errors
    ///
    /// Returns an error if x or y is not finite.
    pub fn checked(x: f64, y: f64, z: Option<f64>) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::InvalidInput(format!("Non-finite landmark coordinates ({x}, {y})")));
        }
        // A NaN depth is as good as no depth
        let z = z.filter(|z| z.is_finite());
        Ok(Self { x, y, z })
    }
}

/// The landmarks of one detected face, in detector schema order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct Face {
    points: Vec<Landmark>,
}

impl TryFrom<Vec<Landmark>> for Face {
    type Error = Error;

    fn try_from(points: Vec<Landmark>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Face> for Vec<Landmark> {
    fn from(face: Face) -> Self {
        face.points
    }
}

impl Face {
    /// Validate and wrap detector landmarks.
    ///
    /// # Errors
    ///
    /// Returns an error if any landmark has non-finite x/y coordinates.
    pub fn new(points: Vec<Landmark>) -> Result<Self> {
        let points = points
            .into_iter()
            .enumerate()
            .map(|(idx, p)| {
                Landmark::checked(p.x, p.y, p.z)
                    .map_err(|e| Error::InvalidInput(format!("Landmark {idx}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { points })
    }

    /// Convert raw `[x, y]` or `[x, y, z]` arrays into a face.
    ///
    /// # Errors
    ///
    /// Returns an error if a point has fewer than two components or
    /// non-finite x/y coordinates.
    pub fn from_raw<P: AsRef<[f64]>>(raw: &[P]) -> Result<Self> {
        let points = raw
            .iter()
            .enumerate()
            .map(|(idx, point)| match *point.as_ref() {
                [x, y] => Landmark::checked(x, y, None),
                [x, y, z, ..] => Landmark::checked(x, y, Some(z)),
                _ => Err(Error::InvalidInput(format!(
                    "Landmark {idx} has {} components, expected 2 or 3",
                    point.as_ref().len()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { points })
    }

    /// Landmark at a schema index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    /// Landmark at a schema index, as an error when absent
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingLandmark`] if the face is too short.
    pub fn require(&self, index: usize) -> Result<&Landmark> {
        self.get(index).ok_or(Error::MissingLandmark(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_mixed_dimensions() {
        let raw = vec![vec![0.1, 0.2], vec![0.3, 0.4, -0.05]];
        let face = Face::from_raw(&raw).unwrap();
        assert_eq!(face.len(), 2);
        assert_eq!(face.get(0).unwrap().z, None);
        assert_eq!(face.get(1).unwrap().z, Some(-0.05));
    }

    #[test]
    fn test_from_raw_rejects_short_points() {
        let raw = vec![vec![0.1]];
        assert!(Face::from_raw(&raw).is_err());
    }

    #[test]
    fn test_nan_depth_is_dropped() {
        let face = Face::new(vec![Landmark::new(0.5, 0.5, f64::NAN)]).unwrap();
        assert_eq!(face.get(0).unwrap().z, None);
    }

    #[test]
    fn test_non_finite_xy_rejected() {
        assert!(Face::new(vec![Landmark::flat(f64::INFINITY, 0.5)]).is_err());
        assert!(Landmark::checked(0.5, f64::NAN, None).is_err());
    }

    #[test]
    fn test_require_missing_index() {
        let face = Face::new(vec![Landmark::flat(0.5, 0.5)]).unwrap();
        assert!(face.require(0).is_ok());
        assert!(matches!(face.require(10), Err(Error::MissingLandmark(10))));
    }

    #[test]
    fn test_json_shape() {
        let face: Face = serde_json::from_str(r#"[{"x":0.1,"y":0.2,"z":0.0},{"x":0.3,"y":0.4}]"#).unwrap();
        assert_eq!(face.len(), 2);
        assert_eq!(face.get(1).unwrap().z, None);

        let bad: std::result::Result<Face, _> = serde_json::from_str(r#"[{"x":1e400,"y":0.2}]"#);
        assert!(bad.is_err());
    }
}
