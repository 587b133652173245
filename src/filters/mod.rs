//! Signal filtering algorithms for smoothing landmark and distance signals.
//!
//! Filters are scalar; [`VectorFilter`] runs one instance per coordinate
//! for 3D points.

/// Scalar Kalman filter for landmark coordinates
pub mod kalman;

/// Exponential filter used for slowly adapting baselines
pub mod exponential;

use crate::{geometry::Vec3, Result};

/// Trait for all scalar signal filters
pub trait SignalFilter: Send + Sync {
    /// Feed one sample and return the filtered value
    fn apply(&mut self, value: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl SignalFilter for NoFilter {
    fn apply(&mut self, value: f64) -> f64 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Three independent filters, one per coordinate
pub struct VectorFilter {
    x: Box<dyn SignalFilter>,
    y: Box<dyn SignalFilter>,
    z: Box<dyn SignalFilter>,
}

impl VectorFilter {
    #[must_use]
    pub fn new(x: Box<dyn SignalFilter>, y: Box<dyn SignalFilter>, z: Box<dyn SignalFilter>) -> Self {
        Self { x, y, z }
    }

    /// Per-coordinate Kalman filter with shared noise parameters
    #[must_use]
    pub fn kalman(params: kalman::KalmanParams) -> Self {
        Self::new(
            Box::new(kalman::KalmanFilter::new(params)),
            Box::new(kalman::KalmanFilter::new(params)),
            Box::new(kalman::KalmanFilter::new(params)),
        )
    }

    /// Build a per-coordinate filter from a filter type name
    ///
    /// # Errors
    ///
    /// Returns an error if the filter type is unknown.
    pub fn from_name(filter_type: &str) -> Result<Self> {
        Ok(Self {
            x: create_filter(filter_type)?,
            y: create_filter(filter_type)?,
            z: create_filter(filter_type)?,
        })
    }

    pub fn apply(&mut self, v: &Vec3) -> Vec3 {
        Vec3::new(self.x.apply(v.x), self.y.apply(v.y), self.z.apply(v.z))
    }

    /// Filter x and y, and z only when present
    pub fn apply_partial(&mut self, x: f64, y: f64, z: Option<f64>) -> (f64, f64, Option<f64>) {
        (self.x.apply(x), self.y.apply(y), z.map(|z| self.z.apply(z)))
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.x.name()
    }
}

/// Create a signal filter by type name
///
/// # Errors
///
/// Returns an error if the filter type is unknown.
pub fn create_filter(filter_type: &str) -> Result<Box<dyn SignalFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "kalman" => Ok(Box::new(kalman::KalmanFilter::default())),
        "exponential" | "ewma" => Ok(Box::new(exponential::ExponentialFilter::new(0.5)?)),
        _ => Err(crate::Error::ConfigError(format!("Unknown filter type: {filter_type}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter;
        assert_eq!(filter.apply(10.0), 10.0);
        assert_eq!(filter.apply(-3.5), -3.5);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("Kalman").is_ok());
        assert!(create_filter("ewma").is_ok());
        assert!(create_filter("unknown").is_err());
    }

    #[test]
    fn test_vector_filter_keeps_missing_depth() {
        let mut filter = VectorFilter::from_name("kalman").unwrap();
        let (x, y, z) = filter.apply_partial(0.4, 0.6, None);
        assert_eq!((x, y, z), (0.4, 0.6, None));
        assert_eq!(filter.name(), "KalmanFilter");
    }
}
