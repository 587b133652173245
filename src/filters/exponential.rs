use super::SignalFilter;
use crate::{Error, Result};

/// Exponential smoothing filter, seeded by the first sample
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<f64>,
}

impl ExponentialFilter {
    /// # Errors
    ///
    /// Returns an error unless `alpha` is in `(0, 1]`.
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::ConfigError(format!("Alpha must be in (0, 1], got {alpha}")));
        }
        Ok(Self { alpha, last: None })
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Current estimate, if any sample has been seen
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.last
    }

    /// Feed one sample with its own weight in `[0, 1]`.
    ///
    /// The first sample always seeds the estimate; afterwards a zero weight
    /// leaves it untouched.
    pub fn apply_weighted(&mut self, value: f64, weight: f64) -> f64 {
        let filtered = match self.last {
            Some(last) => {
                let alpha = self.alpha * weight.clamp(0.0, 1.0);
                if alpha > 0.0 {
                    alpha.mul_add(value - last, last)
                } else {
                    last
                }
            }
            None => value,
        };
        self.last = Some(filtered);
        filtered
    }
}

impl SignalFilter for ExponentialFilter {
    fn apply(&mut self, value: f64) -> f64 {
        self.apply_weighted(value, 1.0)
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5).unwrap();

        // First value passes through
        assert_eq!(filter.apply(10.0), 10.0);

        // Second value is smoothed
        assert_eq!(filter.apply(20.0), 15.0); // 0.5 * 20 + 0.5 * 10
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(ExponentialFilter::new(0.0).is_err());
        assert!(ExponentialFilter::new(1.5).is_err());
        assert!(ExponentialFilter::new(f64::NAN).is_err());

        // Low alpha = more smoothing
        let mut filter = ExponentialFilter::new(0.1).unwrap();
        filter.apply(10.0);
        assert!((filter.apply(20.0) - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_weight_holds_estimate() {
        let mut filter = ExponentialFilter::new(0.02).unwrap();
        filter.apply_weighted(0.06, 0.0);
        assert_eq!(filter.value(), Some(0.06));
        assert_eq!(filter.apply_weighted(0.08, 0.0), 0.06);
        let moved = filter.apply_weighted(0.08, 0.5);
        assert!((moved - 0.0602).abs() < 1e-12);
    }
}
