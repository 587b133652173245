use super::SignalFilter;
use serde::{Deserialize, Serialize};

/// Noise parameters of the scalar Kalman filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanParams {
    /// Process noise (R): how fast the true value is expected to drift
    pub process_noise: f64,
    /// Measurement noise (Q): how much one detector sample is trusted
    pub measurement_noise: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 0.0005,
        }
    }
}

/// Constant-state scalar Kalman filter for landmark coordinates
pub struct KalmanFilter {
    params: KalmanParams,
    // None until the first measurement
    state: Option<f64>,
    covariance: f64,
}

impl KalmanFilter {
    #[must_use]
    pub fn new(params: KalmanParams) -> Self {
        Self {
            params,
            state: None,
            covariance: 0.0,
        }
    }

    #[must_use]
    pub fn params(&self) -> KalmanParams {
        self.params
    }
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(KalmanParams::default())
    }
}

impl SignalFilter for KalmanFilter {
    fn apply(&mut self, value: f64) -> f64 {
        let Some(state) = self.state else {
            self.state = Some(value);
            self.covariance = self.params.measurement_noise;
            return value;
        };

        // Predict
        let predicted_cov = self.covariance + self.params.process_noise;

        // Update with measurement
        let gain = predicted_cov / (predicted_cov + self.params.measurement_noise);
        let filtered = gain.mul_add(value - state, state);
        self.covariance = predicted_cov - gain * predicted_cov;
        self.state = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.state = None;
        self.covariance = 0.0;
    }

    fn name(&self) -> &str {
        "KalmanFilter"
    }
}
