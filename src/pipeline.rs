//! Tracking session: landmarks in, glasses transforms out.
//!
//! A [`TrackingSession`] owns every piece of per-user state (strategy
//! smoothing, distance baseline and calibration, the last transform) and is
//! driven by one thread. Frames without a face or with missing anchors leave
//! the last transform untouched.

use crate::{
    constants::DEFAULT_TARGET_FPS,
    distance::{projected_eye_span, DistanceModel, FrameSize},
    landmark::Face,
    pose_estimation::{AnchorIndices, AnchorLandmarks},
    projection::Projector,
    strategies::PoseStrategy,
    transform::{GlassesTransform, ModelParams, TransformAssembler},
    Result,
};
use std::time::{Duration, Instant};

/// Why a tick produced no new transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new transform was produced
    Updated,
    /// No face in the frame
    NoFace,
    /// The face lacked an anchor landmark
    MissingAnchors,
    /// The strategy could not estimate a pose
    NoEstimate,
}

/// Per-user head tracking state
pub struct TrackingSession {
    projector: Projector,
    indices: AnchorIndices,
    strategy: Box<dyn PoseStrategy>,
    distance: DistanceModel,
    assembler: TransformAssembler,
    model: ModelParams,
    last: Option<GlassesTransform>,
    ticks: u64,
}

impl TrackingSession {
    /// # Errors
    ///
    /// Returns an error if the model parameters are invalid.
    pub fn new(
        projector: Projector,
        indices: AnchorIndices,
        strategy: Box<dyn PoseStrategy>,
        distance: DistanceModel,
        assembler: TransformAssembler,
        model: ModelParams,
    ) -> Result<Self> {
        model.validate()?;
        log::info!(
            "Tracking session ready: strategy={}, model scale={}",
            strategy.name(),
            model.scale_multiplier
        );
        Ok(Self {
            projector,
            indices,
            strategy,
            distance,
            assembler,
            model,
            last: None,
            ticks: 0,
        })
    }

    /// Process one detection result.
    ///
    /// Returns the current transform: the new one, or the previous one when
    /// this frame could not produce an update.
    pub fn update(&mut self, face: Option<&Face>, frame: Option<FrameSize>) -> Option<&GlassesTransform> {
        let outcome = self.tick(face, frame);
        if outcome != TickOutcome::Updated {
            log::trace!("Tick {} kept previous transform: {outcome:?}", self.ticks);
        }
        self.last.as_ref()
    }

    /// Like [`TrackingSession::update`], reporting what happened
    pub fn tick(&mut self, face: Option<&Face>, frame: Option<FrameSize>) -> TickOutcome {
        self.ticks += 1;

        let Some(face) = face.filter(|f| !f.is_empty()) else {
            return TickOutcome::NoFace;
        };
        let Some(landmarks) = AnchorLandmarks::from_face(face, &self.indices) else {
            log::debug!("Face with {} landmarks lacks pose anchors", face.len());
            return TickOutcome::MissingAnchors;
        };
        let Some(estimate) = self.strategy.estimate(&landmarks, &self.projector) else {
            return TickOutcome::NoEstimate;
        };

        let raw = projected_eye_span(&estimate.anchors.left_eye, &estimate.anchors.right_eye, &estimate.basis.right);
        let range_eyes = face
            .get(self.indices.range_left)
            .zip(face.get(self.indices.range_right));
        let info = self
            .distance
            .compute_distance(raw, range_eyes, frame, estimate.basis.heading());

        self.last = Some(self.assembler.assemble(&estimate, info, &self.model));
        TickOutcome::Updated
    }

    /// Replace the per-model fitting parameters; takes effect next tick
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid; the old ones stay.
    pub fn set_model_params(&mut self, model: ModelParams) -> Result<()> {
        model.validate()?;
        log::info!("Model params updated: scale={}, offset={:?}", model.scale_multiplier, model.offset);
        self.model = model;
        Ok(())
    }

    #[must_use]
    pub fn model_params(&self) -> &ModelParams {
        &self.model
    }

    #[must_use]
    pub fn last_transform(&self) -> Option<&GlassesTransform> {
        self.last.as_ref()
    }

    #[must_use]
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    #[must_use]
    pub fn distance_model(&self) -> &DistanceModel {
        &self.distance
    }

    /// Forget the last transform and strategy smoothing.
    ///
    /// Distance calibration survives: it describes the user, not the stream.
    pub fn reset(&mut self) {
        self.strategy.reset();
        self.last = None;
    }
}

/// Rate gate for running detection inside the render loop
#[derive(Debug, Clone)]
pub struct DetectionGate {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for DetectionGate {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_FPS)
    }
}

impl DetectionGate {
    /// Gate at `target_fps`; a non-positive rate lets every frame through
    /// and a rate too small to represent runs only the first frame
    #[must_use]
    pub fn new(target_fps: f64) -> Self {
        let interval = if target_fps > 0.0 && target_fps.is_finite() {
            Duration::try_from_secs_f64(1.0 / target_fps).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self { interval, last: None }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when enough time has passed since the last accepted frame
    pub fn should_run(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_skips_early_frames() {
        let mut gate = DetectionGate::new(30.0);
        let start = Instant::now();
        assert!(gate.should_run(start));
        assert!(!gate.should_run(start + Duration::from_millis(10)));
        assert!(gate.should_run(start + Duration::from_millis(34)));
        assert!(!gate.should_run(start + Duration::from_millis(40)));
    }

    #[test]
    fn test_gate_without_rate_passes_everything() {
        let mut gate = DetectionGate::new(0.0);
        let now = Instant::now();
        assert!(gate.should_run(now));
        assert!(gate.should_run(now));
    }

    #[test]
    fn test_gate_with_vanishing_rate_saturates() {
        let mut gate = DetectionGate::new(1e-300);
        assert_eq!(gate.interval(), Duration::MAX);
        let start = Instant::now();
        assert!(gate.should_run(start));
        assert!(!gate.should_run(start + Duration::from_secs(3600)));
    }
}
