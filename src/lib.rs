//! Head pose and glasses transform library for virtual try-on overlays.
//!
//! This library turns per-frame face mesh landmarks (normalized image
//! coordinates, as produced by a face landmark detector) into a transform
//! for a 3D glasses model:
//! - a world-space position between the eyes, with yaw, pitch and distance
//!   dependent corrections
//! - a uniform scale from the eye distance
//! - a head rotation quaternion with per-axis easing
//!
//! The pipeline consists of:
//! 1. Projection of the anchor landmarks into world space
//! 2. An orthonormal head basis from the eyes, forehead and chin
//! 3. One of three pose strategies (basic Euler, eased quaternion, Kalman filtered)
//! 4. Distance estimation with calibration and gain limiting
//! 5. Transform assembly, optionally smoothed on the render side
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use glasses_tracker::{config::Config, replay::read_records};
//! use std::{fs::File, io::BufReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut session = config.build_session()?;
//!
//! for record in read_records(BufReader::new(File::open("landmarks.jsonl")?)) {
//!     let record = record?;
//!     let face = record.face()?;
//!     if let Some(transform) = session.update(face.as_ref(), record.frame_size()) {
//!         println!("position={:?} scale={:.4}", transform.position, transform.scale);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Off-thread Detection
//!
//! ```no_run
//! use glasses_tracker::{config::Config, replay::{FrameRecord, RecordedLandmarks}, worker::FaceWorker};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Config::default().build_session()?;
//! let mut worker = FaceWorker::spawn(RecordedLandmarks, session)?;
//!
//! worker.submit(FrameRecord::default())?;
//! if let Some(result) = worker.wait(Duration::from_millis(100))? {
//!     println!("frame {} has {} landmarks", result.sequence, result.landmarks.len());
//! }
//! worker.shutdown()?;
//! # Ok(())
//! # }
//! ```

/// Configuration file loading and validation
pub mod config;

/// Landmark indices and numeric constants
pub mod constants;

/// Distance estimation, calibration and gain limiting
pub mod distance;

/// Easing curves for rotation mapping
pub mod easing;

/// Error types for the library
pub mod error;

/// Signal filtering algorithms for smoothing landmarks
pub mod filters;

/// Vector, matrix and quaternion helpers
pub mod geometry;

/// Face mesh landmark types
pub mod landmark;

/// Yaw, pitch and distance driven position offsets
pub mod offsets;

/// Flat image overlay placement
pub mod overlay2d;

/// Per-user tracking session
pub mod pipeline;

/// Head basis and rotation estimation from anchor landmarks
pub mod pose_estimation;

/// Normalized landmark to world projection
pub mod projection;

/// Recorded landmark streams
pub mod replay;

/// Render-side transform smoothing
pub mod smoothing;

/// Pose estimation strategies
pub mod strategies;

/// Glasses transform assembly
pub mod transform;

/// Background detection worker
pub mod worker;

pub use error::{Error, Result};
