//! Recorded landmark streams.
//!
//! A recording is JSON lines, one frame per line:
//! `{"width": 640, "height": 480, "landmarks": [[x, y, z], ...]}`. A null or
//! empty `landmarks` entry is a frame where no face was detected.

use crate::{
    distance::FrameSize,
    landmark::Face,
    worker::LandmarkSource,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// One recorded detector output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub landmarks: Option<Vec<Vec<f64>>>,
}

impl FrameRecord {
    /// Parse one JSON line
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a valid frame record.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// The recorded face, `None` when no face was detected
    ///
    /// # Errors
    ///
    /// Returns an error if a landmark is malformed.
    pub fn face(&self) -> Result<Option<Face>> {
        match self.landmarks.as_deref() {
            None | Some([]) => Ok(None),
            Some(raw) => Face::from_raw(raw).map(Some),
        }
    }

    #[must_use]
    pub fn frame_size(&self) -> Option<FrameSize> {
        let size = FrameSize::new(self.width?, self.height?);
        size.is_valid().then_some(size)
    }
}

/// Read frame records, skipping blank lines; errors carry the line number
pub fn read_records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<FrameRecord>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                FrameRecord::parse(&line)
                    .map_err(|e| Error::InvalidInput(format!("Line {}: {e}", idx + 1))),
            ),
            Err(e) => Some(Err(Error::Io(e))),
        })
}

/// Detector stand-in that replays recorded landmarks
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordedLandmarks;

impl LandmarkSource for RecordedLandmarks {
    type Frame = FrameRecord;

    fn detect(&mut self, frame: &FrameRecord) -> Result<Option<Face>> {
        frame.face()
    }

    fn frame_size(&self, frame: &FrameRecord) -> Option<FrameSize> {
        frame.frame_size()
    }
}
