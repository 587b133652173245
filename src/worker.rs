//! Off-thread detection and tracking.
//!
//! The render side posts frames to a [`FaceWorker`]; a background thread
//! runs the landmark detector and the tracking session and publishes each
//! result into a single overwritten slot. At most one detection is in
//! flight: frames submitted while the worker is busy replace each other, so
//! only the most recent one is processed next.

use crate::{
    distance::FrameSize,
    landmark::Face,
    pipeline::{TickOutcome, TrackingSession},
    transform::{GlassesTransform, ModelParams},
    Error, Result,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Condvar, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// Landmark detector run on the worker thread
pub trait LandmarkSource: Send + 'static {
    type Frame: Send + 'static;

    /// Detect at most one face in a frame
    ///
    /// # Errors
    ///
    /// Returns an error if detection fails; the worker treats it as no face.
    fn detect(&mut self, frame: &Self::Frame) -> Result<Option<Face>>;

    /// Pixel size of a frame, if known
    fn frame_size(&self, frame: &Self::Frame) -> Option<FrameSize>;
}

/// One published detection result
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerResult {
    /// Number of frames processed so far, starting at 1
    pub sequence: u64,
    /// Landmarks of the detected face; empty when there is none
    pub landmarks: Face,
    /// Most recent transform of the session, carried over when this frame
    /// could not update it
    pub transform: Option<GlassesTransform>,
    /// Whether this frame produced a fresh transform
    pub updated: bool,
}

/// Single-value mailbox where a new value replaces an unread one
pub struct LatestSlot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }
}

impl<T> LatestSlot<T> {
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A panicked writer leaves at worst a stale value behind
        self.value.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Store a value, returning the unread one it replaced
    pub fn publish(&self, value: T) -> Option<T> {
        let displaced = self.lock().replace(value);
        self.ready.notify_all();
        displaced
    }

    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Wait up to `timeout` for a value
    pub fn wait_take(&self, timeout: Duration) -> Option<T> {
        let guard = self.lock();
        let (mut guard, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |value| value.is_none())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.take()
    }
}

enum Command<F> {
    Frame(F),
    SetModelParams(ModelParams),
    Shutdown,
}

/// Render-side handle to the detection thread
pub struct FaceWorker<F: Send + 'static> {
    commands: Sender<Command<F>>,
    busy: Arc<AtomicBool>,
    results: Arc<LatestSlot<WorkerResult>>,
    pending: Option<F>,
    handle: Option<JoinHandle<()>>,
    landmarks: Face,
    transform: Option<GlassesTransform>,
    dropped: u64,
}

impl<F: Send + 'static> FaceWorker<F> {
    /// Start the worker thread
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<S>(source: S, session: TrackingSession) -> Result<Self>
    where
        S: LandmarkSource<Frame = F>,
    {
        let (commands, receiver) = mpsc::channel();
        let busy = Arc::new(AtomicBool::new(false));
        let results = Arc::new(LatestSlot::default());

        let handle = thread::Builder::new()
            .name("face-worker".to_string())
            .spawn({
                let busy = Arc::clone(&busy);
                let results = Arc::clone(&results);
                move || run_worker(source, session, &receiver, &busy, &results)
            })
            .map_err(|e| Error::WorkerError(format!("Failed to spawn worker thread: {e}")))?;

        log::info!("Face worker started");
        Ok(Self {
            commands,
            busy,
            results,
            pending: None,
            handle: Some(handle),
            landmarks: Face::default(),
            transform: None,
            dropped: 0,
        })
    }

    fn send(&self, command: Command<F>) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::WorkerError("Worker thread has stopped".to_string()))
    }

    /// Hand a frame to the worker, or park it if a detection is in flight.
    ///
    /// Returns the older parked frame this one displaced, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread has stopped.
    pub fn submit(&mut self, frame: F) -> Result<Option<F>> {
        let displaced = if self.try_claim() {
            let stale = self.pending.take();
            self.dispatch(frame)?;
            stale
        } else {
            self.pending.replace(frame)
        };
        if displaced.is_some() {
            self.dropped += 1;
            log::trace!("Dropped stale frame ({} total)", self.dropped);
        }
        Ok(displaced)
    }

    /// Collect a published result and forward the parked frame if the worker is idle
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread has stopped.
    pub fn poll(&mut self) -> Result<Option<WorkerResult>> {
        let result = self.results.take();
        self.absorb(result.as_ref());
        self.flush_pending()?;
        Ok(result)
    }

    /// Block up to `timeout` for the next result
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread has stopped.
    pub fn wait(&mut self, timeout: Duration) -> Result<Option<WorkerResult>> {
        let result = self.results.wait_take(timeout);
        self.absorb(result.as_ref());
        self.flush_pending()?;
        Ok(result)
    }

    /// Update the model fitting parameters used for subsequent frames
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or the worker has stopped.
    pub fn set_model_params(&self, params: ModelParams) -> Result<()> {
        params.validate()?;
        self.send(Command::SetModelParams(params))
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Landmarks from the most recent result
    #[must_use]
    pub fn landmarks(&self) -> &Face {
        &self.landmarks
    }

    /// Most recent transform; survives frames without a face
    #[must_use]
    pub fn current_transform(&self) -> Option<&GlassesTransform> {
        self.transform.as_ref()
    }

    /// Frames replaced before the worker got to them
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Stop the worker and wait for it to exit
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread panicked.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn dispatch(&self, frame: F) -> Result<()> {
        let sent = self.send(Command::Frame(frame));
        if sent.is_err() {
            self.busy.store(false, Ordering::Release);
        }
        sent
    }

    fn flush_pending(&mut self) -> Result<()> {
        if self.pending.is_some() && self.try_claim() {
            if let Some(frame) = self.pending.take() {
                self.dispatch(frame)?;
            }
        }
        Ok(())
    }

    fn absorb(&mut self, result: Option<&WorkerResult>) {
        if let Some(result) = result {
            self.landmarks = result.landmarks.clone();
            if let Some(transform) = result.transform {
                self.transform = Some(transform);
            }
        }
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.pending = None;
        // The thread may already be gone; joining still reports a panic
        let _ = self.commands.send(Command::Shutdown);
        handle
            .join()
            .map_err(|_| Error::WorkerError("Worker thread panicked".to_string()))
    }
}

impl<F: Send + 'static> Drop for FaceWorker<F> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Face worker teardown: {e}");
        }
    }
}

fn run_worker<S: LandmarkSource>(
    mut source: S,
    mut session: TrackingSession,
    commands: &Receiver<Command<S::Frame>>,
    busy: &AtomicBool,
    results: &LatestSlot<WorkerResult>,
) {
    let mut sequence = 0u64;

    'outer: while let Ok(first) = commands.recv() {
        // Drain the queue down to the newest frame
        let mut frame = None;
        for command in std::iter::once(first).chain(commands.try_iter()) {
            match command {
                Command::Frame(next) => {
                    if frame.replace(next).is_some() {
                        log::trace!("Worker skipped a queued frame");
                    }
                }
                Command::SetModelParams(params) => {
                    if let Err(e) = session.set_model_params(params) {
                        log::warn!("Rejected model params: {e}");
                    }
                }
                Command::Shutdown => break 'outer,
            }
        }
        let Some(frame) = frame else {
            continue;
        };

        let face = source.detect(&frame).unwrap_or_else(|e| {
            log::warn!("Landmark detection failed: {e}");
            None
        });
        let outcome = session.tick(face.as_ref(), source.frame_size(&frame));

        sequence += 1;
        // Idle before publishing, so a consumer woken by the result can submit right away
        busy.store(false, Ordering::Release);
        results.publish(WorkerResult {
            sequence,
            landmarks: face.unwrap_or_default(),
            transform: session.last_transform().copied(),
            updated: outcome == TickOutcome::Updated,
        });
    }

    log::info!("Face worker stopped after {sequence} frames");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_slot_overwrites() {
        let slot = LatestSlot::default();
        assert_eq!(slot.publish(1), None);
        assert_eq!(slot.publish(2), Some(1));
        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_latest_slot_wait_times_out() {
        let slot: LatestSlot<u8> = LatestSlot::default();
        assert_eq!(slot.wait_take(Duration::from_millis(5)), None);
    }

    #[test]
    fn test_latest_slot_wait_across_threads() {
        let slot = Arc::new(LatestSlot::default());
        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                slot.publish(7u32);
            })
        };
        assert_eq!(slot.wait_take(Duration::from_secs(5)), Some(7));
        writer.join().unwrap();
    }
}
