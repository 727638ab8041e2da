//! # Sensor Capabilities
//!
//! The camera and the emotion model are opaque collaborators. This module
//! defines the traits the [`crate::detection::DetectionController`] drives,
//! a scoped [`SensorLease`] that guarantees the camera stream is released on
//! every exit path, and a few concrete implementations:
//!
//! - [`UnavailableCamera`] / [`NullDetector`]: no hardware, no model. The
//!   controller degrades straight to synthetic mode.
//! - [`ReplayCamera`] / [`ReplayDetector`]: replay recorded scores from a
//!   JSON-lines file, one object per frame, e.g.
//!   `{"happy": 0.82, "neutral": 0.1}`. An empty object means "no face found".

use crate::emotion::ScoreMap;
use crate::error::{PipelineError, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// One captured video frame. The payload is whatever the detector expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub sequence: u64,
    pub data: Vec<u8>,
}

/// An open camera stream.
pub trait FrameStream: Send {
    /// Capture the next frame.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DetectionFailure`] when no frame can be produced.
    fn capture(&mut self) -> Result<Frame>;
}

/// Camera capability. Only the detection controller acquires it.
pub trait Camera: Send {
    /// Open a stream.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SensorUnavailable`] when permission is denied or no
    /// device exists.
    fn acquire(&mut self) -> Result<Box<dyn FrameStream>>;

    /// Close a stream returned by [`Camera::acquire`].
    fn release(&mut self, stream: Box<dyn FrameStream>);
}

/// Emotion model capability.
pub trait EmotionDetector: Send {
    /// Load model weights. Failure is not fatal for the controller.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DetectionFailure`] when the model cannot be loaded.
    fn load_model(&mut self) -> Result<()>;

    /// Score one frame. `Ok(None)` means no subject was found.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DetectionFailure`] when inference fails.
    fn detect(&mut self, frame: &Frame) -> Result<Option<ScoreMap>>;
}

/// Exclusive hold on an open camera stream.
///
/// Dropping the lease releases the stream, so an early return or a panic in
/// the polling loop cannot leak the camera.
pub struct SensorLease<'a> {
    camera: &'a mut dyn Camera,
    stream: Option<Box<dyn FrameStream>>,
}

impl<'a> SensorLease<'a> {
    /// Acquire a stream from `camera`.
    ///
    /// # Errors
    ///
    /// Propagates the camera's [`PipelineError::SensorUnavailable`].
    pub fn acquire(camera: &'a mut dyn Camera) -> Result<Self> {
        let stream = camera.acquire()?;
        debug!("Camera stream acquired");
        Ok(Self {
            camera,
            stream: Some(stream),
        })
    }

    /// Capture a frame from the held stream.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DetectionFailure`] if the stream fails.
    pub fn capture(&mut self) -> Result<Frame> {
        match self.stream.as_mut() {
            Some(stream) => stream.capture(),
            None => Err(PipelineError::DetectionFailure(
                "camera stream already released".to_string(),
            )),
        }
    }
}

impl Drop for SensorLease<'_> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.camera.release(stream);
            debug!("Camera stream released");
        }
    }
}

/// Camera used when the platform has no capture backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

impl Camera for UnavailableCamera {
    fn acquire(&mut self) -> Result<Box<dyn FrameStream>> {
        Err(PipelineError::SensorUnavailable(
            "no camera backend available".to_string(),
        ))
    }

    fn release(&mut self, _stream: Box<dyn FrameStream>) {}
}

/// Detector without a model. Loading fails, every frame fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDetector;

impl EmotionDetector for NullDetector {
    fn load_model(&mut self) -> Result<()> {
        Err(PipelineError::DetectionFailure(
            "no emotion model bundled".to_string(),
        ))
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Option<ScoreMap>> {
        Err(PipelineError::DetectionFailure(
            "no emotion model loaded".to_string(),
        ))
    }
}

/// Camera that replays a JSON-lines score recording.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    path: PathBuf,
}

impl ReplayCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Camera for ReplayCamera {
    fn acquire(&mut self) -> Result<Box<dyn FrameStream>> {
        let file = File::open(&self.path).map_err(|e| {
            PipelineError::SensorUnavailable(format!(
                "cannot open replay `{}`: {e}",
                self.path.display()
            ))
        })?;
        info!("Replaying recorded scores from {}", self.path.display());
        Ok(Box::new(ReplayStream {
            lines: BufReader::new(file).lines(),
            sequence: 0,
        }))
    }

    fn release(&mut self, stream: Box<dyn FrameStream>) {
        drop(stream);
    }
}

struct ReplayStream {
    lines: Lines<BufReader<File>>,
    sequence: u64,
}

impl FrameStream for ReplayStream {
    fn capture(&mut self) -> Result<Frame> {
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    return Err(PipelineError::DetectionFailure(format!(
                        "replay read failed: {e}"
                    )))
                }
                None => {
                    return Err(PipelineError::DetectionFailure(
                        "replay exhausted".to_string(),
                    ))
                }
            };
            // blank lines are padding
            if line.trim().is_empty() {
                continue;
            }
            self.sequence += 1;
            return Ok(Frame {
                sequence: self.sequence,
                data: line.into_bytes(),
            });
        }
    }
}

/// Detector that decodes frames produced by [`ReplayCamera`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayDetector;

impl EmotionDetector for ReplayDetector {
    fn load_model(&mut self) -> Result<()> {
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<ScoreMap>> {
        let scores: ScoreMap = serde_json::from_slice(&frame.data).map_err(|e| {
            PipelineError::DetectionFailure(format!(
                "frame {} is not a score object: {e}",
                frame.sequence
            ))
        })?;
        Ok((!scores.is_empty()).then_some(scores))
    }
}
