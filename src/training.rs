//! Recording sessions that turn captured frames into new reference samples.
//!
//! Frames reach the session through a [`FrameRecorder`], a cloneable sending end
//! that can live on the capture or recognition thread. The session owns the
//! receiving end and drains it when the recording stops.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::{DatasetError, GestureLibrary};
use crate::error::ErrorKind;
use crate::labels::{LabelError, validate_label};
use crate::landmarks::LandmarkFrame;
use crate::ml::{KnnClassifier, Prediction};
use crate::model_file::ModelFileError;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("No frames were recorded for {label:?}")]
    NoFrames { label: String },
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Model(#[from] ModelFileError),
}

impl TrainingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoFrames { .. } => ErrorKind::EmptyDataset,
            Self::Label(err) => err.kind(),
            Self::Dataset(err) => err.kind(),
            Self::Model(err) => err.kind(),
        }
    }
}

/// Sending end of a recording buffer.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    sender: Sender<LandmarkFrame>,
    /// Held across the check and the send so a stop cannot slip between them.
    active: Arc<Mutex<bool>>,
    appended: Arc<AtomicUsize>,
}

impl FrameRecorder {
    /// Append a frame while the recording is active.
    ///
    /// Returns the number of frames appended so far, or `None` once the recording
    /// has stopped (the frame is dropped).
    pub fn append_frame(&self, frame: LandmarkFrame) -> Option<usize> {
        let active = self.lock_active();
        if !*active {
            return None;
        }
        self.sender.send(frame).ok()?;
        Some(self.appended.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_active(&self) -> bool {
        *self.lock_active()
    }

    pub fn frames_appended(&self) -> usize {
        self.appended.load(Ordering::Acquire)
    }

    /// Close the buffer. Every frame acknowledged before this returns is already queued.
    fn deactivate(&self) {
        *self.lock_active() = false;
    }

    fn lock_active(&self) -> MutexGuard<'_, bool> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outcome of [`TrainingSession::commit`].
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub label: String,
    pub samples_added: usize,
    pub reference_size: usize,
    pub sample_file: PathBuf,
    pub model_file: PathBuf,
    /// Prediction for the last recorded frame against the updated classifier.
    pub self_check: Prediction,
}

/// One recording window for a single gesture label.
#[derive(Debug)]
pub struct TrainingSession {
    label: String,
    recorder: FrameRecorder,
    receiver: Receiver<LandmarkFrame>,
    frames: Vec<LandmarkFrame>,
}

impl TrainingSession {
    /// Start recording frames for `label`.
    pub fn start_recording(label: &str) -> Result<Self, TrainingError> {
        let label = validate_label(label)?.to_string();
        let (sender, receiver) = mpsc::channel();
        info!("Recording started for '{label}'");
        Ok(Self {
            label,
            recorder: FrameRecorder {
                sender,
                active: Arc::new(Mutex::new(true)),
                appended: Arc::new(AtomicUsize::new(0)),
            },
            receiver,
            frames: Vec::new(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A handle other threads can append frames through.
    pub fn recorder(&self) -> FrameRecorder {
        self.recorder.clone()
    }

    pub fn append_frame(&self, frame: LandmarkFrame) -> Option<usize> {
        self.recorder.append_frame(frame)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    /// Stop accepting frames and return how many were buffered.
    pub fn stop_recording(&mut self) -> usize {
        self.recorder.deactivate();
        self.drain();
        debug!("Recording stopped for '{}' with {} frames", self.label, self.frames.len());
        self.frames.len()
    }

    /// Frames buffered so far.
    pub fn frame_count(&mut self) -> usize {
        self.drain();
        self.frames.len()
    }

    /// Persist the recording and fold it into `classifier`.
    ///
    /// Writes the gesture's sample file, appends the extracted samples, saves the
    /// model, then predicts the last recorded frame as a self-check. `classifier` is
    /// only updated once the model file has been written.
    pub fn commit(
        mut self,
        library: &GestureLibrary,
        classifier: &mut KnnClassifier,
        k: usize,
    ) -> Result<CommitReport, TrainingError> {
        self.stop_recording();
        let Some(last_frame) = self.frames.last().cloned() else {
            return Err(TrainingError::NoFrames { label: self.label });
        };

        let sample_file = library.write_frames(&self.label, &self.frames)?;
        let mut updated = classifier.clone();
        let samples_added = updated.add_training_data(&self.label, &self.frames)?;
        updated.train();
        let model_file = library.model_path();
        updated.save(&model_file)?;
        *classifier = updated;

        let self_check = classifier.predict_frame(&last_frame, k);
        info!(
            "Committed '{}': {samples_added} samples, self-check {} ({:.3})",
            self.label, self_check.label, self_check.confidence
        );
        Ok(CommitReport {
            label: self.label,
            samples_added,
            reference_size: classifier.len(),
            sample_file,
            model_file,
            self_check,
        })
    }

    /// Drop the recording without touching disk or the classifier.
    pub fn cancel(mut self) {
        let discarded = self.stop_recording();
        info!("Recording for '{}' cancelled ({discarded} frames discarded)", self.label);
    }

    fn drain(&mut self) {
        self.frames.extend(self.receiver.try_iter());
    }
}
