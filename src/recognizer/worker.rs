use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::queue::{Control, FrameJob, RecognitionQueue, WorkItem};
use crate::config::RecognitionSettings;
use crate::error::ErrorKind;
use crate::landmarks::LandmarkFrame;
use crate::ml::{KnnClassifier, Prediction};
use crate::stabilizer::{Stabilizer, StabilizerEvent};
use crate::training::FrameRecorder;

/// Result for one submitted frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    Success {
        seq: u64,
        prediction: Prediction,
        event: StabilizerEvent,
    },
    Error {
        seq: u64,
        kind: ErrorKind,
        message: String,
    },
}

impl RecognitionOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Success { seq, .. } | Self::Error { seq, .. } => *seq,
        }
    }
}

/// Owner-side handle to the recognition thread.
///
/// Dropping the handle shuts the worker down and waits for it.
pub struct RecognizerHandle {
    queue: Arc<RecognitionQueue>,
    thread: Option<JoinHandle<()>>,
}

impl RecognizerHandle {
    /// Submit a frame, replacing any frame the worker has not started yet.
    pub fn submit_frame(&self, seq: u64, frame: LandmarkFrame) {
        if let Some(superseded) = self.queue.submit_frame(FrameJob { seq, frame }) {
            debug!("Frame {superseded} superseded by {seq}");
        }
    }

    /// Swap the worker's reference set. Applied before the next frame.
    pub fn replace_classifier(&self, classifier: KnnClassifier) {
        self.queue
            .push_control(Control::ReplaceClassifier(Box::new(classifier)));
    }

    pub fn reset_stabilizer(&self) {
        self.queue.push_control(Control::ResetStabilizer);
    }

    /// Append every frame the worker recognizes to `recorder` while it is active.
    pub fn attach_recorder(&self, recorder: FrameRecorder) {
        self.queue.push_control(Control::AttachRecorder(recorder));
    }

    pub fn detach_recorder(&self) {
        self.queue.push_control(Control::DetachRecorder);
    }

    /// Stop the worker after it finishes the frame in progress and any queued
    /// controls.
    pub fn shutdown(&mut self) {
        self.queue.shutdown();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Recognition worker panicked");
            }
        }
    }
}

impl Drop for RecognizerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the recognition worker that owns `classifier`.
///
/// Every mutation of the reference set goes through the returned handle, so it
/// never races a prediction.
pub fn spawn_recognizer(
    classifier: KnnClassifier,
    settings: &RecognitionSettings,
) -> std::io::Result<(RecognizerHandle, Receiver<RecognitionOutcome>)> {
    let queue = Arc::new(RecognitionQueue::new());
    let (result_tx, result_rx) = mpsc::channel::<RecognitionOutcome>();
    let mut worker = Worker {
        classifier,
        stabilizer: Stabilizer::new(settings.confidence_threshold),
        k: settings.k,
        recorder: None,
    };
    let worker_queue = Arc::clone(&queue);
    let thread = thread::Builder::new()
        .name("handsign-recognizer".to_string())
        .spawn(move || worker.run(&worker_queue, &result_tx))?;
    Ok((
        RecognizerHandle {
            queue,
            thread: Some(thread),
        },
        result_rx,
    ))
}

struct Worker {
    classifier: KnnClassifier,
    stabilizer: Stabilizer,
    k: usize,
    recorder: Option<FrameRecorder>,
}

impl Worker {
    fn run(&mut self, queue: &RecognitionQueue, results: &Sender<RecognitionOutcome>) {
        info!(
            "Recognition worker started with {} reference samples",
            self.classifier.len()
        );
        loop {
            match queue.take_blocking() {
                WorkItem::Control(control) => self.apply(control),
                WorkItem::Frame(job) => {
                    let outcome = self.process(job);
                    if results.send(outcome).is_err() {
                        debug!("Result receiver dropped; stopping recognition worker");
                        break;
                    }
                }
                WorkItem::Shutdown => break,
            }
        }
        info!("Recognition worker stopped");
    }

    fn apply(&mut self, control: Control) {
        match control {
            Control::ReplaceClassifier(classifier) => {
                info!(
                    "Recognizer reference set replaced ({} samples)",
                    classifier.len()
                );
                self.classifier = *classifier;
                self.stabilizer.reset();
            }
            Control::ResetStabilizer => self.stabilizer.reset(),
            Control::AttachRecorder(recorder) => self.recorder = Some(recorder),
            Control::DetachRecorder => self.recorder = None,
        }
    }

    fn process(&mut self, job: FrameJob) -> RecognitionOutcome {
        let FrameJob { seq, frame } = job;
        if let Err(message) = check_frame(&frame) {
            return RecognitionOutcome::Error {
                seq,
                kind: ErrorKind::Validation,
                message,
            };
        }
        let prediction = self.classifier.predict_frame(&frame, self.k);
        let event = self.stabilizer.observe_prediction(&prediction);
        if let Some(recorder) = &self.recorder {
            if recorder.append_frame(frame).is_none() {
                debug!("Recording finished; detaching recorder");
                self.recorder = None;
            }
        }
        RecognitionOutcome::Success {
            seq,
            prediction,
            event,
        }
    }
}

fn check_frame(frame: &LandmarkFrame) -> Result<(), String> {
    if frame.is_empty() {
        return Err("frame has no landmarks".to_string());
    }
    let finite = frame
        .landmarks()
        .iter()
        .all(|point| point.iter().all(|value| value.is_finite()));
    if !finite {
        return Err("frame has non-finite coordinates".to_string());
    }
    Ok(())
}
