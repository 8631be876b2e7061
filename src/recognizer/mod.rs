//! Background recognition worker.
//!
//! One thread owns the classifier and the stabilizer. Frames are delivered
//! latest-only: a frame that has not been picked up is replaced by a newer one,
//! while the frame in progress always completes. Outcomes come back over a channel.

mod queue;
mod worker;

pub use worker::{RecognitionOutcome, RecognizerHandle, spawn_recognizer};
