//! On-device hand gesture recognition built on a small, user-trained KNN classifier.
/// Application directory helpers.
pub mod app_dirs;
/// Recognizer settings persisted as TOML.
pub mod config;
/// Gesture library on disk: sample files, model file, seeding and export.
pub mod dataset;
/// Error taxonomy shared by the recognition core.
pub mod error;
/// Landmark frame to feature vector conversion.
pub mod features;
mod fs_ops;
/// Gesture label validation.
pub mod labels;
/// Raw hand landmark frames.
pub mod landmarks;
/// Logging setup for binaries.
pub mod logging;
/// Nearest-neighbor classifier, metrics and evaluation.
pub mod ml;
/// Binary reference-set model file.
pub mod model_file;
/// Background recognition worker.
pub mod recognizer;
/// Debounce state machine for confirmed gestures.
pub mod stabilizer;
/// Recording sessions that feed new gestures into the model.
pub mod training;
