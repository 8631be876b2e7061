//! Gesture classification: the nearest-neighbor classifier plus the metrics and
//! hold-out evaluation used to judge a trained reference set.

pub mod evaluate;
pub mod knn;
pub mod metrics;

pub use knn::{
    DEFAULT_K, DISTANCE_EPSILON, KnnClassifier, NO_GESTURE_LABEL, Prediction, TrainingSample,
};
pub use evaluate::{EvaluationReport, evaluate_holdout, evaluate_sets};
pub use metrics::{ClassMetrics, ConfusionMatrix};
