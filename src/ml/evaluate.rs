//! Hold-out evaluation of a trained classifier against the recorded sample files.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};

use super::knn::KnnClassifier;
use super::metrics::{ClassMetrics, ConfusionMatrix, accuracy, precision_recall_by_class};
use crate::dataset::{DatasetError, GestureLibrary};
use crate::landmarks::LandmarkFrame;

/// Accuracy and per-class statistics from one evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub holdout_fraction: f32,
    pub test_samples: usize,
    pub accuracy: f32,
    pub per_class: Vec<ClassMetrics>,
}

/// Evaluate `classifier` on a shuffled share of each gesture's recorded frames.
///
/// Sample files that fail to parse are skipped with a warning.
pub fn evaluate_holdout<R: Rng + ?Sized>(
    classifier: &KnnClassifier,
    library: &GestureLibrary,
    k: usize,
    holdout_fraction: f32,
    rng: &mut R,
) -> Result<EvaluationReport, DatasetError> {
    let mut sets = Vec::new();
    for label in library.labels()? {
        match library.read_frames(&label) {
            Ok(frames) => sets.push((label, frames)),
            Err(err) => warn!("Skipping '{label}' in evaluation: {err}"),
        }
    }
    Ok(evaluate_sets(classifier, sets, k, holdout_fraction, rng))
}

/// Evaluate `classifier` on `(label, frames)` sets. Class order follows `sets`.
pub fn evaluate_sets<R: Rng + ?Sized>(
    classifier: &KnnClassifier,
    sets: Vec<(String, Vec<LandmarkFrame>)>,
    k: usize,
    holdout_fraction: f32,
    rng: &mut R,
) -> EvaluationReport {
    let holdout_fraction = holdout_fraction.clamp(0.0, 1.0);
    let classes = sets.iter().map(|(label, _)| label.clone()).collect();
    let mut matrix = ConfusionMatrix::new(classes);
    let mut test_samples = 0usize;
    for (label, mut frames) in sets {
        frames.shuffle(rng);
        let take = holdout_count(frames.len(), holdout_fraction);
        for frame in &frames[..take] {
            let prediction = classifier.predict_frame(frame, k);
            matrix.add(&label, &prediction.label);
        }
        test_samples += take;
    }
    let report = EvaluationReport {
        k,
        holdout_fraction,
        test_samples,
        accuracy: accuracy(&matrix),
        per_class: precision_recall_by_class(&matrix),
    };
    info!(
        "Evaluated {} samples across {} gestures: accuracy {:.3}",
        report.test_samples,
        report.per_class.len(),
        report.accuracy
    );
    report
}

fn holdout_count(len: usize, fraction: f32) -> usize {
    ((len as f64 * fraction as f64).floor() as usize).min(len)
}
