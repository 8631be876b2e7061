//! Distance-weighted k-nearest-neighbor classifier over normalized landmark features.
//!
//! Prediction is a linear scan over the whole reference set. That is fine for the
//! few hundred samples a user records on-device; a warning is logged once the set
//! grows past the configured soft limit.

use std::collections::BTreeMap;
use std::path::Path;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::features::{FeatureExtractor, FeatureLayout, FeatureVector};
use crate::labels::{LabelError, validate_label};
use crate::landmarks::LandmarkFrame;
use crate::model_file::{self, ModelFileError};

/// Label reported when the reference set is empty.
pub const NO_GESTURE_LABEL: &str = "none";
/// Keeps the farthest neighbor's weight finite when all distances are zero.
pub const DISTANCE_EPSILON: f32 = 1e-4;
/// Neighbors consulted by live recognition unless configured otherwise.
pub const DEFAULT_K: usize = 3;

/// One labeled feature vector in the reference set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub label: String,
}

impl TrainingSample {
    pub fn new(features: FeatureVector, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }
}

/// Predicted label with its normalized vote share in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    /// Sentinel returned when there is nothing to compare against.
    pub fn none() -> Self {
        Self {
            label: NO_GESTURE_LABEL.to_string(),
            confidence: 0.0,
        }
    }
}

struct Neighbor<'a> {
    distance: f32,
    label: &'a str,
}

/// In-memory reference set and KNN predictor.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    extractor: FeatureExtractor,
    samples: Vec<TrainingSample>,
    soft_limit: Option<usize>,
}

impl KnnClassifier {
    /// Create an empty classifier for `layout`.
    pub fn new(layout: FeatureLayout) -> Self {
        Self {
            extractor: FeatureExtractor::new(layout),
            samples: Vec::new(),
            soft_limit: None,
        }
    }

    /// Create a classifier over already-extracted samples, keeping their order.
    pub fn from_samples(layout: FeatureLayout, samples: Vec<TrainingSample>) -> Self {
        Self {
            samples,
            ..Self::new(layout)
        }
    }

    /// Log a warning when the reference set grows past `limit` samples.
    pub fn with_soft_limit(mut self, limit: usize) -> Self {
        self.soft_limit = Some(limit);
        self
    }

    pub fn layout(&self) -> FeatureLayout {
        self.extractor.layout()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for sample in &self.samples {
            if !labels.iter().any(|label| label == &sample.label) {
                labels.push(sample.label.clone());
            }
        }
        labels
    }

    /// Number of samples per label.
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Extract every frame and append it under `label`. Returns the number of
    /// samples added.
    pub fn add_training_data(
        &mut self,
        label: &str,
        frames: &[LandmarkFrame],
    ) -> Result<usize, LabelError> {
        validate_label(label)?;
        let before = self.samples.len();
        self.samples.reserve(frames.len());
        for frame in frames {
            self.samples
                .push(TrainingSample::new(self.extractor.extract(frame), label));
        }
        let added = self.samples.len() - before;
        info!(
            "Added {added} samples for '{label}'; reference set now holds {}",
            self.samples.len()
        );
        if let Some(limit) = self.soft_limit {
            if before <= limit && self.samples.len() > limit {
                warn!(
                    "Reference set has {} samples (soft limit {limit}); predictions scan every sample",
                    self.samples.len()
                );
            }
        }
        Ok(added)
    }

    /// Fitting step kept for lifecycle symmetry; KNN has nothing to fit.
    pub fn train(&self) {
        debug!("KNN train requested with {} samples", self.samples.len());
    }

    /// Predict a label for a feature vector using the `k` nearest samples.
    ///
    /// Returns [`Prediction::none`] when the reference set is empty. `k` larger
    /// than the reference set behaves like `k == len`; `k == 0` is treated as 1.
    /// Equal vote totals go to the label that appears first among the sorted
    /// neighbors.
    pub fn predict(&self, query: &[f32], k: usize) -> Prediction {
        if self.samples.is_empty() {
            return Prediction::none();
        }
        let neighbors = self.nearest(query, k.max(1));
        let max_distance = neighbors
            .iter()
            .map(|neighbor| neighbor.distance)
            .fold(f32::NEG_INFINITY, f32::max);

        let mut votes: Vec<(&str, f32)> = Vec::with_capacity(neighbors.len());
        for neighbor in &neighbors {
            let weight = 1.0 - neighbor.distance / (max_distance + DISTANCE_EPSILON);
            match votes.iter_mut().find(|(label, _)| *label == neighbor.label) {
                Some((_, total)) => *total += weight,
                None => votes.push((neighbor.label, weight)),
            }
        }

        let mut winner = votes[0];
        for vote in &votes[1..] {
            if vote.1 > winner.1 {
                winner = *vote;
            }
        }
        let total: f32 = votes.iter().map(|(_, weight)| weight).sum();
        let confidence = if total > 0.0 { winner.1 / total } else { 0.0 };
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        debug!(
            "Prediction: {} (confidence {:.3}) from {} neighbors",
            winner.0,
            confidence,
            neighbors.len()
        );
        Prediction {
            label: winner.0.to_string(),
            confidence,
        }
    }

    /// Extract `frame` and predict it.
    pub fn predict_frame(&self, frame: &LandmarkFrame, k: usize) -> Prediction {
        self.predict(&self.extractor.extract(frame), k)
    }

    /// Replace the reference set with the contents of a model file.
    ///
    /// On any failure the reference set is left empty.
    pub fn load(&mut self, path: &Path) -> Result<usize, ModelFileError> {
        self.samples.clear();
        let samples = model_file::load(path, self.layout())?;
        self.samples = samples;
        info!(
            "Loaded {} samples ({} gestures) from {}",
            self.samples.len(),
            self.labels().len(),
            path.display()
        );
        Ok(self.samples.len())
    }

    /// Write the reference set to a model file, replacing it.
    pub fn save(&self, path: &Path) -> Result<(), ModelFileError> {
        model_file::save(path, self.layout(), &self.samples)?;
        info!("Saved {} samples to {}", self.samples.len(), path.display());
        Ok(())
    }

    fn nearest(&self, query: &[f32], k: usize) -> Vec<Neighbor<'_>> {
        let mut neighbors: Vec<Neighbor<'_>> = self
            .samples
            .iter()
            .map(|sample| Neighbor {
                distance: squared_distance(query, &sample.features),
                label: sample.label.as_str(),
            })
            .collect();
        neighbors.sort_by_key(|neighbor| OrderedFloat(neighbor.distance));
        neighbors.truncate(k);
        neighbors
    }
}

/// Sum of squared differences over the overlapping prefix of `a` and `b`.
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scalar_classifier(points: &[(f32, &str)]) -> KnnClassifier {
        let samples = points
            .iter()
            .map(|(value, label)| TrainingSample::new(vec![*value], *label))
            .collect();
        KnnClassifier::from_samples(FeatureLayout::new(1, 1), samples)
    }

    #[test]
    fn empty_reference_set_returns_sentinel() {
        let classifier = KnnClassifier::new(FeatureLayout::default());
        let prediction = classifier.predict(&[0.0; 63], DEFAULT_K);
        assert_eq!(prediction, Prediction::none());
        assert_eq!(prediction.label, "none");
    }

    #[test]
    fn unanimous_neighbors_give_full_confidence() {
        let classifier = scalar_classifier(&[(0.0, "a"), (0.1, "a"), (0.2, "a"), (5.0, "b")]);
        let prediction = classifier.predict(&[0.05], 3);
        assert_eq!(prediction.label, "a");
        assert!((prediction.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn closer_neighbors_outweigh_farther_majority() {
        // distances: a=0, b=1, b=1.21 -> the farthest b weighs ~0
        let classifier = scalar_classifier(&[(0.0, "a"), (1.0, "b"), (1.1, "b")]);
        let prediction = classifier.predict(&[0.0], 3);
        assert_eq!(prediction.label, "a");
        let weight_b = 1.0 - 1.0 / (1.21 + DISTANCE_EPSILON);
        let expected = 1.0 / (1.0 + weight_b + (1.0 - 1.21 / (1.21 + DISTANCE_EPSILON)));
        assert!((prediction.confidence - expected).abs() < 1e-4);
    }

    #[test]
    fn tie_goes_to_first_label_in_neighbor_order() {
        let classifier = scalar_classifier(&[(-1.0, "left"), (1.0, "right"), (2.0, "far")]);
        let prediction = classifier.predict(&[0.0], 3);
        assert_eq!(prediction.label, "left");

        let swapped = scalar_classifier(&[(1.0, "right"), (-1.0, "left"), (2.0, "far")]);
        assert_eq!(swapped.predict(&[0.0], 3).label, "right");
    }

    #[test]
    fn k_larger_than_reference_set_saturates() {
        let classifier = scalar_classifier(&[(0.0, "a"), (0.4, "b"), (0.9, "a")]);
        let saturated = classifier.predict(&[0.3], 50);
        let exact = classifier.predict(&[0.3], classifier.len());
        assert_eq!(saturated, exact);
    }

    #[test]
    fn single_neighbor_at_distance_zero() {
        let classifier = scalar_classifier(&[(0.5, "only")]);
        let prediction = classifier.predict(&[0.5], 0);
        assert_eq!(prediction.label, "only");
        assert_eq!(prediction.confidence, 1.0);
    }

    #[test]
    fn mismatched_vector_lengths_compare_overlapping_prefix() {
        let samples = vec![
            TrainingSample::new(vec![0.0, 0.0, 9.0], "long"),
            TrainingSample::new(vec![3.0], "short"),
        ];
        let classifier = KnnClassifier::from_samples(FeatureLayout::new(1, 3), samples);
        let prediction = classifier.predict(&[0.0, 0.0], 1);
        assert_eq!(prediction.label, "long");
        assert_eq!(squared_distance(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn confidence_stays_in_unit_range_for_random_sets() {
        let mut rng = StdRng::seed_from_u64(7);
        let labels = ["a", "b", "c", "d"];
        for _ in 0..50 {
            let count = rng.random_range(1..40);
            let samples = (0..count)
                .map(|_| {
                    let features = (0..6).map(|_| rng.random_range(-1.0..1.0)).collect();
                    TrainingSample::new(features, labels[rng.random_range(0..labels.len())])
                })
                .collect();
            let classifier = KnnClassifier::from_samples(FeatureLayout::new(2, 3), samples);
            let query: Vec<f32> = (0..6).map(|_| rng.random_range(-1.0..1.0)).collect();
            let k = rng.random_range(1..10);
            let prediction = classifier.predict(&query, k);
            assert!((0.0..=1.0).contains(&prediction.confidence));
            assert!(classifier.labels().contains(&prediction.label));
        }
    }

    #[test]
    fn add_training_data_extracts_frames() {
        let mut classifier = KnnClassifier::new(FeatureLayout::default());
        let frames = vec![LandmarkFrame::new(vec![[0.2, 0.3, 0.0]; 21]); 4];
        let added = classifier.add_training_data("fist", &frames).unwrap();
        assert_eq!(added, 4);
        assert_eq!(classifier.len(), 4);
        assert!(classifier.samples().iter().all(|s| s.features.len() == 63));
        assert_eq!(classifier.label_counts().get("fist"), Some(&4));
    }

    #[test]
    fn add_training_data_rejects_blank_label() {
        let mut classifier = KnnClassifier::new(FeatureLayout::default());
        let err = classifier
            .add_training_data("  ", &[LandmarkFrame::default()])
            .unwrap_err();
        assert_eq!(err, LabelError::Blank);
        assert!(classifier.is_empty());
    }

    #[test]
    fn labels_keep_first_seen_order() {
        let classifier = scalar_classifier(&[(0.0, "b"), (1.0, "a"), (2.0, "b"), (3.0, "c")]);
        assert_eq!(classifier.labels(), vec!["b", "a", "c"]);
    }
}
