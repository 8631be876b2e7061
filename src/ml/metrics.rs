//! Classification metrics for hold-out evaluation.

use serde::{Deserialize, Serialize};

/// Confusion matrix over a fixed list of class labels.
///
/// Predictions outside the class list are tallied per true class as misses.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    counts: Vec<u32>,
    /// Per-truth count of predictions naming an unknown label.
    unknown: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(classes: Vec<String>) -> Self {
        let k = classes.len();
        Self {
            classes,
            counts: vec![0; k * k],
            unknown: vec![0; k],
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_index(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|class| class == label)
    }

    /// Record one prediction. Returns false when `truth` is not a known class.
    pub fn add(&mut self, truth: &str, predicted: &str) -> bool {
        let Some(truth_idx) = self.class_index(truth) else {
            return false;
        };
        match self.class_index(predicted) {
            Some(predicted_idx) => {
                let idx = truth_idx * self.classes.len() + predicted_idx;
                self.counts[idx] = self.counts[idx].saturating_add(1);
            }
            None => self.unknown[truth_idx] = self.unknown[truth_idx].saturating_add(1),
        }
        true
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.classes.len() + predicted]
    }

    pub fn unknown(&self, truth: usize) -> u32 {
        self.unknown[truth]
    }

    /// Total number of recorded predictions.
    pub fn total(&self) -> u64 {
        self.counts.iter().chain(&self.unknown).map(|&v| v as u64).sum()
    }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    pub f1: f32,
    /// Number of test samples whose true class is this one.
    pub support: u32,
}

/// Compute per-class precision, recall and F1 in class order.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<ClassMetrics> {
    let k = cm.classes.len();
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f32;
        let mut fp = 0f32;
        let mut fn_ = cm.unknown(class_idx) as f32;
        let mut support = cm.unknown(class_idx);
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f32;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f32;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        stats.push(ClassMetrics {
            label: cm.classes[class_idx].clone(),
            precision,
            recall,
            f1,
            support,
        });
    }
    stats
}

/// Share of predictions that matched their true class.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let correct: u64 = (0..cm.classes.len())
        .map(|idx| cm.get(idx, idx) as u64)
        .sum();
    let total = cm.total();
    if total == 0 {
        0.0
    } else {
        (correct as f32) / (total as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> ConfusionMatrix {
        ConfusionMatrix::new(vec!["a".into(), "b".into()])
    }

    #[test]
    fn perfect_predictions_score_one() {
        let mut cm = matrix();
        assert!(cm.add("a", "a"));
        assert!(cm.add("b", "b"));
        assert_eq!(accuracy(&cm), 1.0);
        for stats in precision_recall_by_class(&cm) {
            assert_eq!(stats.precision, 1.0);
            assert_eq!(stats.recall, 1.0);
            assert_eq!(stats.f1, 1.0);
            assert_eq!(stats.support, 1);
        }
    }

    #[test]
    fn unknown_predictions_count_as_misses() {
        let mut cm = matrix();
        cm.add("a", "a");
        cm.add("a", "none");
        assert_eq!(cm.total(), 2);
        assert_eq!(accuracy(&cm), 0.5);
        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[0].support, 2);
        assert_eq!(stats[0].precision, 1.0);
        assert_eq!(stats[0].recall, 0.5);
        assert!((stats[0].f1 - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(stats[1].support, 0);
        assert_eq!(stats[1].f1, 0.0);
    }

    #[test]
    fn confusions_split_precision_and_recall() {
        let mut cm = matrix();
        cm.add("a", "b");
        cm.add("b", "b");
        cm.add("b", "b");
        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[0].recall, 0.0);
        assert_eq!(stats[0].precision, 0.0);
        assert!((stats[1].precision - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(stats[1].recall, 1.0);
    }

    #[test]
    fn unknown_truth_is_not_recorded() {
        let mut cm = matrix();
        assert!(!cm.add("c", "a"));
        assert_eq!(cm.total(), 0);
        assert_eq!(accuracy(&cm), 0.0);
    }
}
