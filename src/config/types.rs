use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::{
    clamp_neighbors, clamp_unit, default_confidence_threshold, default_coords_per_landmark,
    default_evaluation_k, default_holdout_fraction, default_k, default_landmark_count,
    default_reference_soft_limit, default_target_frame_count,
};
use crate::app_dirs::{self, AppDirError};
use crate::features::FeatureLayout;

/// All persisted recognizer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub recognition: RecognitionSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl Settings {
    /// Clamp every value into its supported range.
    pub fn normalized(mut self) -> Self {
        let recognition = &mut self.recognition;
        recognition.confidence_threshold = clamp_unit(recognition.confidence_threshold);
        recognition.k = clamp_neighbors(recognition.k);
        recognition.evaluation_k = clamp_neighbors(recognition.evaluation_k);
        recognition.reference_soft_limit = recognition.reference_soft_limit.max(1);
        self.layout.landmark_count = self.layout.landmark_count.max(1);
        self.layout.coords_per_landmark = self.layout.coords_per_landmark.max(1);
        self.training.target_frame_count = self.training.target_frame_count.max(1);
        self.evaluation.holdout_fraction = clamp_unit(self.evaluation.holdout_fraction);
        self
    }
}

/// Live recognition preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    /// Minimum confidence for a prediction to count towards a confirmed gesture.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Neighbors consulted for live predictions.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Neighbors consulted by offline evaluation.
    #[serde(default = "default_evaluation_k")]
    pub evaluation_k: usize,
    /// Reference-set size above which a linear-scan warning is logged.
    #[serde(default = "default_reference_soft_limit")]
    pub reference_soft_limit: usize,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            k: default_k(),
            evaluation_k: default_evaluation_k(),
            reference_soft_limit: default_reference_soft_limit(),
        }
    }
}

/// Landmark layout expected from the hand tracker and stored in model files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default = "default_landmark_count")]
    pub landmark_count: usize,
    #[serde(default = "default_coords_per_landmark")]
    pub coords_per_landmark: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            landmark_count: default_landmark_count(),
            coords_per_landmark: default_coords_per_landmark(),
        }
    }
}

impl LayoutSettings {
    pub fn feature_layout(&self) -> FeatureLayout {
        FeatureLayout::new(self.landmark_count, self.coords_per_landmark)
    }
}

/// Recording preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Frames the capture loop collects before stopping a recording.
    #[serde(default = "default_target_frame_count")]
    pub target_frame_count: usize,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            target_frame_count: default_target_frame_count(),
        }
    }
}

/// Hold-out evaluation preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Share of each gesture's frames used as test samples.
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f32,
    /// Fixed shuffle seed; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            holdout_fraction: default_holdout_fraction(),
            seed: None,
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Optional gesture library root; defaults to `library/` in the app root.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageSettings {
    /// Resolve the gesture library root directory.
    pub fn library_root(&self) -> Result<PathBuf, AppDirError> {
        match &self.data_dir {
            Some(path) => Ok(path.clone()),
            None => app_dirs::library_dir(),
        }
    }
}
