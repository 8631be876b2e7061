//! Landmark frame to feature vector conversion.
//!
//! The layout is `[lm0.x, lm0.y, lm0.z, lm1.x, ...]`. The x and y channels are
//! min-max normalized per frame; z passes through. This is not a rigid-body
//! normalization (no rotation, no depth scaling) and trained models depend on it
//! staying exactly this way.

use serde::{Deserialize, Serialize};

use crate::landmarks::{HAND_LANDMARK_COUNT, LandmarkFrame};

/// Added to each channel's range so flat channels do not divide by zero.
pub const NORMALIZATION_EPSILON: f32 = 1e-4;
/// Coordinates stored per landmark in the default layout.
pub const DEFAULT_COORDS_PER_LANDMARK: usize = 3;

/// Normalized feature vector of `landmark_count * coords_per_landmark` values.
pub type FeatureVector = Vec<f32>;

/// Shape of a feature vector, also stored in model file headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub landmark_count: usize,
    pub coords_per_landmark: usize,
}

impl FeatureLayout {
    pub const fn new(landmark_count: usize, coords_per_landmark: usize) -> Self {
        Self {
            landmark_count,
            coords_per_landmark,
        }
    }

    /// Number of `f32` values in one feature vector.
    pub const fn feature_len(&self) -> usize {
        self.landmark_count * self.coords_per_landmark
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::new(HAND_LANDMARK_COUNT, DEFAULT_COORDS_PER_LANDMARK)
    }
}

/// Stateless converter from landmark frames to feature vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureExtractor {
    layout: FeatureLayout,
}

impl FeatureExtractor {
    pub fn new(layout: FeatureLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    /// Flatten and normalize one frame.
    ///
    /// Missing landmarks and missing coordinates are zero-filled before
    /// normalization, so they take part in the min/max search; extra landmarks
    /// are ignored.
    pub fn extract(&self, frame: &LandmarkFrame) -> FeatureVector {
        let coords = self.layout.coords_per_landmark;
        let mut features = vec![0.0f32; self.layout.feature_len()];
        for (idx, landmark) in frame
            .landmarks()
            .iter()
            .take(self.layout.landmark_count)
            .enumerate()
        {
            let base = idx * coords;
            for (offset, value) in landmark.iter().take(coords).enumerate() {
                features[base + offset] = *value;
            }
        }
        // x and y only; depth is left as reported.
        for channel in 0..coords.min(2) {
            normalize_channel(&mut features, coords, channel);
        }
        features
    }

    /// Extract every frame in order.
    pub fn extract_all<'a>(
        &self,
        frames: impl IntoIterator<Item = &'a LandmarkFrame>,
    ) -> Vec<FeatureVector> {
        frames.into_iter().map(|frame| self.extract(frame)).collect()
    }
}

fn normalize_channel(features: &mut [f32], stride: usize, channel: usize) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for value in features.iter().skip(channel).step_by(stride) {
        min = min.min(*value);
        max = max.max(*value);
    }
    if !min.is_finite() || !max.is_finite() {
        return;
    }
    let range = max - min + NORMALIZATION_EPSILON;
    for value in features.iter_mut().skip(channel).step_by(stride) {
        *value = (*value - min) / range;
    }
}
