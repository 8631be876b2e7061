//! Raw hand landmark frames as delivered by the hand tracker.

use serde::{Deserialize, Deserializer, Serialize};

/// Number of landmarks the hand tracker reports for one hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// One tracked point: `[x, y, z]`.
pub type Landmark = [f32; 3];

/// One hand pose at one instant.
///
/// Serializes as a bare array of `[x, y, z]` triples. Frames with fewer or more
/// points than the configured layout are accepted; feature extraction pads or
/// truncates them. On read, coordinates past the third are ignored and points
/// with fewer than three are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

impl<'de> Deserialize<'de> for LandmarkFrame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<Vec<f32>>::deserialize(deserializer)?;
        let landmarks = points
            .into_iter()
            .filter_map(|point| match point.as_slice() {
                &[x, y, z, ..] => Some([x, y, z]),
                _ => None,
            })
            .collect();
        Ok(Self { landmarks })
    }
}

impl From<Vec<Landmark>> for LandmarkFrame {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self::new(landmarks)
    }
}
