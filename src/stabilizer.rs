//! Debounce for the live prediction stream.
//!
//! A gesture is confirmed only after two consecutive confident predictions agree
//! on it. While a gesture is confirmed, a different confident label must also be
//! seen twice in a row (not necessarily adjacent: low-confidence frames in
//! between keep the candidate) before it replaces the confirmed one.

use serde::Serialize;
use tracing::{debug, info};

use crate::ml::Prediction;

/// Confidence a prediction needs to count towards a confirmation.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.85;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabilizerState {
    NoFix,
    Fixed(String),
}

/// What the caller should surface after one observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StabilizerEvent {
    None,
    /// First confident sighting of a label while nothing is confirmed.
    PossibleGesture { label: String },
    /// `label` is now the confirmed gesture.
    Confirmed {
        label: String,
        previous: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Stabilizer {
    threshold: f32,
    state: StabilizerState,
    candidate: Option<String>,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl Stabilizer {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            state: StabilizerState::NoFix,
            candidate: None,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn state(&self) -> &StabilizerState {
        &self.state
    }

    pub fn fixed_label(&self) -> Option<&str> {
        match &self.state {
            StabilizerState::Fixed(label) => Some(label),
            StabilizerState::NoFix => None,
        }
    }

    pub fn candidate(&self) -> Option<&str> {
        self.candidate.as_deref()
    }

    pub fn observe_prediction(&mut self, prediction: &Prediction) -> StabilizerEvent {
        self.observe(&prediction.label, prediction.confidence)
    }

    /// Feed one per-frame prediction.
    pub fn observe(&mut self, label: &str, confidence: f32) -> StabilizerEvent {
        if confidence.is_nan() || confidence < self.threshold {
            if self.state == StabilizerState::NoFix {
                self.candidate = None;
            }
            return StabilizerEvent::None;
        }

        if self.fixed_label() == Some(label) {
            return StabilizerEvent::None;
        }

        if self.candidate.as_deref() == Some(label) {
            let previous = match std::mem::replace(
                &mut self.state,
                StabilizerState::Fixed(label.to_string()),
            ) {
                StabilizerState::Fixed(previous) => Some(previous),
                StabilizerState::NoFix => None,
            };
            self.candidate = None;
            info!("Gesture confirmed: {label} (previous: {previous:?})");
            return StabilizerEvent::Confirmed {
                label: label.to_string(),
                previous,
            };
        }

        self.candidate = Some(label.to_string());
        debug!("Gesture candidate: {label} ({confidence:.3})");
        match self.state {
            StabilizerState::NoFix => StabilizerEvent::PossibleGesture {
                label: label.to_string(),
            },
            StabilizerState::Fixed(_) => StabilizerEvent::None,
        }
    }

    pub fn reset(&mut self) {
        self.state = StabilizerState::NoFix;
        self.candidate = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_confident_frames_confirm_once() {
        let mut stabilizer = Stabilizer::default();
        assert_eq!(
            stabilizer.observe("A", 0.9),
            StabilizerEvent::PossibleGesture { label: "A".into() }
        );
        assert_eq!(stabilizer.candidate(), Some("A"));
        assert_eq!(
            stabilizer.observe("A", 0.9),
            StabilizerEvent::Confirmed {
                label: "A".into(),
                previous: None
            }
        );
        assert_eq!(stabilizer.state(), &StabilizerState::Fixed("A".into()));
        assert_eq!(stabilizer.candidate(), None);
        assert_eq!(stabilizer.observe("A", 0.9), StabilizerEvent::None);
    }

    #[test]
    fn switch_needs_two_confident_frames() {
        let mut stabilizer = Stabilizer::default();
        stabilizer.observe("A", 0.9);
        stabilizer.observe("A", 0.9);

        assert_eq!(stabilizer.observe("B", 0.9), StabilizerEvent::None);
        assert_eq!(stabilizer.fixed_label(), Some("A"));
        assert_eq!(stabilizer.candidate(), Some("B"));

        assert_eq!(
            stabilizer.observe("B", 0.9),
            StabilizerEvent::Confirmed {
                label: "B".into(),
                previous: Some("A".into())
            }
        );
        assert_eq!(stabilizer.fixed_label(), Some("B"));
    }

    #[test]
    fn repeating_fixed_label_keeps_pending_candidate() {
        let mut stabilizer = Stabilizer::default();
        stabilizer.observe("A", 0.9);
        stabilizer.observe("A", 0.9);
        stabilizer.observe("B", 0.9);

        assert_eq!(stabilizer.observe("A", 0.9), StabilizerEvent::None);
        assert_eq!(stabilizer.fixed_label(), Some("A"));
        assert_eq!(stabilizer.candidate(), Some("B"));

        assert_eq!(
            stabilizer.observe("B", 0.9),
            StabilizerEvent::Confirmed {
                label: "B".into(),
                previous: Some("A".into())
            }
        );
        assert_eq!(stabilizer.candidate(), None);
    }

    #[test]
    fn low_confidence_clears_candidate_only_without_fix() {
        let mut stabilizer = Stabilizer::default();
        stabilizer.observe("A", 0.9);
        assert_eq!(stabilizer.observe("A", 0.5), StabilizerEvent::None);
        assert_eq!(stabilizer.candidate(), None);
        assert!(matches!(
            stabilizer.observe("A", 0.9),
            StabilizerEvent::PossibleGesture { .. }
        ));

        stabilizer.observe("A", 0.9);
        stabilizer.observe("B", 0.95);
        assert_eq!(stabilizer.observe("B", 0.2), StabilizerEvent::None);
        assert_eq!(stabilizer.candidate(), Some("B"));
        assert_eq!(stabilizer.fixed_label(), Some("A"));
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut stabilizer = Stabilizer::new(0.85);
        stabilizer.observe("A", 0.85);
        assert!(matches!(
            stabilizer.observe("A", 0.85),
            StabilizerEvent::Confirmed { .. }
        ));
    }

    #[test]
    fn nan_confidence_is_ignored() {
        let mut stabilizer = Stabilizer::default();
        stabilizer.observe("A", 0.9);
        assert_eq!(stabilizer.observe("A", f32::NAN), StabilizerEvent::None);
        assert_eq!(stabilizer.candidate(), None);
    }

    #[test]
    fn reset_returns_to_no_fix() {
        let mut stabilizer = Stabilizer::default();
        stabilizer.observe("A", 0.9);
        stabilizer.observe("A", 0.9);
        stabilizer.observe("B", 0.9);
        stabilizer.reset();
        assert_eq!(stabilizer.state(), &StabilizerState::NoFix);
        assert_eq!(stabilizer.candidate(), None);
    }

    #[test]
    fn alternating_labels_never_confirm() {
        let mut stabilizer = Stabilizer::default();
        for label in ["A", "B", "A", "B", "A"] {
            assert!(!matches!(
                stabilizer.observe(label, 0.99),
                StabilizerEvent::Confirmed { .. }
            ));
        }
        assert_eq!(stabilizer.fixed_label(), None);
    }
}
