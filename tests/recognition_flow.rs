mod support;

use std::time::Duration;

use handsign::config::RecognitionSettings;
use handsign::dataset::GestureLibrary;
use handsign::features::FeatureLayout;
use handsign::recognizer::{RecognitionOutcome, spawn_recognizer};
use handsign::stabilizer::StabilizerEvent;
use handsign::training::TrainingSession;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use support::{falling, pose, poses, rising};

#[test]
fn recorded_gesture_is_confirmed_by_the_worker() {
    let dir = tempdir().unwrap();
    let library = GestureLibrary::open(dir.path()).unwrap();
    let layout = FeatureLayout::default();
    let mut rng = StdRng::seed_from_u64(11);
    let mut classifier = library.load_classifier(layout).classifier;

    for (label, shape) in [("up", rising as fn(f32) -> f32), ("down", falling)] {
        let session = TrainingSession::start_recording(label).unwrap();
        let recorder = session.recorder();
        for frame in poses(&mut rng, shape, 30) {
            recorder.append_frame(frame);
        }
        let report = session.commit(&library, &mut classifier, 3).unwrap();
        assert_eq!(report.self_check.label, label);
    }
    assert_eq!(classifier.len(), 60);

    let reloaded = library.load_classifier(layout);
    assert!(reloaded.error.is_none());
    assert_eq!(reloaded.classifier.samples(), classifier.samples());

    let (handle, outcomes) =
        spawn_recognizer(reloaded.classifier, &RecognitionSettings::default()).unwrap();
    let mut events = Vec::new();
    for seq in 0..3 {
        handle.submit_frame(seq, pose(&mut rng, falling));
        match outcomes.recv_timeout(Duration::from_secs(5)).unwrap() {
            RecognitionOutcome::Success {
                prediction, event, ..
            } => {
                assert_eq!(prediction.label, "down");
                assert!(prediction.confidence >= 0.85);
                events.push(event);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(
        events,
        vec![
            StabilizerEvent::PossibleGesture {
                label: "down".into()
            },
            StabilizerEvent::Confirmed {
                label: "down".into(),
                previous: None
            },
            StabilizerEvent::None,
        ]
    );
}

#[test]
fn recording_through_the_worker_feeds_the_session() {
    let dir = tempdir().unwrap();
    let library = GestureLibrary::open(dir.path()).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let mut classifier = library.load_classifier(FeatureLayout::default()).classifier;

    let (handle, outcomes) =
        spawn_recognizer(classifier.clone(), &RecognitionSettings::default()).unwrap();
    let session = TrainingSession::start_recording("wave").unwrap();
    handle.attach_recorder(session.recorder());
    for seq in 0..10 {
        handle.submit_frame(seq, pose(&mut rng, rising));
        outcomes.recv_timeout(Duration::from_secs(5)).unwrap();
    }
    handle.detach_recorder();

    let report = session.commit(&library, &mut classifier, 3).unwrap();
    assert_eq!(report.samples_added, 10);
    handle.replace_classifier(classifier);
    handle.submit_frame(10, pose(&mut rng, rising));
    match outcomes.recv_timeout(Duration::from_secs(5)).unwrap() {
        RecognitionOutcome::Success { prediction, .. } => assert_eq!(prediction.label, "wave"),
        other => panic!("unexpected outcome {other:?}"),
    }
}
