mod support;

use handsign::dataset::GestureLibrary;
use handsign::features::FeatureLayout;
use handsign::ml::NO_GESTURE_LABEL;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use support::{arch, falling, pose, poses, rising, valley};

const SHAPES: [(&str, fn(f32) -> f32); 4] = [
    ("up", rising),
    ("down", falling),
    ("arch", arch),
    ("valley", valley),
];

#[test]
fn deleted_gesture_is_never_predicted() {
    for seed in 0..4u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let dir = tempdir().unwrap();
        let library = GestureLibrary::open(dir.path()).unwrap();
        for (label, shape) in SHAPES {
            library
                .write_frames(label, &poses(&mut rng, shape, 12))
                .unwrap();
        }
        library
            .rebuild_classifier(FeatureLayout::default(), None)
            .unwrap()
            .save(&library.model_path())
            .unwrap();

        let (deleted, shape) = SHAPES[seed as usize % SHAPES.len()];
        let held_out: Vec<_> = (0..8).map(|_| pose(&mut rng, shape)).collect();

        let rebuilt = library
            .delete_gesture(deleted, FeatureLayout::default())
            .unwrap();
        assert!(!rebuilt.labels().iter().any(|label| label == deleted));

        let reloaded = library.load_classifier(FeatureLayout::default());
        assert_eq!(reloaded.classifier.samples(), rebuilt.samples());
        for frame in &held_out {
            let prediction = reloaded.classifier.predict_frame(frame, 3);
            assert_ne!(prediction.label, deleted);
            assert_ne!(prediction.label, NO_GESTURE_LABEL);
        }
    }
}

#[test]
fn deleting_every_gesture_leaves_no_model() {
    let mut rng = StdRng::seed_from_u64(9);
    let dir = tempdir().unwrap();
    let library = GestureLibrary::open(dir.path()).unwrap();
    library.write_frames("up", &poses(&mut rng, rising, 4)).unwrap();
    library
        .write_frames("down", &poses(&mut rng, falling, 4))
        .unwrap();
    library
        .rebuild_classifier(FeatureLayout::default(), None)
        .unwrap()
        .save(&library.model_path())
        .unwrap();

    library
        .delete_gesture("up", FeatureLayout::default())
        .unwrap();
    assert!(library.has_model());
    let err = library
        .delete_gesture("down", FeatureLayout::default())
        .unwrap_err();
    assert_eq!(err.kind(), handsign::error::ErrorKind::EmptyDataset);
    assert!(!library.has_model());

    let loaded = library.load_classifier(FeatureLayout::default());
    assert!(loaded.classifier.is_empty());
    assert_eq!(loaded.classifier.predict(&[0.0; 63], 3).label, NO_GESTURE_LABEL);
}
