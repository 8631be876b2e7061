use handsign::features::FeatureLayout;
use handsign::ml::{KnnClassifier, TrainingSample};
use handsign::model_file::{self, MODEL_FILE_NAME};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

#[test]
fn random_reference_sets_round_trip() {
    let layout = FeatureLayout::default();
    let labels = ["hola", "gracias", "sí", "por favor"];
    let dir = tempdir().unwrap();
    let path = dir.path().join(MODEL_FILE_NAME);
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let count = rng.random_range(1..60);
        let samples: Vec<TrainingSample> = (0..count)
            .map(|_| {
                let features = (0..layout.feature_len())
                    .map(|_| rng.random_range(-2.0..2.0))
                    .collect();
                TrainingSample::new(features, labels[rng.random_range(0..labels.len())])
            })
            .collect();
        let classifier = KnnClassifier::from_samples(layout, samples.clone());
        classifier.save(&path).unwrap();

        let mut loaded = KnnClassifier::new(layout);
        assert_eq!(loaded.load(&path).unwrap(), count);
        assert_eq!(loaded.samples(), samples.as_slice());
    }
}

#[test]
fn failed_load_empties_the_classifier() {
    let layout = FeatureLayout::default();
    let dir = tempdir().unwrap();
    let path = dir.path().join(MODEL_FILE_NAME);
    let mut classifier =
        KnnClassifier::from_samples(layout, vec![TrainingSample::new(vec![0.0; 63], "a")]);
    classifier.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(classifier.load(&path).is_err());
    assert!(classifier.is_empty());
}

#[test]
fn layout_mismatch_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(MODEL_FILE_NAME);
    let wide = FeatureLayout::new(21, 4);
    model_file::save(&path, wide, &[TrainingSample::new(vec![0.5; 84], "a")]).unwrap();
    let err = model_file::load(&path, FeatureLayout::default()).unwrap_err();
    assert_eq!(err.kind(), handsign::error::ErrorKind::Format);
}
