//! Integration Tests for Model Module
//!
//! Training, blob round trips and prediction error wrapping.

use crate::error::PipelineError;
use crate::logic::dataset::Recording;
use crate::logic::features::{FeatureExtractor, FeatureTable, FeatureVector, StatisticalExtractor};
use crate::logic::model::{
    stratified_split, train, train_from_recording, ActivityClassifier, InferenceError, Label,
    TrainParams, TrainedModel,
};
use crate::logic::sample::Sample;
use crate::logic::segment::Segmenter;

/// Class 0 is still, class 1 oscillates fast, class 2 oscillates slow with an offset
fn synthetic_recording(windows_per_class: usize, window_size: usize) -> Recording {
    let mut samples = Vec::new();
    let mut t = 0.0;
    for block in 0..windows_per_class {
        for class in 0..3i64 {
            for i in 0..window_size {
                let phase = (block * window_size + i) as f64;
                let channels = match class {
                    0 => [0.01 * (phase * 0.3).sin(), 0.0, 9.8, 0.0, 0.0, 0.0],
                    1 => [2.0 * (phase * 1.7).sin(), (phase * 1.1).cos(), 9.8, 1.5, -0.5, 0.3],
                    _ => [0.8 * (phase * 0.4).sin() + 3.0, 0.2, 9.0, -1.0, 0.8, -0.2],
                };
                samples.push(Sample::new(channels).with_time(t).with_class(class));
                t += 1.0 / 60.0;
            }
        }
    }
    Recording::from_samples(samples)
}

fn small_params() -> TrainParams {
    TrainParams {
        tree_count: 15,
        max_depth: 4,
        fit_fraction: 0.5,
        seed: 3,
    }
}

#[test]
fn test_train_from_recording_learns_synthetic_classes() {
    let recording = synthetic_recording(6, 20);
    let report = train_from_recording(&recording, 20, 20, &small_params()).unwrap();

    assert_eq!(report.fit_windows + report.eval_windows, 18);
    assert_eq!(report.confusion.codes, vec![0, 1, 2]);
    assert_eq!(
        report.confusion.labels,
        vec!["Stop", "Distracted Walking", "Not Distracted Walking"]
    );
    assert_eq!(report.confusion.total(), report.eval_windows);
    assert!(report.accuracy > 0.9, "accuracy {}", report.accuracy);
    assert_eq!(report.model.metadata.classes, vec![0, 1, 2]);
}

#[test]
fn test_default_split_is_fit_light() {
    let labels: Vec<i64> = (0..50).map(|i| i % 2).collect();
    let (fit, eval) = stratified_split(&labels, 0.2, 42);
    assert_eq!(fit.len(), 10);
    assert_eq!(eval.len(), 40);
    assert_eq!(fit.iter().filter(|&&i| labels[i] == 0).count(), 5);

    let again = stratified_split(&labels, 0.2, 42);
    assert_eq!(again.0, fit);
}

#[test]
fn test_split_keeps_every_class_on_both_sides() {
    let labels = vec![0, 0, 1, 1, 1, 2];
    let (fit, eval) = stratified_split(&labels, 0.2, 1);
    assert!(fit.iter().any(|&i| labels[i] == 0) && eval.iter().any(|&i| labels[i] == 0));
    assert!(fit.iter().any(|&i| labels[i] == 1) && eval.iter().any(|&i| labels[i] == 1));
    assert!(fit.iter().any(|&i| labels[i] == 2));
}

#[test]
fn test_train_requires_class_column() {
    let samples: Vec<Sample> = (0..40).map(|i| Sample::new([i as f64; 6])).collect();
    let recording = Recording::from_samples(samples);
    match train_from_recording(&recording, 10, 10, &small_params()) {
        Err(PipelineError::Schema { column, .. }) => assert_eq!(column, "class"),
        other => panic!("Expected Schema error, got {:?}", other.map(|r| r.accuracy)),
    }
}

#[test]
fn test_train_too_short_for_one_window() {
    let recording = synthetic_recording(1, 5);
    let result = train_from_recording(&recording, 60, 30, &small_params());
    assert!(matches!(
        result,
        Err(PipelineError::InsufficientData { available: 15, required: 60, unit: "samples" })
    ));
}

#[test]
fn test_train_single_window_cannot_hold_out() {
    let samples: Vec<Sample> = (0..10).map(|i| Sample::new([i as f64; 6]).with_class(0)).collect();
    let seg = Segmenter::finite(10, 10).unwrap();
    let table = FeatureTable::build(&samples, &seg, &StatisticalExtractor::new()).unwrap();
    assert!(matches!(
        train(&table, &small_params()),
        Err(PipelineError::InsufficientData { available: 1, required: 2, unit: "windows" })
    ));
}

#[test]
fn test_invalid_params_rejected() {
    let recording = synthetic_recording(2, 10);
    let mut params = small_params();
    params.fit_fraction = 1.0;
    assert!(matches!(
        train_from_recording(&recording, 10, 10, &params),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn test_model_blob_round_trip_predicts_identically() {
    let recording = synthetic_recording(4, 20);
    let report = train_from_recording(&recording, 20, 10, &small_params()).unwrap();

    let bytes = report.model.to_bytes().unwrap();
    let restored = TrainedModel::from_bytes(&bytes).unwrap();
    assert_eq!(restored.metadata, report.model.metadata);

    let extractor = StatisticalExtractor::new();
    for window in recording.samples().chunks(20) {
        let vector = extractor.extract(window).unwrap();
        assert_eq!(report.model.predict(&vector).unwrap(), restored.predict(&vector).unwrap());
    }
}

#[test]
fn test_model_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    let report = train_from_recording(&synthetic_recording(3, 10), 10, 10, &small_params()).unwrap();
    report.model.save(&path).unwrap();

    let loaded = TrainedModel::load(&path).unwrap();
    assert_eq!(loaded.metadata.model_id, report.model.metadata.model_id);
    assert!(loaded.is_fitted());
}

#[test]
fn test_tampered_blob_rejected() {
    let report = train_from_recording(&synthetic_recording(3, 10), 10, 10, &small_params()).unwrap();
    let mut envelope: serde_json::Value = serde_json::from_slice(&report.model.to_bytes().unwrap()).unwrap();
    let payload = envelope["payload"].as_str().unwrap().replacen("\"accuracy\":", "\"accuracy\": ", 1);
    envelope["payload"] = serde_json::Value::String(payload);
    let bytes = serde_json::to_vec(&envelope).unwrap();

    match TrainedModel::from_bytes(&bytes) {
        Err(PipelineError::Model(msg)) => assert!(msg.contains("checksum")),
        other => panic!("Expected Model error, got {:?}", other.map(|m| m.metadata)),
    }
    assert!(TrainedModel::from_bytes(b"not a model").is_err());
}

/// Re-wrap an edited payload with a valid checksum
fn reseal(bytes: &[u8], edit: impl Fn(&mut serde_json::Value)) -> Vec<u8> {
    use sha2::{Digest, Sha256};

    let mut envelope: serde_json::Value = serde_json::from_slice(bytes).unwrap();
    let mut payload: serde_json::Value = serde_json::from_str(envelope["payload"].as_str().unwrap()).unwrap();
    edit(&mut payload);
    let payload = serde_json::to_string(&payload).unwrap();
    envelope["checksum"] = serde_json::Value::String(hex::encode(Sha256::digest(payload.as_bytes())));
    envelope["payload"] = serde_json::Value::String(payload);
    serde_json::to_vec(&envelope).unwrap()
}

fn first_split(payload: &mut serde_json::Value) -> &mut serde_json::Value {
    payload["forest"]["trees"][0]["nodes"]
        .as_array_mut()
        .unwrap()
        .iter_mut()
        .find_map(|node| node.get_mut("Split"))
        .unwrap()
}

#[test]
fn test_resealed_corrupt_forest_rejected() {
    let report = train_from_recording(&synthetic_recording(3, 10), 10, 10, &small_params()).unwrap();
    let bytes = report.model.to_bytes().unwrap();
    assert!(TrainedModel::from_bytes(&reseal(&bytes, |_| {})).is_ok());

    let out_of_range = reseal(&bytes, |payload| {
        first_split(payload)["feature"] = serde_json::json!(9999);
    });
    let self_loop = reseal(&bytes, |payload| {
        let split = first_split(payload);
        split["right"] = serde_json::json!(0);
    });

    for blob in [out_of_range, self_loop] {
        match TrainedModel::from_bytes(&blob) {
            Err(PipelineError::Model(msg)) => assert!(msg.contains("corrupt forest"), "{}", msg),
            other => panic!("Expected Model error, got {:?}", other.map(|m| m.metadata)),
        }
    }
}

#[test]
fn test_prediction_error_wraps_width_mismatch() {
    let report = train_from_recording(&synthetic_recording(3, 10), 10, 10, &small_params()).unwrap();
    let mut vector = FeatureVector::new();
    vector.values.truncate(10);

    match report.model.predict(&vector) {
        Err(PipelineError::Prediction { window: None, source }) => {
            assert_eq!(source, InferenceError::LayoutMismatch)
        }
        other => panic!("Expected Prediction error, got {:?}", other),
    }
}

#[test]
fn test_predict_is_deterministic() {
    let recording = synthetic_recording(3, 10);
    let report = train_from_recording(&recording, 10, 10, &small_params()).unwrap();
    let vector = StatisticalExtractor::new().extract(&recording.samples()[0..10]).unwrap();

    let first: Label = report.model.predict(&vector).unwrap();
    for _ in 0..5 {
        assert_eq!(report.model.predict(&vector).unwrap(), first);
    }
}
