//! Integration Tests for Streaming Sessions

use std::sync::Arc;
use std::time::Duration;

use ndarray::Array2;

use crate::logic::features::layout::feature_index;
use crate::logic::model::{ActivityClassifier, InferenceError, Label};
use crate::logic::sample::Sample;
use crate::logic::stream::{
    AlertMode, MemoryNotifier, ReplaySource, SessionConfig, SourceError, StopHandle, StreamState,
    StreamingPredictor,
};

/// `ax` mean ≥ 1 → Distracted Walking, otherwise Stop; fails above 100
struct AxThreshold;

impl ActivityClassifier for AxThreshold {
    fn fit(&mut self, _: &Array2<f64>, _: &[i64]) -> Result<(), InferenceError> {
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Result<i64, InferenceError> {
        let ax_mean = row[feature_index("ax_mean").unwrap_or(0)];
        if ax_mean > 100.0 {
            return Err(InferenceError::Other("saturated".to_string()));
        }
        Ok(if ax_mean >= 1.0 { 1 } else { 0 })
    }

    fn classes(&self) -> &[i64] {
        &[0, 1]
    }

    fn is_fitted(&self) -> bool {
        true
    }
}

fn config(window_size: usize, stride: usize, alert_mode: AlertMode) -> SessionConfig {
    SessionConfig {
        window_size,
        stride,
        alert_mode,
        alert_label: Label::DISTRACTED_WALKING,
        sampling_rate_hz: 60.0,
        poll_timeout: Duration::from_millis(5),
    }
}

fn samples(ax: &[f64]) -> Vec<Sample> {
    ax.iter().map(|&v| Sample::new([v, 0.0, 9.8, 0.0, 0.0, 0.0])).collect()
}

/// 8 samples, window 4, stride 2 → windows [0,4) Stop, [2,6) and [4,8) alert label
fn two_alert_windows() -> Vec<Sample> {
    samples(&[0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0])
}

#[test]
fn test_state_machine_and_window_count() {
    let (window_size, stride) = (4, 2);
    let n = 2 * window_size + 3 * stride;
    let mut predictor = StreamingPredictor::new(&AxThreshold, config(window_size, stride, AlertMode::Immediate)).unwrap();
    assert_eq!(predictor.state(), StreamState::Idle);

    let mut source = ReplaySource::new(samples(&vec![0.0; n]));
    let report = predictor.run(&mut source, &StopHandle::new());

    assert_eq!(
        predictor.history(),
        &[StreamState::Idle, StreamState::Accumulating, StreamState::Sliding, StreamState::Stopped]
    );
    assert_eq!(report.windows_scored, (n - window_size) / stride + 1);
    assert_eq!(report.samples_accepted, n);
    assert_eq!(report.tally[&Label::STOP], report.windows_scored);
}

#[test]
fn test_warm_up_is_not_an_error() {
    let mut predictor = StreamingPredictor::new(&AxThreshold, config(4, 2, AlertMode::Immediate)).unwrap();
    for sample in samples(&[0.0, 0.0, 0.0]) {
        assert!(predictor.push(&sample).is_empty());
    }
    assert_eq!(predictor.state(), StreamState::Accumulating);
    assert_eq!(predictor.status().current_size, 3);
    assert!(!predictor.status().is_ready);

    assert_eq!(predictor.push(&samples(&[0.0])[0]), vec![Label::STOP]);
    assert_eq!(predictor.state(), StreamState::Sliding);
}

#[test]
fn test_immediate_alert_fires_once() {
    let notifier = Arc::new(MemoryNotifier::new());
    let mut predictor = StreamingPredictor::new(&AxThreshold, config(4, 2, AlertMode::Immediate))
        .unwrap()
        .with_notifier(notifier.clone());

    let report = predictor.run(&mut ReplaySource::new(two_alert_windows()), &StopHandle::new());

    assert_eq!(report.tally[&Label::DISTRACTED_WALKING], 2);
    assert_eq!(notifier.count(), 1);
    assert_eq!(notifier.events()[0].mode, AlertMode::Immediate);
    assert!(report.deferred_alert.is_none());
}

#[test]
fn test_deferred_alert_at_session_end() {
    let notifier = Arc::new(MemoryNotifier::new());
    let mut predictor = StreamingPredictor::new(&AxThreshold, config(4, 2, AlertMode::Deferred))
        .unwrap()
        .with_notifier(notifier.clone());

    for sample in two_alert_windows() {
        predictor.push(&sample);
    }
    assert_eq!(notifier.count(), 0);

    let report = predictor.stop();
    assert_eq!(notifier.count(), 1);
    let alert = report.deferred_alert.unwrap();
    let expected = 2.0 * 2.0 / 60.0;
    assert!((alert.duration_s.unwrap() - expected).abs() < 1e-9);
    assert!((alert.duration_min.unwrap() - expected / 60.0).abs() < 1e-12);

    // Stopping again neither re-notifies nor changes the tally
    let again = predictor.stop();
    assert_eq!(notifier.count(), 1);
    assert_eq!(again.tally, report.tally);
}

#[test]
fn test_failed_polls_leave_state_untouched() {
    let mut events: Vec<Result<Sample, SourceError>> = Vec::new();
    for sample in samples(&[0.0; 6]) {
        events.push(Err(SourceError::Transport("timeout".to_string())));
        events.push(Ok(sample));
    }
    events.push(Err(SourceError::MissingChannel("gyroZ".to_string())));

    let mut predictor = StreamingPredictor::new(&AxThreshold, config(4, 2, AlertMode::Immediate)).unwrap();
    let report = predictor.run(&mut ReplaySource::from_events(events), &StopHandle::new());

    assert_eq!(report.rejected_polls, 7);
    assert_eq!(report.samples_accepted, 6);
    assert_eq!(report.windows_scored, 2);
}

#[test]
fn test_failed_prediction_drops_window_and_advances() {
    let mut predictor = StreamingPredictor::new(&AxThreshold, config(2, 2, AlertMode::Immediate)).unwrap();
    let stream = samples(&[500.0, 500.0, 0.0, 0.0]);
    let labels: Vec<Label> = stream.iter().flat_map(|s| predictor.push(s)).collect();

    assert_eq!(labels, vec![Label::STOP]);
    let report = predictor.stop();
    assert_eq!(report.dropped_windows, 1);
    assert_eq!(report.windows_scored, 1);
}

#[test]
fn test_stop_before_first_poll() {
    let stop = StopHandle::new();
    stop.stop();

    let mut predictor = StreamingPredictor::new(&AxThreshold, config(4, 2, AlertMode::Deferred)).unwrap();
    let mut source = ReplaySource::new(two_alert_windows());
    let report = predictor.run(&mut source, &stop);

    assert_eq!(report.samples_accepted, 0);
    assert_eq!(source.remaining(), 8);
    assert!(report.deferred_alert.is_none());
    assert_eq!(predictor.state(), StreamState::Stopped);
    assert!(predictor.push(&samples(&[0.0])[0]).is_empty());
}

#[test]
fn test_stop_from_another_thread() {
    let stop = StopHandle::new();
    let remote = stop.clone();
    let (tx, mut source) = crate::logic::stream::ChannelSource::channel(Default::default());

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        remote.stop();
        drop(tx);
    });

    let mut predictor = StreamingPredictor::new(&AxThreshold, config(4, 2, AlertMode::Immediate)).unwrap();
    let report = predictor.run(&mut source, &stop);
    handle.join().unwrap();

    assert_eq!(report.samples_accepted, 0);
    assert_eq!(predictor.state(), StreamState::Stopped);
}

#[test]
fn test_invalid_session_config() {
    assert!(StreamingPredictor::new(&AxThreshold, config(0, 2, AlertMode::Immediate)).is_err());
    let mut bad_rate = config(4, 2, AlertMode::Immediate);
    bad_rate.sampling_rate_hz = 0.0;
    assert!(StreamingPredictor::new(&AxThreshold, bad_rate).is_err());
}
