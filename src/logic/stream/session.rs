//! Streaming Predictor - one live classification session
//!
//! ```text
//! Idle ──first sample──► Accumulating ──len ≥ window──► Sliding ──stop──► Stopped
//! ```
//!
//! Each accepted sample is appended to the channel buffers; whenever the
//! cursor window is complete it is scored, tallied and the cursor advances
//! by `stride`. Failed polls and failed predictions never end the session.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::alert::{AlertEvent, AlertMode, AlertNotifier, AlertPolicy, LogNotifier};
use super::buffer::{BufferStatus, ChannelBuffers};
use super::source::SampleSource;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::features::{FeatureExtractor, StatisticalExtractor};
use crate::logic::model::{classify, ActivityClassifier, Label};
use crate::logic::sample::Sample;
use crate::logic::segment::{Segmenter, SlidingCursor, WindowBounds};

// ============================================================================
// TYPES
// ============================================================================

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamState {
    Idle,
    Accumulating,
    Sliding,
    Stopped,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamState::Idle => "Idle",
            StreamState::Accumulating => "Accumulating",
            StreamState::Sliding => "Sliding",
            StreamState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Per-session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub window_size: usize,
    pub stride: usize,
    pub alert_mode: AlertMode,
    pub alert_label: Label,
    pub sampling_rate_hz: f64,
    pub poll_timeout: Duration,
}

impl SessionConfig {
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            window_size: config.window_size,
            stride: config.stride,
            alert_mode: config.alert_mode,
            alert_label: config.alert_label(),
            sampling_rate_hz: config.sampling_rate_hz,
            poll_timeout: config.poll_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_pipeline(&PipelineConfig::default())
    }
}

/// Cooperative stop flag shared with the controlling thread
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Final session outcome
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub tally: BTreeMap<Label, usize>,
    pub windows_scored: usize,
    pub dropped_windows: usize,
    pub samples_accepted: usize,
    pub rejected_polls: usize,
    pub deferred_alert: Option<AlertEvent>,
}

// ============================================================================
// STREAMING PREDICTOR
// ============================================================================

pub struct StreamingPredictor<'a, C: ActivityClassifier + ?Sized> {
    classifier: &'a C,
    config: SessionConfig,
    extractor: StatisticalExtractor,
    buffers: ChannelBuffers,
    cursor: SlidingCursor,
    state: StreamState,
    history: Vec<StreamState>,
    tally: BTreeMap<Label, usize>,
    alert: AlertPolicy,
    notifier: Arc<dyn AlertNotifier>,
    windows_scored: usize,
    dropped_windows: usize,
    samples_accepted: usize,
    rejected_polls: usize,
    deferred_alert: Option<AlertEvent>,
}

impl<'a, C: ActivityClassifier + ?Sized> StreamingPredictor<'a, C> {
    /// New session in `Idle`; alerts go to the log until a notifier is set
    pub fn new(classifier: &'a C, config: SessionConfig) -> PipelineResult<Self> {
        let segmenter = Segmenter::finite(config.window_size, config.stride)?;
        if !(config.sampling_rate_hz.is_finite() && config.sampling_rate_hz > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "sampling_rate_hz must be positive, got {}",
                config.sampling_rate_hz
            )));
        }

        Ok(Self {
            classifier,
            alert: AlertPolicy::new(config.alert_mode, config.alert_label),
            config,
            extractor: StatisticalExtractor::new(),
            buffers: ChannelBuffers::new(),
            cursor: segmenter.cursor(),
            state: StreamState::Idle,
            history: vec![StreamState::Idle],
            tally: Label::known().map(|label| (label, 0)).collect(),
            notifier: Arc::new(LogNotifier),
            windows_scored: 0,
            dropped_windows: 0,
            samples_accepted: 0,
            rejected_polls: 0,
            deferred_alert: None,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// States entered so far, starting with `Idle`
    pub fn history(&self) -> &[StreamState] {
        &self.history
    }

    pub fn tally(&self) -> &BTreeMap<Label, usize> {
        &self.tally
    }

    pub fn windows_scored(&self) -> usize {
        self.windows_scored
    }

    pub fn status(&self) -> BufferStatus {
        self.buffers.status(self.config.window_size)
    }

    fn transition(&mut self, next: StreamState) {
        if self.state == next {
            return;
        }
        log::info!("Stream state {} → {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Accept one sample and score every window it completes.
    ///
    /// Returns the labels produced; ignored once the session is stopped.
    pub fn push(&mut self, sample: &Sample) -> Vec<Label> {
        if self.state == StreamState::Stopped {
            return Vec::new();
        }

        self.buffers.push(sample);
        self.samples_accepted += 1;

        if self.state == StreamState::Idle {
            self.transition(StreamState::Accumulating);
        }
        if self.state == StreamState::Accumulating && self.buffers.len() >= self.config.window_size {
            self.transition(StreamState::Sliding);
        }

        let mut labels = Vec::new();
        while self.cursor.fits(self.buffers.len()) {
            let bounds = self.cursor.bounds();
            if let Some(label) = self.score(bounds) {
                labels.push(label);
            }
            self.cursor.advance();
            self.buffers.discard_before(self.cursor.bounds().start);
        }
        labels
    }

    fn score(&mut self, bounds: WindowBounds) -> Option<Label> {
        let outcome = match self.buffers.window(bounds) {
            Some(window) => self
                .extractor
                .extract(&window)
                .and_then(|vector| classify(self.classifier, &vector, Some(bounds))),
            None => Err(PipelineError::no_window(self.buffers.retained(), bounds.len())),
        };

        match outcome {
            Ok(label) => {
                *self.tally.entry(label).or_insert(0) += 1;
                self.windows_scored += 1;
                log::debug!("Window [{}, {}) → {}", bounds.start, bounds.end, label);

                if let Some(event) = self.alert.observe(label) {
                    self.notifier.notify(&event);
                }
                Some(label)
            }
            Err(e) => {
                self.dropped_windows += 1;
                log::warn!("Dropping window [{}, {}): {}", bounds.start, bounds.end, e);
                None
            }
        }
    }

    /// Poll `source` until stopped or the source closes, then stop.
    ///
    /// The stop flag is checked at the top of every cycle.
    pub fn run(&mut self, source: &mut dyn SampleSource, stop: &StopHandle) -> SessionReport {
        log::info!(
            "Streaming session started (window {}, stride {}, alert {} on {})",
            self.config.window_size,
            self.config.stride,
            self.config.alert_mode,
            self.config.alert_label
        );

        while self.state != StreamState::Stopped {
            if stop.is_stopped() {
                log::info!("Stop requested");
                break;
            }
            if source.is_closed() {
                log::info!("Source closed");
                break;
            }

            match source.poll(self.config.poll_timeout) {
                Ok(Some(sample)) => {
                    self.push(&sample);
                }
                Ok(None) => {}
                Err(e) => {
                    self.rejected_polls += 1;
                    log::debug!("Poll failed, retrying: {}", e);
                }
            }
        }

        self.stop()
    }

    /// Freeze the tally and deliver any deferred alert; repeated calls
    /// return the same report without notifying again
    pub fn stop(&mut self) -> SessionReport {
        if self.state != StreamState::Stopped {
            self.transition(StreamState::Stopped);

            let count = self.tally.get(&self.alert.label()).copied().unwrap_or(0);
            self.deferred_alert = self
                .alert
                .finish(count, self.config.stride, self.config.sampling_rate_hz);
            if let Some(event) = &self.deferred_alert {
                self.notifier.notify(event);
            }

            log::info!(
                "Session stopped: {} samples, {} windows scored, {} dropped, {} failed polls",
                self.samples_accepted,
                self.windows_scored,
                self.dropped_windows,
                self.rejected_polls
            );
        }

        SessionReport {
            tally: self.tally.clone(),
            windows_scored: self.windows_scored,
            dropped_windows: self.dropped_windows,
            samples_accepted: self.samples_accepted,
            rejected_polls: self.rejected_polls,
            deferred_alert: self.deferred_alert.clone(),
        }
    }
}
