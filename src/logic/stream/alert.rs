//! Alert Policy - immediate latch or end-of-session delivery

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::logic::model::Label;

/// When the alert label is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// Notify once, the first time the label is produced
    #[default]
    Immediate,
    /// Notify at session end if the label was ever produced
    Deferred,
}

impl AlertMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertMode::Immediate => "immediate",
            AlertMode::Deferred => "deferred",
        }
    }
}

impl fmt::Display for AlertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(AlertMode::Immediate),
            "deferred" => Ok(AlertMode::Deferred),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown alert mode '{}' (expected immediate or deferred)",
                other
            ))),
        }
    }
}

/// Notification payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub label: Label,
    pub mode: AlertMode,
    /// Estimated time spent in the label (deferred only)
    pub duration_s: Option<f64>,
    pub duration_min: Option<f64>,
    pub raised_at: DateTime<Utc>,
}

// ============================================================================
// NOTIFIERS
// ============================================================================

/// Side effect fired for each alert
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, event: &AlertEvent);
}

/// Writes alerts to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn notify(&self, event: &AlertEvent) {
        match event.duration_s {
            Some(seconds) => log::warn!(
                "[ALERT] {} ({}) for ~{:.1}s ({:.2} min)",
                event.label,
                event.mode,
                seconds,
                seconds / 60.0
            ),
            None => log::warn!("[ALERT] {} ({})", event.label, event.mode),
        }
    }
}

/// Collects alerts in memory
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<AlertEvent>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }
}

impl AlertNotifier for MemoryNotifier {
    fn notify(&self, event: &AlertEvent) {
        self.events.lock().push(event.clone());
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Per-session alert state
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    mode: AlertMode,
    label: Label,
    pending: bool,
}

impl AlertPolicy {
    pub fn new(mode: AlertMode, label: Label) -> Self {
        Self {
            mode,
            label,
            pending: false,
        }
    }

    pub fn mode(&self) -> AlertMode {
        self.mode
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// An immediate alert has fired this session
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Immediate mode: event for the first alert-label window only
    pub fn observe(&mut self, label: Label) -> Option<AlertEvent> {
        if self.mode != AlertMode::Immediate || label != self.label || self.pending {
            return None;
        }
        self.pending = true;
        Some(AlertEvent {
            label,
            mode: self.mode,
            duration_s: None,
            duration_min: None,
            raised_at: Utc::now(),
        })
    }

    /// Deferred mode: end-of-session event when the label was seen.
    ///
    /// Duration is `count * stride / sampling_rate`, a nominal-rate estimate.
    pub fn finish(&self, count: usize, stride: usize, sampling_rate: f64) -> Option<AlertEvent> {
        if self.mode != AlertMode::Deferred || count == 0 {
            return None;
        }
        let seconds = count as f64 * (stride as f64 / sampling_rate);
        Some(AlertEvent {
            label: self.label,
            mode: self.mode,
            duration_s: Some(seconds),
            duration_min: Some(seconds / 60.0),
            raised_at: Utc::now(),
        })
    }
}
