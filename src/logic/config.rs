//! Pipeline Configuration
//!
//! User-facing settings, read from the environment with fallbacks from
//! `constants`. `validate()` applies the settings-form ranges.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{self, DEFAULT_ALERT_CODE, DEFAULT_SEED};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::model::{Label, TrainParams};
use crate::logic::stream::AlertMode;

/// Window size bounds accepted from users
pub const WINDOW_SIZE_RANGE: (usize, usize) = (10, 1000);
pub const STRIDE_RANGE: (usize, usize) = (1, 1000);
pub const TREE_COUNT_RANGE: (usize, usize) = (50, 5000);
pub const MAX_DEPTH_RANGE: (usize, usize) = (1, 10);

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub window_size: usize,
    pub stride: usize,
    pub tree_count: usize,
    pub max_depth: usize,
    pub fit_fraction: f64,
    pub seed: u64,
    pub alert_mode: AlertMode,
    /// Class code that triggers alerts
    pub alert_code: i64,
    /// Assumed device rate for deferred duration estimates
    pub sampling_rate_hz: f64,
    pub poll_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: constants::DEFAULT_WINDOW_SIZE,
            stride: constants::DEFAULT_STRIDE,
            tree_count: constants::DEFAULT_TREE_COUNT,
            max_depth: constants::DEFAULT_MAX_DEPTH,
            fit_fraction: constants::DEFAULT_FIT_FRACTION,
            seed: DEFAULT_SEED,
            alert_mode: AlertMode::Immediate,
            alert_code: DEFAULT_ALERT_CODE,
            sampling_rate_hz: constants::NOMINAL_SAMPLING_RATE_HZ,
            poll_timeout_ms: constants::DEFAULT_POLL_TIMEOUT_MS,
        }
    }
}

fn check_range(name: &str, value: usize, (min, max): (usize, usize)) -> PipelineResult<()> {
    if value < min || value > max {
        return Err(PipelineError::InvalidConfig(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to defaults; an unknown alert mode is an error.
    pub fn from_env() -> PipelineResult<Self> {
        Ok(Self {
            window_size: constants::get_window_size(),
            stride: constants::get_stride(),
            tree_count: constants::get_tree_count(),
            max_depth: constants::get_max_depth(),
            fit_fraction: constants::get_fit_fraction(),
            seed: DEFAULT_SEED,
            alert_mode: constants::get_alert_mode().parse()?,
            alert_code: DEFAULT_ALERT_CODE,
            sampling_rate_hz: constants::get_sampling_rate(),
            poll_timeout_ms: constants::get_poll_timeout_ms(),
        })
    }

    pub fn validate(&self) -> PipelineResult<()> {
        check_range("window_size", self.window_size, WINDOW_SIZE_RANGE)?;
        check_range("stride", self.stride, STRIDE_RANGE)?;
        check_range("tree_count", self.tree_count, TREE_COUNT_RANGE)?;
        check_range("max_depth", self.max_depth, MAX_DEPTH_RANGE)?;

        if !(self.fit_fraction > 0.0 && self.fit_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "fit_fraction must be in (0, 1), got {}",
                self.fit_fraction
            )));
        }
        if !(self.sampling_rate_hz.is_finite() && self.sampling_rate_hz > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "sampling_rate_hz must be positive, got {}",
                self.sampling_rate_hz
            )));
        }
        Ok(())
    }

    pub fn train_params(&self) -> TrainParams {
        TrainParams {
            tree_count: self.tree_count,
            max_depth: self.max_depth,
            fit_fraction: self.fit_fraction,
            seed: self.seed,
        }
    }

    pub fn alert_label(&self) -> Label {
        Label::from_code(self.alert_code)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}
