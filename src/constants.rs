//! Central Configuration Constants
//!
//! Single source of truth for all pipeline defaults.
//! Values match the defaults a new user profile starts with.

/// Default window size (samples per window)
pub const DEFAULT_WINDOW_SIZE: usize = 60;

/// Default stride (samples the window start advances per slide)
pub const DEFAULT_STRIDE: usize = 30;

/// Default number of trees in the forest
pub const DEFAULT_TREE_COUNT: usize = 400;

/// Default maximum tree depth
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Nominal device sampling rate (Hz) used for deferred alert estimates.
///
/// Assumed, never measured from timestamps.
pub const NOMINAL_SAMPLING_RATE_HZ: f64 = 60.0;

/// Share of windows used for fitting. The rest is held out for evaluation.
pub const DEFAULT_FIT_FRACTION: f64 = 0.2;

/// Seed for the stratified split and the forest bootstrap
pub const DEFAULT_SEED: u64 = 42;

/// Class code that triggers the alert policy ("Distracted Walking")
pub const DEFAULT_ALERT_CODE: i64 = 1;

/// Live source poll timeout (milliseconds)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 500;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Motion Sense";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Get window size from environment or use default
pub fn get_window_size() -> usize {
    env_parse("MOTION_WINDOW_SIZE").unwrap_or(DEFAULT_WINDOW_SIZE)
}

/// Get stride from environment or use default
pub fn get_stride() -> usize {
    env_parse("MOTION_STRIDE").unwrap_or(DEFAULT_STRIDE)
}

/// Get tree count from environment or use default
pub fn get_tree_count() -> usize {
    env_parse("MOTION_TREES").unwrap_or(DEFAULT_TREE_COUNT)
}

/// Get max depth from environment or use default
pub fn get_max_depth() -> usize {
    env_parse("MOTION_MAX_DEPTH").unwrap_or(DEFAULT_MAX_DEPTH)
}

/// Get nominal sampling rate from environment or use default
pub fn get_sampling_rate() -> f64 {
    env_parse("MOTION_SAMPLING_RATE").unwrap_or(NOMINAL_SAMPLING_RATE_HZ)
}

/// Get fit fraction from environment or use default
pub fn get_fit_fraction() -> f64 {
    env_parse("MOTION_FIT_FRACTION").unwrap_or(DEFAULT_FIT_FRACTION)
}

/// Get poll timeout from environment or use default
pub fn get_poll_timeout_ms() -> u64 {
    env_parse("MOTION_POLL_TIMEOUT_MS").unwrap_or(DEFAULT_POLL_TIMEOUT_MS)
}

/// Get alert mode name from environment ("immediate" or "deferred")
pub fn get_alert_mode() -> String {
    std::env::var("MOTION_ALERT_MODE")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|_| "immediate".to_string())
}
