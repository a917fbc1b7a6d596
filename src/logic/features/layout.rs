//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema.** Any trained model is only valid
//! for the exact layout it was trained on.
//!
//! ## Rules
//! 1. Add/remove a statistic → increment FEATURE_VERSION
//! 2. Change channel or statistic order → increment FEATURE_VERSION
//! 3. Change a numeric convention in `stats.rs` → increment FEATURE_VERSION

use crc32fast::Hasher;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::logic::sample::{CHANNELS, CHANNEL_COUNT};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 2;

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

/// Per-channel statistics, in vector order
pub const STATISTICS: [&str; STATS_PER_CHANNEL] = [
    "mean",   // 0: arithmetic mean
    "std",    // 1: population standard deviation
    "min",    // 2
    "max",    // 3
    "median", // 4: linear-interpolated 50th percentile
    "range",  // 5: max - min
    "q1",     // 6: linear-interpolated 25th percentile
    "q3",     // 7: linear-interpolated 75th percentile
    "skew",   // 8: sample-size corrected skewness
    "kurt",   // 9: sample-size corrected excess kurtosis
    "iqr",    // 10: q3 - q1
];

/// Statistics per channel
pub const STATS_PER_CHANNEL: usize = 11;

/// Total number of features (channel-major: all `ax_*` first)
pub const FEATURE_COUNT: usize = CHANNEL_COUNT * STATS_PER_CHANNEL;

/// Feature names in exact vector order, e.g. `ax_mean`, `ax_std`, ..., `wz_iqr`
pub static FEATURE_LAYOUT: Lazy<Vec<String>> = Lazy::new(|| {
    CHANNELS
        .iter()
        .flat_map(|ch| STATISTICS.iter().map(move |stat| format!("{}_{}", ch.as_str(), stat)))
        .collect()
});

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of version + ordered feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT.iter() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout description stored alongside trained models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
        }
    }

    pub fn is_current(&self) -> bool {
        *self == Self::current()
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// INDEX LOOKUP
// ============================================================================

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|n| n == name)
}

pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 66);
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(layout_hash(), layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("ax_mean"), Some(0));
        assert_eq!(feature_index("ay_mean"), Some(11));
        assert_eq!(feature_index("wz_iqr"), Some(65));
        assert_eq!(feature_index("nonexistent"), None);
    }

    #[test]
    fn test_feature_name() {
        assert_eq!(feature_name(10), Some("ax_iqr"));
        assert_eq!(feature_name(66), None);
    }

    #[test]
    fn test_layout_info_current() {
        let info = LayoutInfo::current();
        assert!(info.is_current());

        let stale = LayoutInfo { version: FEATURE_VERSION + 1, ..info };
        assert!(!stale.is_current());
    }
}
