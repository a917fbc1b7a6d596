//! Feature Vector - Core data structure for classifier input
//!
//! **Versioned feature vector with layout validation**
//!
//! One vector per window: 11 statistics × 6 channels in `FEATURE_LAYOUT`
//! order, plus the window's majority class when ground truth is present.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::layout::{feature_index, layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, STATS_PER_CHANNEL};
use super::stats::ChannelStats;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::sample::{Channel, Sample, CHANNELS};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Feature values in `FEATURE_LAYOUT` order
    pub values: Vec<f64>,
    /// Majority class of the source window, if labelled
    pub class: Option<i64>,
}

impl FeatureVector {
    /// Zeroed vector with current version
    pub fn new() -> Self {
        Self::from_values(vec![0.0; FEATURE_COUNT])
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
            class: None,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Whether this vector matches the current layout
    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION
            && self.layout_hash == layout_hash()
            && self.values.len() == FEATURE_COUNT
    }

    /// Name → value mapping; the class (if any) appears under `"class"`
    pub fn to_named_map(&self) -> HashMap<String, f64> {
        let mut map: HashMap<String, f64> = FEATURE_LAYOUT
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        if let Some(class) = self.class {
            map.insert("class".to_string(), class as f64);
        }
        map
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FEATURE EXTRACTOR
// ============================================================================

/// Window → feature vector
pub trait FeatureExtractor {
    fn extract(&self, window: &[Sample]) -> PipelineResult<FeatureVector>;
}

/// Summary-statistics extractor over a fixed channel list
#[derive(Debug, Clone)]
pub struct StatisticalExtractor {
    channels: Vec<Channel>,
}

impl StatisticalExtractor {
    pub fn new() -> Self {
        Self {
            channels: CHANNELS.to_vec(),
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

impl Default for StatisticalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for StatisticalExtractor {
    fn extract(&self, window: &[Sample]) -> PipelineResult<FeatureVector> {
        if window.is_empty() {
            return Err(PipelineError::no_window(0, 1));
        }

        let mut values = Vec::with_capacity(self.channels.len() * STATS_PER_CHANNEL);
        let mut column = Vec::with_capacity(window.len());
        for &channel in &self.channels {
            column.clear();
            column.extend(window.iter().map(|s| s.get(channel)));
            values.extend_from_slice(&ChannelStats::compute(&column).to_array());
        }

        let mut vector = FeatureVector::from_values(values);
        vector.class = majority_class(window);
        Ok(vector)
    }
}

/// Mode of the window's class codes; ties go to the smallest code
pub fn majority_class(window: &[Sample]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for class in window.iter().filter_map(|s| s.class) {
        *counts.entry(class).or_insert(0) += 1;
    }

    let mut best: Option<(i64, usize)> = None;
    for (class, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((class, count)),
        }
    }
    best.map(|(class, _)| class)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(classes: &[i64]) -> Vec<Sample> {
        classes
            .iter()
            .enumerate()
            .map(|(i, &c)| Sample::new([i as f64; 6]).with_class(c))
            .collect()
    }

    #[test]
    fn test_feature_vector_new() {
        let vector = FeatureVector::new();
        assert_eq!(vector.version, FEATURE_VERSION);
        assert_eq!(vector.values.len(), FEATURE_COUNT);
        assert!(vector.is_compatible());
    }

    #[test]
    fn test_majority_class_tie_breaks_to_smallest() {
        assert_eq!(majority_class(&labelled(&[2, 1, 2, 1])), Some(1));
        assert_eq!(majority_class(&labelled(&[2, 2, 0])), Some(2));
        assert_eq!(majority_class(&[Sample::new([0.0; 6])]), None);
    }

    #[test]
    fn test_extract_attaches_class() {
        let vector = StatisticalExtractor::new().extract(&labelled(&[0, 0, 1])).unwrap();
        assert_eq!(vector.class, Some(0));
        assert_eq!(vector.to_named_map().get("class"), Some(&0.0));
        assert_eq!(vector.to_named_map().len(), FEATURE_COUNT + 1);
    }

    #[test]
    fn test_extract_empty_window_fails() {
        assert!(StatisticalExtractor::new().extract(&[]).is_err());
    }
}
