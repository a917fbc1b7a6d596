//! Features Module - Feature Extraction Engine
//!
//! Converts a window of 6-channel samples into a flat 66-entry vector.
//! The same extractor runs at training, batch and streaming call sites.

pub mod layout;
pub mod stats;
pub mod table;
pub mod vector;


// Re-export common types
pub use layout::{LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use table::FeatureTable;
pub use vector::{majority_class, FeatureExtractor, FeatureVector, StatisticalExtractor};
