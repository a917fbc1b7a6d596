//! Logic Module - Pipeline Engines
//!
//! - `sample` / `segment` - canonical samples and window planning
//! - `features/` - per-window statistics (66-entry feature vector)
//! - `model/` - classifier adapter, training, label lookup
//! - `dataset/` - recorded dataset input and CSV exports
//! - `evaluate/` - batch re-scoring with time ranges and duration summary
//! - `stream/` - live session: buffers, sources, alert policy

pub mod config;
pub mod sample;
pub mod segment;

pub mod features;
pub mod model;
pub mod dataset;
pub mod evaluate;
pub mod stream;
