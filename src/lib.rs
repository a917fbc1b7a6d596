//! Motion Sense - Core Library
//!
//! Sliding-window activity classification for 6-axis inertial data
//! (linear acceleration + gyroscope).
//!
//! ## Pipeline
//! ```text
//! Recording ──► Segmenter ──► FeatureExtractor ──► train() ──► TrainedModel
//! Recording + TrainedModel ──► evaluate() ──► WindowResult[] + DurationSummary
//! SampleSource + TrainedModel ──► StreamingPredictor ──► tally + AlertEvent
//! ```
//!
//! The same [`logic::segment::Segmenter`] drives training, batch re-scoring
//! and live streaming so window boundaries never drift between call sites.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{PipelineError, PipelineResult};
