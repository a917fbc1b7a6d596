//! Evaluate Module - batch re-scoring
//!
//! Recording + model → ordered window results + per-label duration summary.

pub mod summary;
pub mod timeline;


pub use summary::{format_mm_ss, DurationEntry, DurationSummary};
pub use timeline::{evaluate, evaluate_samples, normalize_times, Evaluation, TimeSource, WindowResult};
