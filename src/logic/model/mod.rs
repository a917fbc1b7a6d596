//! Model Module - Classifier Adapter
//!
//! Training, prediction and the serialized model blob.
//! Callers depend on [`ActivityClassifier`], not on the forest.

pub mod forest;
pub mod inference;
pub mod label;
pub mod training;

#[cfg(test)]
mod tests;

// Re-export common types
pub use forest::RandomForest;
pub use inference::{classify, ActivityClassifier, InferenceError, ModelMetadata, TrainedModel, MODEL_FORMAT};
pub use label::{Label, LABEL_NAMES};
pub use training::{stratified_split, train, train_from_recording, ConfusionMatrix, TrainParams, TrainingReport};
