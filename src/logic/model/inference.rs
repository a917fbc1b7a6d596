//! Inference Engine - Classifier Adapter
//!
//! The pipeline only sees [`ActivityClassifier`]; the concrete algorithm
//! (a seeded random forest) sits behind it and travels as an opaque,
//! checksummed byte blob.

use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use super::forest::RandomForest;
use super::label::Label;
use crate::constants::APP_VERSION;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::{layout::layout_hash, FeatureVector, FEATURE_COUNT, FEATURE_VERSION};
use crate::logic::segment::WindowBounds;

/// Blob format tag
pub const MODEL_FORMAT: &str = "motion-sense/forest-v1";

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Lower-level classifier failure, wrapped into `PipelineError::Prediction`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("feature vector layout does not match the model")]
    LayoutMismatch,

    #[error("model has not been fitted")]
    NotFitted,

    #[error("feature {0} is not finite")]
    NonFinite(usize),

    #[error("{0}")]
    Other(String),
}

// ============================================================================
// CLASSIFIER SEAM
// ============================================================================

/// Fit/predict contract the pipeline depends on
pub trait ActivityClassifier {
    /// Fit on a `rows × features` matrix with one class code per row
    fn fit(&mut self, features: &Array2<f64>, labels: &[i64]) -> Result<(), InferenceError>;

    /// Class code for one feature row
    fn predict_row(&self, row: &[f64]) -> Result<i64, InferenceError>;

    /// Sorted class codes seen during fit
    fn classes(&self) -> &[i64];

    fn is_fitted(&self) -> bool;
}

/// Score one feature vector, wrapping failures with the window they came from
pub fn classify<C: ActivityClassifier + ?Sized>(
    classifier: &C,
    vector: &FeatureVector,
    window: Option<WindowBounds>,
) -> PipelineResult<Label> {
    let result = if vector.is_compatible() {
        classifier.predict_row(vector.as_slice())
    } else {
        Err(InferenceError::LayoutMismatch)
    };

    result
        .map(Label::from_code)
        .map_err(|source| PipelineError::Prediction { window, source })
}

// ============================================================================
// TRAINED MODEL
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub feature_count: usize,
    pub classes: Vec<i64>,
    pub tree_count: usize,
    pub max_depth: usize,
    pub seed: u64,
    /// Hold-out accuracy in `[0, 1]`
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
    pub app_version: String,
}

/// Fitted forest plus metadata; the unit that is saved and loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub metadata: ModelMetadata,
    forest: RandomForest,
}

#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    format: String,
    checksum: String,
    payload: String,
}

fn checksum(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

impl TrainedModel {
    /// Wrap a fitted forest
    pub fn new(forest: RandomForest, accuracy: f64) -> PipelineResult<Self> {
        if !forest.is_fitted() {
            return Err(PipelineError::Model("forest has not been fitted".to_string()));
        }
        let metadata = ModelMetadata {
            model_id: Uuid::new_v4(),
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            feature_count: forest.n_features(),
            classes: forest.classes().to_vec(),
            tree_count: forest.tree_count(),
            max_depth: forest.max_depth(),
            seed: forest.seed(),
            accuracy,
            trained_at: Utc::now(),
            app_version: APP_VERSION.to_string(),
        };
        Ok(Self { metadata, forest })
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Stateless prediction for one feature vector
    pub fn predict(&self, vector: &FeatureVector) -> PipelineResult<Label> {
        classify(self, vector, None)
    }

    pub fn to_bytes(&self) -> PipelineResult<Vec<u8>> {
        let payload = serde_json::to_string(self)?;
        let envelope = ModelEnvelope {
            format: MODEL_FORMAT.to_string(),
            checksum: checksum(payload.as_bytes()),
            payload,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// Parse a blob, rejecting corruption and feature-layout drift
    pub fn from_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        let envelope: ModelEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::Model(format!("malformed model blob: {}", e)))?;

        if envelope.format != MODEL_FORMAT {
            return Err(PipelineError::Model(format!(
                "unsupported model format '{}'",
                envelope.format
            )));
        }
        if checksum(envelope.payload.as_bytes()) != envelope.checksum {
            return Err(PipelineError::Model("checksum mismatch".to_string()));
        }

        let model: TrainedModel = serde_json::from_str(&envelope.payload)
            .map_err(|e| PipelineError::Model(format!("malformed model payload: {}", e)))?;

        let meta = &model.metadata;
        if meta.feature_version != FEATURE_VERSION
            || meta.layout_hash != layout_hash()
            || meta.feature_count != FEATURE_COUNT
        {
            return Err(PipelineError::Model(format!(
                "feature layout mismatch: model v{} hash {:08x}, runtime v{} hash {:08x}",
                meta.feature_version,
                meta.layout_hash,
                FEATURE_VERSION,
                layout_hash()
            )));
        }

        model
            .forest
            .check_structure()
            .map_err(|e| PipelineError::Model(format!("corrupt forest: {}", e)))?;
        if model.forest.n_features() != FEATURE_COUNT {
            return Err(PipelineError::Model(format!(
                "forest expects {} features, runtime produces {}",
                model.forest.n_features(),
                FEATURE_COUNT
            )));
        }

        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?)?;
        log::info!("Model {} saved to {}", self.metadata.model_id, path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let model = Self::from_bytes(&std::fs::read(path)?)?;
        log::info!(
            "Model {} loaded from {} ({} trees, classes {:?})",
            model.metadata.model_id,
            path.display(),
            model.metadata.tree_count,
            model.metadata.classes
        );
        Ok(model)
    }
}

impl ActivityClassifier for TrainedModel {
    fn fit(&mut self, features: &Array2<f64>, labels: &[i64]) -> Result<(), InferenceError> {
        self.forest.fit(features, labels)?;
        self.metadata.classes = self.forest.classes().to_vec();
        self.metadata.feature_count = self.forest.n_features();
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Result<i64, InferenceError> {
        self.forest.predict_row(row)
    }

    fn classes(&self) -> &[i64] {
        self.forest.classes()
    }

    fn is_fitted(&self) -> bool {
        self.forest.is_fitted()
    }
}
