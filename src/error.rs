//! Error handling

use thiserror::Error;

use crate::logic::model::InferenceError;
use crate::logic::segment::WindowBounds;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by training, batch evaluation and model I/O.
///
/// Streaming never returns these for per-sample problems; see
/// [`crate::logic::stream::SourceError`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required column/channel missing or unreadable
    #[error("schema error: column '{column}' {context}")]
    Schema { column: String, context: String },

    /// Finite dataset too short (fewer samples than one window, or too few
    /// windows to hold out an evaluation set)
    #[error("insufficient data: {available} {unit} available, at least {required} required")]
    InsufficientData {
        available: usize,
        required: usize,
        unit: &'static str,
    },

    /// Classifier invocation failed
    #[error("prediction failed{}: {source}", describe_window(.window))]
    Prediction {
        window: Option<WindowBounds>,
        #[source]
        source: InferenceError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_window(window: &Option<WindowBounds>) -> String {
    match window {
        Some(w) => format!(" for window [{}, {})", w.start, w.end),
        None => String::new(),
    }
}

impl PipelineError {
    /// Segmentation could not produce a single window
    pub fn no_window(available: usize, window_size: usize) -> Self {
        PipelineError::InsufficientData {
            available,
            required: window_size,
            unit: "samples",
        }
    }

    pub fn missing_column(column: &str) -> Self {
        PipelineError::Schema {
            column: column.to_string(),
            context: "is required but absent".to_string(),
        }
    }

    pub fn bad_cell(column: &str, row: usize, value: &str) -> Self {
        PipelineError::Schema {
            column: column.to_string(),
            context: format!("has unreadable value '{}' at row {}", value, row),
        }
    }
}
