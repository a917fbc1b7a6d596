//! Feature Table - one feature vector per planned window

use ndarray::Array2;

use super::layout::FEATURE_COUNT;
use super::vector::{FeatureExtractor, FeatureVector};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::sample::Sample;
use crate::logic::segment::{Segmenter, WindowBounds};

/// Feature vectors with the window bounds they came from
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
    bounds: Vec<WindowBounds>,
}

impl FeatureTable {
    /// Segment `samples` and extract every window.
    ///
    /// Fails with `InsufficientData` when no full window fits.
    pub fn build(
        samples: &[Sample],
        segmenter: &Segmenter,
        extractor: &impl FeatureExtractor,
    ) -> PipelineResult<Self> {
        let plan = segmenter.require_plan(samples.len())?;

        let mut rows = Vec::with_capacity(plan.len());
        for bounds in &plan {
            rows.push(extractor.extract(&samples[bounds.start..bounds.end])?);
        }

        log::debug!(
            "Extracted {} windows (size {}, stride {}) from {} samples",
            rows.len(),
            segmenter.window_size(),
            segmenter.stride(),
            samples.len()
        );

        Ok(Self { rows, bounds: plan })
    }

    /// Table from precomputed rows (no window bounds)
    pub fn from_rows(rows: Vec<FeatureVector>) -> Self {
        Self {
            rows,
            bounds: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn bounds(&self) -> &[WindowBounds] {
        &self.bounds
    }

    /// `len × FEATURE_COUNT` matrix
    pub fn matrix(&self) -> PipelineResult<Array2<f64>> {
        let mut flat = Vec::with_capacity(self.rows.len() * FEATURE_COUNT);
        for (i, row) in self.rows.iter().enumerate() {
            if row.values.len() != FEATURE_COUNT {
                return Err(PipelineError::Schema {
                    column: "features".to_string(),
                    context: format!("row {} has {} values, expected {}", i, row.values.len(), FEATURE_COUNT),
                });
            }
            flat.extend_from_slice(&row.values);
        }

        Array2::from_shape_vec((self.rows.len(), FEATURE_COUNT), flat)
            .map_err(|e| PipelineError::Model(format!("feature matrix shape error: {}", e)))
    }

    /// Class label of every row; any unlabelled row is a schema error
    pub fn labels(&self) -> PipelineResult<Vec<i64>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.class.ok_or_else(|| PipelineError::Schema {
                    column: "class".to_string(),
                    context: format!("is missing for window {}", i),
                })
            })
            .collect()
    }
}
