//! Training - stratified hold-out fit + evaluation
//!
//! Windows are split per class with a fixed seed; only `fit_fraction` of each
//! class is used for fitting, the rest is held out for the accuracy and
//! confusion matrix.

use std::collections::BTreeMap;

use ndarray::Axis;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use super::inference::{ActivityClassifier, TrainedModel};
use super::label::Label;
use crate::constants::{DEFAULT_FIT_FRACTION, DEFAULT_MAX_DEPTH, DEFAULT_SEED, DEFAULT_TREE_COUNT};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::dataset::Recording;
use crate::logic::features::{FeatureTable, StatisticalExtractor};
use crate::logic::segment::Segmenter;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Forest and split parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    pub tree_count: usize,
    pub max_depth: usize,
    /// Share of each class used for fitting; the remainder is held out
    pub fit_fraction: f64,
    pub seed: u64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            tree_count: DEFAULT_TREE_COUNT,
            max_depth: DEFAULT_MAX_DEPTH,
            fit_fraction: DEFAULT_FIT_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl TrainParams {
    fn check(&self) -> PipelineResult<()> {
        if self.tree_count == 0 {
            return Err(PipelineError::InvalidConfig("tree_count must be positive".to_string()));
        }
        if self.max_depth == 0 {
            return Err(PipelineError::InvalidConfig("max_depth must be positive".to_string()));
        }
        if !(self.fit_fraction > 0.0 && self.fit_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "fit_fraction must be in (0, 1), got {}",
                self.fit_fraction
            )));
        }
        Ok(())
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Rows are true labels, columns predicted labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    /// Display names in `codes` order
    pub labels: Vec<String>,
    /// Sorted class codes present in the full dataset
    pub codes: Vec<i64>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(codes: Vec<i64>) -> Self {
        let n = codes.len();
        Self {
            labels: codes.iter().map(|c| Label::from_code(*c).name().into_owned()).collect(),
            codes,
            counts: vec![vec![0; n]; n],
        }
    }

    /// Record one outcome; codes outside the matrix are ignored
    pub fn record(&mut self, actual: i64, predicted: i64) {
        let row = self.codes.binary_search(&actual);
        let col = self.codes.binary_search(&predicted);
        if let (Ok(row), Ok(col)) = (row, col) {
            self.counts[row][col] += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.codes.len()).map(|i| self.counts[i][i]).sum()
    }
}

/// Outcome of one training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    #[serde(skip)]
    pub model: TrainedModel,
    /// Hold-out accuracy in `[0, 1]`
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub fit_windows: usize,
    pub eval_windows: usize,
}

// ============================================================================
// SPLIT
// ============================================================================

/// Per-class shuffled split → (fit, eval) row indices, each sorted.
///
/// Every class with at least two rows contributes to both sides; a
/// singleton class goes to the fit side.
pub fn stratified_split(labels: &[i64], fit_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut fit = Vec::new();
    let mut eval = Vec::new();
    for (_, mut rows) in groups {
        rows.shuffle(&mut rng);
        let n = rows.len();
        let n_fit = if n == 1 {
            1
        } else {
            ((n as f64 * fit_fraction).round() as usize).clamp(1, n - 1)
        };
        fit.extend_from_slice(&rows[..n_fit]);
        eval.extend_from_slice(&rows[n_fit..]);
    }

    fit.sort_unstable();
    eval.sort_unstable();
    (fit, eval)
}

// ============================================================================
// TRAIN
// ============================================================================

/// Fit on a labelled feature table and score the held-out windows
pub fn train(table: &FeatureTable, params: &TrainParams) -> PipelineResult<TrainingReport> {
    params.check()?;
    let labels = table.labels()?;
    let matrix = table.matrix()?;

    let (fit_idx, eval_idx) = stratified_split(&labels, params.fit_fraction, params.seed);
    if fit_idx.is_empty() || eval_idx.is_empty() {
        return Err(PipelineError::InsufficientData {
            available: labels.len(),
            required: 2,
            unit: "windows",
        });
    }

    log::info!(
        "Training on {} windows, holding out {} (fit fraction {:.2}, seed {})",
        fit_idx.len(),
        eval_idx.len(),
        params.fit_fraction,
        params.seed
    );

    let fit_x = matrix.select(Axis(0), &fit_idx);
    let fit_y: Vec<i64> = fit_idx.iter().map(|&i| labels[i]).collect();

    let mut forest = RandomForest::new(params.tree_count, params.max_depth, params.seed);
    forest
        .fit(&fit_x, &fit_y)
        .map_err(|e| PipelineError::Model(format!("fit failed: {}", e)))?;

    let mut codes: Vec<i64> = labels.clone();
    codes.sort_unstable();
    codes.dedup();
    let mut confusion = ConfusionMatrix::new(codes);

    for &i in &eval_idx {
        let row = matrix.row(i);
        let predicted = match row.as_slice() {
            Some(slice) => forest.predict_row(slice),
            None => forest.predict_row(&row.to_vec()),
        }
        .map_err(|source| PipelineError::Prediction {
            window: table.bounds().get(i).copied(),
            source,
        })?;
        confusion.record(labels[i], predicted);
    }

    let accuracy = confusion.correct() as f64 / eval_idx.len() as f64;
    log::info!(
        "Hold-out accuracy {:.2}% ({}/{})",
        accuracy * 100.0,
        confusion.correct(),
        eval_idx.len()
    );

    Ok(TrainingReport {
        model: TrainedModel::new(forest, accuracy)?,
        accuracy,
        confusion,
        fit_windows: fit_idx.len(),
        eval_windows: eval_idx.len(),
    })
}

/// Segment (drop-remainder), extract and train.
///
/// `time` and `detail` are not features; `class` is required.
pub fn train_from_recording(
    recording: &Recording,
    window_size: usize,
    stride: usize,
    params: &TrainParams,
) -> PipelineResult<TrainingReport> {
    recording.require_labels()?;
    let segmenter = Segmenter::finite(window_size, stride)?;
    let table = FeatureTable::build(recording.samples(), &segmenter, &StatisticalExtractor::new())?;
    train(&table, params)
}
