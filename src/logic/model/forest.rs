//! Random Forest - seeded bagged CART ensemble
//!
//! - Bootstrap sample per tree (`seed + tree_index`)
//! - Gini impurity splits over `sqrt(feature_count)` random candidates
//! - Depth limited by `max_depth`
//! - Prediction averages leaf class distributions; ties go to the smallest code

use std::collections::BTreeSet;

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::inference::{ActivityClassifier, InferenceError};

/// Nodes with fewer samples become leaves
const MIN_SAMPLES_SPLIT: usize = 2;

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Arena-allocated tree, root at index 0
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn leaf_distribution(&self, row: &[f64]) -> Option<&[f64]> {
        let mut index = 0;
        loop {
            match self.nodes.get(index)? {
                Node::Leaf { distribution } => return Some(distribution),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if *row.get(*feature)? <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Children must point forward within the arena, which rules out cycles
    fn check(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} class weights, expected {}",
                            id,
                            distribution.len(),
                            n_classes
                        ));
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {} of {}", id, feature, n_features));
                    }
                    for &child in [left, right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", id, child));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Training inputs shared by every node of one tree
struct GrowContext<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    n_classes: usize,
    max_depth: usize,
    max_features: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn best_split(ctx: &GrowContext, indices: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
    let n_features = ctx.x.ncols();
    let total = indices.len();
    let parent_counts = class_counts(ctx.y, indices, ctx.n_classes);
    let parent_impurity = gini(&parent_counts, total);

    let mut candidates = rand::seq::index::sample(rng, n_features, ctx.max_features).into_vec();
    candidates.sort_unstable();

    let mut best: Option<SplitCandidate> = None;
    let mut order = indices.to_vec();

    for feature in candidates {
        let column: ArrayView1<f64> = ctx.x.column(feature);
        order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

        let mut left_counts = vec![0usize; ctx.n_classes];
        let mut right_counts = parent_counts.clone();

        for pos in 0..total - 1 {
            let class = ctx.y[order[pos]];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let here = column[order[pos]];
            let next = column[order[pos + 1]];
            if here == next {
                continue;
            }

            let n_left = pos + 1;
            let n_right = total - n_left;
            let impurity = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / total as f64;

            let improves = impurity + 1e-12 < parent_impurity;
            let better = best.as_ref().map_or(true, |b| impurity < b.impurity);
            if improves && better {
                best = Some(SplitCandidate {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    impurity,
                });
            }
        }
    }

    best
}

fn grow(
    ctx: &GrowContext,
    nodes: &mut Vec<Node>,
    indices: &[usize],
    depth: usize,
    rng: &mut StdRng,
) -> usize {
    let id = nodes.len();
    let counts = class_counts(ctx.y, indices, ctx.n_classes);
    let total = indices.len().max(1) as f64;
    let distribution: Vec<f64> = counts.iter().map(|&c| c as f64 / total).collect();
    nodes.push(Node::Leaf { distribution });

    let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    if pure || depth >= ctx.max_depth || indices.len() < MIN_SAMPLES_SPLIT {
        return id;
    }

    let split = match best_split(ctx, indices, rng) {
        Some(split) => split,
        None => return id,
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| ctx.x[[i, split.feature]] <= split.threshold);

    let left = grow(ctx, nodes, &left_idx, depth + 1, rng);
    let right = grow(ctx, nodes, &right_idx, depth + 1, rng);
    nodes[id] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };
    id
}

// ============================================================================
// FOREST
// ============================================================================

/// Seeded random forest over a fixed-width feature matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    tree_count: usize,
    max_depth: usize,
    seed: u64,
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(tree_count: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            tree_count,
            max_depth,
            seed,
            n_features: 0,
            classes: Vec::new(),
            trees: Vec::new(),
        }
    }

    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Structural check for forests loaded from outside
    pub fn check_structure(&self) -> Result<(), String> {
        if self.trees.len() != self.tree_count {
            return Err(format!("{} trees, expected {}", self.trees.len(), self.tree_count));
        }
        if self.n_features == 0 || self.classes.is_empty() {
            return Err("forest is not fitted".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {}: {}", t, e))?;
        }
        Ok(())
    }

    /// Mean leaf distribution over all trees, aligned with `classes()`
    pub fn predict_distribution(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::NotFitted);
        }
        if row.len() != self.n_features {
            return Err(InferenceError::WidthMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        if let Some(index) = row.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite(index));
        }

        let mut votes = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let distribution = tree
                .leaf_distribution(row)
                .ok_or_else(|| InferenceError::Other("corrupt tree".to_string()))?;
            for (vote, p) in votes.iter_mut().zip(distribution) {
                *vote += p;
            }
        }
        let n = self.trees.len() as f64;
        votes.iter_mut().for_each(|v| *v /= n);
        Ok(votes)
    }
}

impl ActivityClassifier for RandomForest {
    fn fit(&mut self, features: &Array2<f64>, labels: &[i64]) -> Result<(), InferenceError> {
        let (n_rows, n_features) = features.dim();
        if n_rows == 0 {
            return Err(InferenceError::Other("empty training set".to_string()));
        }
        if labels.len() != n_rows {
            return Err(InferenceError::Other(format!(
                "{} labels for {} rows",
                labels.len(),
                n_rows
            )));
        }
        if n_features == 0 {
            return Err(InferenceError::WidthMismatch {
                expected: 1,
                actual: 0,
            });
        }
        if self.tree_count == 0 || self.max_depth == 0 {
            return Err(InferenceError::Other("tree_count and max_depth must be positive".to_string()));
        }

        let classes: Vec<i64> = labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let y: Vec<usize> = labels
            .iter()
            .map(|code| classes.binary_search(code).unwrap_or(0))
            .collect();

        let max_features = ((n_features as f64).sqrt().floor() as usize).clamp(1, n_features);
        let ctx = GrowContext {
            x: features,
            y: &y,
            n_classes: classes.len(),
            max_depth: self.max_depth,
            max_features,
        };

        let mut trees = Vec::with_capacity(self.tree_count);
        for t in 0..self.tree_count {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
            let bootstrap: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let mut nodes = Vec::new();
            grow(&ctx, &mut nodes, &bootstrap, 0, &mut rng);
            trees.push(DecisionTree { nodes });
        }

        log::debug!(
            "Fitted {} trees (depth ≤ {}) on {} rows × {} features, {} classes",
            trees.len(),
            self.max_depth,
            n_rows,
            n_features,
            classes.len()
        );

        self.n_features = n_features;
        self.classes = classes;
        self.trees = trees;
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Result<i64, InferenceError> {
        let votes = self.predict_distribution(row)?;
        let mut best = 0;
        for (i, &v) in votes.iter().enumerate() {
            if v > votes[best] {
                best = i;
            }
        }
        self.classes
            .get(best)
            .copied()
            .ok_or(InferenceError::NotFitted)
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
