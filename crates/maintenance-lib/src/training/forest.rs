//! Random forest regression
//!
//! Bootstrap-aggregated CART trees grown on variance reduction. Trees are
//! fitted in parallel; each one draws its bootstrap sample from its own
//! generator seeded from the forest seed and the tree index, so a fit is
//! reproducible regardless of thread scheduling.

use crate::error::{MaintenanceError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(20),
            min_samples_split: 5,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(MaintenanceError::invalid("n_estimators must be positive"));
        }
        if self.min_samples_split < 2 {
            return Err(MaintenanceError::invalid("min_samples_split must be at least 2"));
        }
        if self.min_samples_leaf == 0 {
            return Err(MaintenanceError::invalid("min_samples_leaf must be positive"));
        }
        if self.max_depth == Some(0) {
            return Err(MaintenanceError::invalid("max_depth must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single regression tree stored as a flat node array; node 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(0, 0)];
        while let Some((idx, depth)) = pending.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => deepest = deepest.max(depth),
                Node::Split { left, right, .. } => {
                    pending.push((*left, depth + 1));
                    pending.push((*right, depth + 1));
                }
            }
        }
        deepest
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    params: &'a ForestParams,
    nodes: Vec<Node>,
    /// Accumulated SSE decrease per feature
    importances: Vec<f64>,
    scratch: Vec<(f64, f64)>,
}

impl<'a> TreeBuilder<'a> {
    fn new(x: &'a [Vec<f64>], y: &'a [f64], params: &'a ForestParams, n_features: usize) -> Self {
        Self {
            x,
            y,
            params,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
            scratch: Vec::new(),
        }
    }

    /// Grow the tree depth-first from an explicit stack of `(node, start, end, depth)`
    /// ranges over `indices`, so unlimited depth never deepens the call stack
    fn build(&mut self, indices: &mut [usize]) {
        let root = self.leaf(indices);
        self.nodes.push(root);
        let mut pending = vec![(0, 0, indices.len(), 0)];

        while let Some((node_id, start, end, depth)) = pending.pop() {
            let rows = &mut indices[start..end];
            let Some(split) = self.split_for(rows, depth) else {
                continue;
            };

            let x = self.x;
            let mid = start + partition(rows, |i| x[i][split.feature] <= split.threshold);
            let left = self.nodes.len();
            let left_leaf = self.leaf(&indices[start..mid]);
            let right_leaf = self.leaf(&indices[mid..end]);
            self.nodes.push(left_leaf);
            self.nodes.push(right_leaf);

            self.importances[split.feature] += split.gain;
            self.nodes[node_id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right: left + 1,
            };

            // left subtree is expanded first
            pending.push((left + 1, mid, end, depth + 1));
            pending.push((left, start, mid, depth + 1));
        }
    }

    fn leaf(&self, rows: &[usize]) -> Node {
        let sum: f64 = rows.iter().map(|&i| self.y[i]).sum();
        Node::Leaf {
            value: sum / rows.len() as f64,
        }
    }

    /// Split for a node, or `None` when it stays a leaf
    fn split_for(&mut self, rows: &[usize], depth: usize) -> Option<BestSplit> {
        let depth_reached = self.params.max_depth.map_or(false, |d| depth >= d);
        if depth_reached || rows.len() < self.params.min_samples_split {
            return None;
        }

        let n = rows.len() as f64;
        let sum: f64 = rows.iter().map(|&i| self.y[i]).sum();
        let sum_sq: f64 = rows.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let node_sse = sum_sq - sum * sum / n;
        if node_sse <= 1e-12 {
            return None;
        }
        self.best_split(rows, node_sse)
    }

    fn best_split(&mut self, indices: &[usize], node_sse: f64) -> Option<BestSplit> {
        let min_leaf = self.params.min_samples_leaf;
        let n = indices.len();
        let mut best: Option<BestSplit> = None;

        for feature in 0..self.importances.len() {
            self.scratch.clear();
            self.scratch
                .extend(indices.iter().map(|&i| (self.x[i][feature], self.y[i])));
            self.scratch
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let total: f64 = self.scratch.iter().map(|p| p.1).sum();
            let total_sq: f64 = self.scratch.iter().map(|p| p.1 * p.1).sum();
            let (mut left_sum, mut left_sq) = (0.0, 0.0);

            for k in 1..n {
                let (prev_value, prev_y) = self.scratch[k - 1];
                left_sum += prev_y;
                left_sq += prev_y * prev_y;

                let value = self.scratch[k].0;
                if value <= prev_value || k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let nl = k as f64;
                let nr = (n - k) as f64;
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);
                let gain = node_sse - sse;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (prev_value + value) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// Move indices satisfying `pred` to the front; returns how many did
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for j in 0..indices.len() {
        if pred(indices[j]) {
            indices.swap(mid, j);
            mid += 1;
        }
    }
    mid
}

/// Ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Result<Self> {
        params.validate()?;
        if x.is_empty() {
            return Err(MaintenanceError::invalid("cannot fit forest on zero rows"));
        }
        if x.len() != y.len() {
            return Err(MaintenanceError::invalid(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(MaintenanceError::invalid("feature rows have inconsistent widths"));
        }

        let fitted: Vec<(RegressionTree, Vec<f64>)> = (0..params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let mut bootstrap: Vec<usize> =
                    (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();

                let mut builder = TreeBuilder::new(x, y, params, n_features);
                builder.build(&mut bootstrap);
                let tree = RegressionTree {
                    nodes: builder.nodes,
                };
                (tree, normalize(builder.importances))
            })
            .collect();

        let mut feature_importances = vec![0.0; n_features];
        for (_, importances) in &fitted {
            for (acc, v) in feature_importances.iter_mut().zip(importances) {
                *acc += v;
            }
        }
        let feature_importances = normalize(feature_importances);
        let trees: Vec<RegressionTree> = fitted.into_iter().map(|(t, _)| t).collect();

        debug!(
            trees = trees.len(),
            features = n_features,
            rows = x.len(),
            nodes = trees.iter().map(RegressionTree::node_count).sum::<usize>(),
            "Random forest fitted"
        );

        Ok(Self {
            params: params.clone(),
            n_features,
            trees,
            feature_importances,
        })
    }

    /// Mean of the per-tree predictions
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(MaintenanceError::invalid(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        if self.trees.is_empty() {
            return Err(MaintenanceError::NotFitted("random forest has no trees"));
        }
        let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok(total / self.trees.len() as f64)
    }

    pub fn predict_all(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    /// Impurity-based importances, summing to 1 (all zero if no split was made)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

fn normalize(mut values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    }
    values
}
