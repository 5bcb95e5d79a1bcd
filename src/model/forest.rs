//! Bootstrap random forest of CART trees (Gini impurity) over dense f64 features.
//! Labels are class indices `0..n_classes`; the caller owns the index → label mapping.

use crate::config::ClassifierConfig;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: Option<usize>,
    pub random_state: u64,
}

impl From<&ClassifierConfig> for ForestParams {
    fn from(c: &ClassifierConfig) -> Self {
        Self {
            n_estimators: c.n_estimators,
            max_depth: c.max_depth,
            min_samples_split: c.min_samples_split,
            max_features: c.max_features,
            random_state: c.random_state,
        }
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: usize,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[f64], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>()
}

impl<'a> TreeBuilder<'a> {
    fn class_counts(&self, idx: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in idx {
            counts[self.y[i]] += 1.0;
        }
        counts
    }

    fn leaf(&mut self, counts: Vec<f64>, n: usize) -> usize {
        let n = n.max(1) as f64;
        let proba = counts.into_iter().map(|c| c / n).collect();
        self.nodes.push(Node::Leaf { proba });
        self.nodes.len() - 1
    }

    fn build(&mut self, idx: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let counts = self.class_counts(&idx);
        let pure = counts.iter().filter(|c| **c > 0.0).count() <= 1;
        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
        if pure || depth_reached || idx.len() < self.min_samples_split {
            return self.leaf(counts, idx.len());
        }

        let Some(split) = self.best_split(&idx, &counts, rng) else {
            return self.leaf(counts, idx.len());
        };

        let x = self.x;
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
            .into_iter()
            .partition(|&i| x[[i, split.feature]] <= split.threshold);

        let at = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: Vec::new() });
        let left = self.build(left_idx, depth + 1, rng);
        let right = self.build(right_idx, depth + 1, rng);
        self.nodes[at] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        at
    }

    fn best_split(&self, idx: &[usize], parent: &[f64], rng: &mut StdRng) -> Option<BestSplit> {
        let n = idx.len() as f64;
        let parent_impurity = gini(parent, n);
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(idx.len());

        for feature in features {
            if visited >= self.max_features {
                break;
            }
            column.clear();
            column.extend(idx.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            if column.first().map(|c| c.0) == column.last().map(|c| c.0) {
                // constant here; does not count against max_features
                continue;
            }
            visited += 1;

            let mut left = vec![0.0; self.n_classes];
            let mut right = parent.to_vec();
            for k in 1..column.len() {
                let (prev, class) = column[k - 1];
                left[class] += 1.0;
                right[class] -= 1.0;
                let cur = column[k].0;
                if prev >= cur {
                    continue;
                }
                let nl = k as f64;
                let nr = n - nl;
                let impurity = (nl * gini(&left, nl) + nr * gini(&right, nr)) / n;
                if impurity < parent_impurity && best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = prev + (cur - prev) / 2.0;
                    if threshold >= cur || !threshold.is_finite() {
                        threshold = prev;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    fn fit<'a>(
        x: ArrayView2<'a, f64>,
        y: &'a [usize],
        sample: Vec<usize>,
        n_classes: usize,
        params: &ForestParams,
        max_features: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            n_classes,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            max_features,
            nodes: Vec::new(),
        };
        builder.build(sample, 0, rng);
        Self {
            nodes: builder.nodes,
        }
    }

    fn leaf_proba(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { proba } => return proba,
            }
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i}: feature {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i}: non-finite threshold"));
                    }
                    // children always follow their parent, so this also rules out cycles
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i}: bad child index {child}"));
                        }
                    }
                }
                Node::Leaf { proba } => {
                    if proba.len() != n_classes {
                        return Err(format!("node {i}: {} class probabilities, expected {n_classes}", proba.len()));
                    }
                }
            }
        }
        Ok(())
    }
}

impl RandomForest {
    /// Fit on `x` (rows = samples) with class indices `y`. Both must be non-empty and equal length.
    pub fn fit<'a>(x: ArrayView2<'a, f64>, y: &'a [usize], n_classes: usize, params: &ForestParams) -> Self {
        let n = x.nrows();
        let n_features = x.ncols();
        let max_features = params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .clamp(1, n_features.max(1));
        let mut rng = StdRng::seed_from_u64(params.random_state);

        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let sample: Vec<usize> = (0..n).map(|_| tree_rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, sample, n_classes, params, max_features, &mut tree_rng)
            })
            .collect();

        Self {
            n_features,
            n_classes,
            trees,
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of per-tree leaf class frequencies; one row per sample.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        let weight = 1.0 / self.trees.len().max(1) as f64;
        for (row, mut acc) in x.rows().into_iter().zip(out.rows_mut()) {
            for tree in &self.trees {
                for (a, p) in acc.iter_mut().zip(tree.leaf_proba(row)) {
                    *a += p * weight;
                }
            }
        }
        out
    }

    /// Argmax class index per row; ties go to the lowest index.
    pub fn predict(&self, x: ArrayView2<f64>) -> Vec<usize> {
        self.predict_proba(x)
            .rows()
            .into_iter()
            .map(|p| argmax(p.iter().copied()))
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        if self.n_classes == 0 {
            return Err("forest has no classes".into());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| format!("tree {t}: {e}"))?;
        }
        Ok(())
    }
}

pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_v = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_v {
            best = i;
            best_v = v;
        }
    }
    best
}
