//! Isolation forest anomaly ensemble.
//!
//! Each tree isolates points of a random subsample by recursive random
//! axis-aligned splits. Anomalies are isolated after fewer splits, so the
//! average path length of a sample, normalized by the expected path length
//! of an unsuccessful BST search, yields the score
//! `-2^(-E[h(x)] / c(max_samples))`. Scores lie in `[-1, 0)`; lower is more
//! anomalous.
//!
//! Training is deterministic for a given seed: one sub-seed per tree is drawn
//! from a `ChaCha8Rng` before the trees are fitted in parallel, so the result
//! does not depend on the number of worker threads.

use rand::seq::index::sample;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use scatter_core::config::{Contamination, TrainingConfig};
use scatter_core::ScatterError;

use crate::matrix::FeatureMatrix;
use crate::parallel::ParallelMap;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Threshold offset used with `Contamination::Auto`.
const AUTO_OFFSET: f64 = -0.5;

/// Prediction derived from the decision function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Normal,
    Anomalous,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree, stored as an arena of nodes rooted at index 0.
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn fit(data: &FeatureMatrix, sample_size: usize, max_depth: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let indices = sample(&mut rng, data.n_rows(), sample_size).into_vec();
        let mut tree = IsolationTree { nodes: Vec::new() };
        tree.grow(data, indices, 0, max_depth, &mut rng);
        tree
    }

    /// Grow the subtree for `indices` and return its node index.
    fn grow(
        &mut self,
        data: &FeatureMatrix,
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });

        if indices.len() <= 1 || depth >= max_depth {
            return id;
        }

        // Draw features without replacement until one is non-constant here.
        let mut features: Vec<usize> = (0..data.n_cols()).collect();
        features.shuffle(rng);

        for feature in features {
            let (lo, hi) = indices
                .iter()
                .map(|&i| data.get(i, feature))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if hi <= lo {
                continue;
            }

            let threshold = split_threshold(lo, hi, rng.gen::<f64>());
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| data.get(i, feature) <= threshold);

            let left = self.grow(data, left_idx, depth + 1, max_depth, rng);
            let right = self.grow(data, right_idx, depth + 1, max_depth, rng);
            self.nodes[id] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };
            return id;
        }

        // Every feature is constant: the remaining points are inseparable.
        id
    }

    fn path_length(&self, x: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(*size),
            }
        }
    }
}

/// Uniform split point in `[lo, hi)` for `u` in `[0, 1)`.
///
/// Interpolates instead of computing `hi - lo`, which overflows to infinity
/// for finite bounds of opposite sign near `f64::MAX`.
fn split_threshold(lo: f64, hi: f64, u: f64) -> f64 {
    let t = lo * (1.0 - u) + hi * u;
    if t < hi {
        t.max(lo)
    } else {
        lo
    }
}

/// Trained isolation forest. Immutable; safe to share across threads.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit a forest on `data`.
    ///
    /// The subsample per tree is `min(config.max_samples, n_rows)`; tree depth
    /// is capped at `ceil(log2(subsample))`. With a contamination fraction the
    /// decision offset is that percentile of the training scores.
    pub fn fit<P: ParallelMap>(
        data: &FeatureMatrix,
        config: &TrainingConfig,
        mapper: &P,
    ) -> Result<Self, ScatterError> {
        config.validate()?;

        let sample_size = config.max_samples.min(data.n_rows());
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut master = ChaCha8Rng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_estimators).map(|_| master.gen()).collect();

        let trees = mapper.map(&seeds, |&seed| {
            IsolationTree::fit(data, sample_size, max_depth, seed)
        });

        let mut forest = IsolationForest {
            trees,
            sample_size,
            n_features: data.n_cols(),
            offset: AUTO_OFFSET,
        };

        if let Contamination::Fraction(fraction) = config.contamination {
            let training_scores = forest.score_samples(data)?;
            forest.offset = percentile(&training_scores, 100.0 * fraction);
        }

        Ok(forest)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Decision threshold on the raw score.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Opposite of the anomaly score of a single sample. Lower is more anomalous.
    pub fn score_one(&self, x: &[f64]) -> f64 {
        let mean_depth =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let normalizer = average_path_length(self.sample_size);
        // A single-row subsample has no expected depth; treat every path as average.
        let relative_depth = if normalizer > 0.0 { mean_depth / normalizer } else { 1.0 };
        -(2.0_f64).powf(-relative_depth)
    }

    /// Score every row of `data`.
    pub fn score_samples(&self, data: &FeatureMatrix) -> Result<Vec<f64>, ScatterError> {
        self.check_width(data)?;
        Ok(data.rows().map(|row| self.score_one(row)).collect())
    }

    /// `score - offset`; negative values are outliers.
    pub fn decision_function(&self, data: &FeatureMatrix) -> Result<Vec<f64>, ScatterError> {
        Ok(self
            .score_samples(data)?
            .into_iter()
            .map(|s| s - self.offset)
            .collect())
    }

    pub fn predict(&self, data: &FeatureMatrix) -> Result<Vec<Label>, ScatterError> {
        Ok(self
            .decision_function(data)?
            .into_iter()
            .map(|d| self.label_for_decision(d))
            .collect())
    }

    /// Label a raw score against this forest's offset.
    pub fn label(&self, score: f64) -> Label {
        self.label_for_decision(score - self.offset)
    }

    fn label_for_decision(&self, decision: f64) -> Label {
        if decision < 0.0 {
            Label::Anomalous
        } else {
            Label::Normal
        }
    }

    fn check_width(&self, data: &FeatureMatrix) -> Result<(), ScatterError> {
        if data.n_cols() != self.n_features {
            return Err(ScatterError::DimensionMismatch {
                expected: self.n_features,
                found: data.n_cols(),
            });
        }
        Ok(())
    }
}

/// Expected path length of an unsuccessful search in a BST of `n` nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
