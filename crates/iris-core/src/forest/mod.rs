//! Random forest ensemble
//!
//! Bootstrap-aggregated CART trees with per-split feature subsampling.
//! Every random draw comes from one `ChaCha8Rng` seeded by
//! [`ForestParams::seed`], so fitting the same data twice yields identical trees.

mod tree;

pub use tree::{DecisionTree, Node, TreeParams};

use crate::dataset::LabeledSample;
use crate::error::{ClassifierError, TrainingError};
use crate::models::{NUM_FEATURES, NUM_SPECIES};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of trees in the ensemble
pub const DEFAULT_N_TREES: usize = 100;

/// Default seed for forest fitting
pub const DEFAULT_FOREST_SEED: u64 = 42;

/// Hyperparameters for fitting a forest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// Features considered per split; defaults to floor(sqrt(NUM_FEATURES))
    pub max_features: Option<usize>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_N_TREES,
            max_features: None,
            max_depth: None,
            min_samples_split: 2,
            bootstrap: true,
            seed: DEFAULT_FOREST_SEED,
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        let default_features = (NUM_FEATURES as f64).sqrt().floor() as usize;
        TreeParams {
            max_features: self
                .max_features
                .unwrap_or(default_features)
                .clamp(1, NUM_FEATURES),
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split.max(2),
        }
    }
}

/// A fitted ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(samples: &[LabeledSample], params: ForestParams) -> Result<Self, TrainingError> {
        if samples.is_empty() {
            return Err(TrainingError::Dataset("no training samples".to_string()));
        }
        if params.n_trees == 0 {
            return Err(TrainingError::Config("n_trees must be at least 1".to_string()));
        }

        let tree_params = params.tree_params();
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let n = samples.len();

        let trees = (0..params.n_trees)
            .map(|_| {
                let indices: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(samples, &indices, &tree_params, &mut rng)
            })
            .collect::<Vec<_>>();

        debug!(
            n_trees = trees.len(),
            total_nodes = trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            "Fitted random forest"
        );

        Ok(Self { params, trees })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean of the per-tree leaf distributions
    pub fn predict_proba(
        &self,
        x: &[f64; NUM_FEATURES],
    ) -> Result<[f64; NUM_SPECIES], ClassifierError> {
        if self.trees.is_empty() {
            return Err(ClassifierError::EmptyModel);
        }

        let mut sum = [0.0; NUM_SPECIES];
        for (i, tree) in self.trees.iter().enumerate() {
            let distribution = tree.predict_proba(x).ok_or_else(|| {
                ClassifierError::MalformedOutput(format!("tree {i} has a broken node arena"))
            })?;
            for (s, d) in sum.iter_mut().zip(distribution) {
                *s += d;
            }
        }

        let n = self.trees.len() as f64;
        Ok(sum.map(|s| s / n))
    }

    /// Index of the first maximal probability
    pub fn predict(&self, x: &[f64; NUM_FEATURES]) -> Result<usize, ClassifierError> {
        let proba = self.predict_proba(x)?;
        let mut best = 0;
        for i in 1..NUM_SPECIES {
            if proba[i] > proba[best] {
                best = i;
            }
        }
        Ok(best)
    }
}
