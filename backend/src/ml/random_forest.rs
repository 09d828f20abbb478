//! Random forest classifier.
//!
//! Bagged ensemble of [`DecisionTree`]s. Each tree is grown on a bootstrap
//! sample with a random feature subset per split; prediction averages the
//! trees' leaf class distributions.
//!
//! Training is embarrassingly parallel: trees are grown on the rayon pool,
//! each with its own RNG seeded from the master seed, so a given seed always
//! produces the same forest regardless of thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::decision_tree::{argmax, Dataset, DecisionTree, TreeParams};

/// Ensemble hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeParams::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

/// A Random Forest classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

/// Result of Random Forest prediction with the averaged distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct RfPrediction {
    /// Class with the highest mean probability.
    pub class: usize,
    /// Mean class probabilities across trees.
    pub probabilities: Vec<f64>,
    /// Probability of the predicted class.
    pub confidence: f64,
}

impl RandomForest {
    /// Grow a forest on `data`.
    ///
    /// When `params.tree.max_features` is unset, each split tries
    /// `floor(sqrt(n_features))` features.
    ///
    /// # Errors
    ///
    /// Returns `Err` on an empty dataset or zero trees.
    pub fn fit(data: &Dataset, params: &ForestParams) -> Result<Self, String> {
        if data.is_empty() {
            return Err("cannot train on an empty dataset".into());
        }
        if params.n_trees == 0 {
            return Err("forest needs at least one tree".into());
        }

        let tree_params = TreeParams {
            max_features: Some(
                params
                    .tree
                    .max_features
                    .unwrap_or_else(|| (data.n_features as f64).sqrt() as usize)
                    .max(1),
            ),
            ..params.tree
        };

        let mut master = StdRng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_trees).map(|_| master.gen()).collect();
        let n = data.len();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let indices: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(data, &indices, &tree_params, &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_trees(trees, data.n_classes)
    }

    /// Build a forest from a collection of trained decision trees.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the collection is empty or trees disagree on shape.
    pub fn from_trees(trees: Vec<DecisionTree>, n_classes: usize) -> Result<Self, String> {
        let Some(first) = trees.first() else {
            return Err("empty forest".into());
        };
        let n_features = first.n_features();
        if trees.iter().any(|t| t.n_features() != n_features) {
            return Err("inconsistent n_features across trees".into());
        }
        if trees.iter().any(|t| t.n_classes() != n_classes) {
            return Err("inconsistent n_classes across trees".into());
        }
        Ok(Self {
            trees,
            n_features,
            n_classes,
        })
    }

    /// Check forest and tree structure, e.g. after deserializing an artifact
    ///
    /// # Errors
    ///
    /// Returns `Err` for an empty forest, trees that disagree with the
    /// forest's shape, or a malformed tree.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("empty forest".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || tree.n_classes() != self.n_classes {
                return Err(format!("tree {i} does not match the forest shape"));
            }
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    /// Mean class probabilities across all trees
    #[must_use]
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (sum, p) in sums.iter_mut().zip(tree.predict_proba(features)) {
                *sum += p;
            }
        }
        let n = self.trees.len() as f64;
        sums.into_iter().map(|s| s / n).collect()
    }

    #[must_use]
    pub fn predict_with_probabilities(&self, features: &[f64]) -> RfPrediction {
        let probabilities = self.predict_proba(features);
        let class = argmax(&probabilities);
        RfPrediction {
            class,
            confidence: probabilities[class],
            probabilities,
        }
    }

    #[must_use]
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }

    /// Fraction of rows classified correctly (0 for an empty dataset)
    #[must_use]
    pub fn accuracy(&self, data: &Dataset) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let correct = data
            .features
            .iter()
            .zip(&data.labels)
            .filter(|(row, label)| self.predict(row) == **label)
            .count();
        correct as f64 / data.len() as f64
    }

    /// Mean decrease in impurity, averaged over trees and normalized to sum 1
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (total, v) in totals.iter_mut().zip(tree.importances()) {
                *total += v;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Average tree depth across the forest.
    #[must_use]
    pub fn avg_depth(&self) -> f64 {
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }
}
