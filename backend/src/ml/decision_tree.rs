//! CART decision tree classifier.
//!
//! Array-based tree representation: nodes live in a flat `Vec` and refer to
//! their children by index, so a trained tree serializes as plain JSON and
//! inference is a simple loop from the root.
//!
//! Training grows the tree greedily on Gini impurity. Each split considers a
//! random subset of features, which is what turns a bag of these trees into a
//! random forest.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

/// A labelled feature matrix (row per sample)
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    pub n_features: usize,
    pub n_classes: usize,
}

impl Dataset {
    /// # Errors
    ///
    /// Returns `Err` when rows and labels disagree in count, a row has the
    /// wrong width, or a label is out of range.
    pub fn new(
        features: Vec<Vec<f64>>,
        labels: Vec<usize>,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, String> {
        if features.len() != labels.len() {
            return Err("feature rows and labels differ in length".into());
        }
        if features.iter().any(|row| row.len() != n_features) {
            return Err("inconsistent feature row width".into());
        }
        if labels.iter().any(|&l| l >= n_classes) {
            return Err("label out of range".into());
        }
        Ok(Self {
            features,
            labels,
            n_features,
            n_classes,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Subset by row indices (duplicates allowed)
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            n_features: self.n_features,
            n_classes: self.n_classes,
        }
    }
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; `None` tries all of them
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// A node in the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `features[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class distribution of the training samples that reached this leaf
    Leaf { probabilities: Vec<f64> },
}

/// A decision tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
    /// Normalized mean decrease in impurity per feature
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Grow a tree on the rows of `data` named by `indices`.
    ///
    /// `indices` may repeat rows (bootstrap samples).
    ///
    /// # Errors
    ///
    /// Returns `Err` when `indices` is empty.
    pub fn fit(
        data: &Dataset,
        indices: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, String> {
        if indices.is_empty() {
            return Err("cannot grow a tree from zero samples".into());
        }
        let mut builder = TreeBuilder {
            data,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; data.n_features],
            total_samples: indices.len() as f64,
        };
        let mut working = indices.to_vec();
        builder.grow(&mut working, 0);

        let TreeBuilder {
            nodes,
            mut importances,
            ..
        } = builder;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Ok(Self {
            nodes,
            n_features: data.n_features,
            n_classes: data.n_classes,
            importances,
        })
    }

    /// Class probabilities of the leaf reached by `features`
    #[must_use]
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { probabilities } => return probabilities,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Most probable class (lowest index wins ties)
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Check the structure of a tree that did not come from [`DecisionTree::fit`].
    ///
    /// Children must point forward within the node vector, so every walk
    /// from the root terminates; leaves must carry one probability per class.
    ///
    /// # Errors
    ///
    /// Returns `Err` naming the first malformed node.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        if self.importances.len() != self.n_features {
            return Err("importances do not match n_features".into());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(format!("node {idx} splits on unknown feature {feature}"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= len {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { probabilities } => {
                    if probabilities.len() != self.n_classes {
                        return Err(format!(
                            "leaf {idx} has {} probabilities for {} classes",
                            probabilities.len(),
                            self.n_classes
                        ));
                    }
                    if probabilities.iter().any(|p| !p.is_finite()) {
                        return Err(format!("leaf {idx} has a non-finite probability"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Tree depth (longest root-to-leaf path, a lone leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Index of the largest value; first one wins ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best, best_v)
            }
        })
        .0
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

struct Split {
    feature: usize,
    threshold: f64,
    /// `n_t * gini_t - n_l * gini_l - n_r * gini_r`
    weighted_decrease: f64,
}

struct TreeBuilder<'a> {
    data: &'a Dataset,
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
    total_samples: f64,
}

impl TreeBuilder<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.data.n_classes];
        for &i in indices {
            counts[self.data.labels[i]] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let probabilities = counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect();
        self.nodes.push(TreeNode::Leaf { probabilities });
        self.nodes.len() - 1
    }

    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let counts = self.class_counts(indices);
        let impurity = gini(&counts, n);

        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || impurity <= 0.0
        {
            return self.leaf(&counts, n);
        }

        let Some(split) = self.best_split(indices, &counts, impurity) else {
            return self.leaf(&counts, n);
        };

        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            probabilities: Vec::new(),
        });
        self.importances[split.feature] += split.weighted_decrease / self.total_samples;

        let data = self.data;
        let (mut left_rows, mut right_rows): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| data.features[i][split.feature] <= split.threshold);

        let left = self.grow(&mut left_rows, depth + 1);
        let right = self.grow(&mut right_rows, depth + 1);
        self.nodes[node_id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(&mut self, indices: &mut [usize], counts: &[usize], impurity: f64) -> Option<Split> {
        let n = indices.len();
        let n_features = self.data.n_features;
        let k = self
            .params
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);
        let candidates = sample(&mut *self.rng, n_features, k).into_vec();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent = n as f64 * impurity;

        let mut best: Option<Split> = None;
        for feature in candidates {
            let data = self.data;
            indices.sort_by(|&a, &b| data.features[a][feature].total_cmp(&data.features[b][feature]));

            let mut left_counts = vec![0usize; counts.len()];
            for pos in 0..n - 1 {
                left_counts[data.labels[indices[pos]]] += 1;
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let here = data.features[indices[pos]][feature];
                let next = data.features[indices[pos + 1]][feature];
                if here >= next {
                    continue;
                }

                let right_counts: Vec<usize> = counts
                    .iter()
                    .zip(&left_counts)
                    .map(|(&total, &left)| total - left)
                    .collect();
                let decrease = parent
                    - n_left as f64 * gini(&left_counts, n_left)
                    - n_right as f64 * gini(&right_counts, n_right);

                if decrease > 1e-12 && best.as_ref().map_or(true, |b| decrease > b.weighted_decrease) {
                    let mut threshold = (here + next) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        weighted_decrease: decrease,
                    });
                }
            }
        }
        best
    }
}
