//! Random forest of CART decision trees.
//!
//! Trees are stored flat: every node refers to its children by index and
//! children always come after their parent, so traversal of a validated
//! tree cannot loop.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::FitError;
use crate::ports::{check_dimension, Classifier, InferenceError};

pub const FAMILY: &str = "RandomForestClassifier";

/// One node of a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `features[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probabilities: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("decision tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i} splits on unknown feature {feature}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { probabilities } => {
                    let [p0, p1] = *probabilities;
                    let in_range = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
                    if !in_range(p0) || !in_range(p1) || (p0 + p1 - 1.0).abs() > 1e-6 {
                        return Err(format!("leaf {i} has an invalid distribution"));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_distribution(&self, features: &[f64]) -> Result<[f64; 2], InferenceError> {
        let mut idx = 0;
        // Bounded by the node count so a cyclic tree errors instead of spinning.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { probabilities }) => return Ok(*probabilities),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        InferenceError::Malformed(format!("split on unknown feature {feature}"))
                    })?;
                    idx = if value <= threshold { *left } else { *right };
                }
                None => {
                    return Err(InferenceError::Malformed(format!(
                        "node index {idx} out of range"
                    )))
                }
            }
        }
        Err(InferenceError::Malformed("tree traversal did not reach a leaf".into()))
    }
}

/// Hyperparameters for [`RandomForest::fit`].
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features considered per split; `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 10,
            max_depth: 8,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

/// Ensemble that averages the leaf distributions of its trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Check that every tree is well formed for `n_features` inputs.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.n_features != n_features {
            return Err(format!(
                "random forest expects {} features, expected {n_features}",
                self.n_features
            ));
        }
        if self.trees.is_empty() {
            return Err("random forest has no trees".into());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| format!("tree {t}: {e}"))?;
        }
        Ok(())
    }

    /// Fit on bootstrap samples of `(x, y)`.
    ///
    /// # Errors
    /// Returns `FitError` if the dataset is empty or ragged, or if no trees
    /// were requested.
    pub fn fit<R: Rng>(
        x: &[Vec<f64>],
        y: &[u8],
        params: &ForestParams,
        rng: &mut R,
    ) -> Result<Self, FitError> {
        let n_features = super::check_dataset(x, y)?;
        if params.n_trees == 0 {
            return Err(FitError::InvalidParams("n_trees must be at least 1".into()));
        }

        let max_features = params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().round() as usize)
            .clamp(1, n_features);

        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let bootstrap: Vec<usize> = (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
            let mut builder = TreeBuilder {
                x,
                y,
                params,
                n_features,
                max_features,
                rng: &mut *rng,
                nodes: Vec::new(),
            };
            builder.build(bootstrap, 0);
            trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        Ok(Self { n_features, trees })
    }

    fn mean_distribution(&self, features: &[f64]) -> Result<[f64; 2], InferenceError> {
        check_dimension(features, self.n_features)?;
        if self.trees.is_empty() {
            return Err(InferenceError::Malformed("random forest has no trees".into()));
        }

        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_distribution(features)?;
            sum[0] += p0;
            sum[1] += p1;
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }
}

impl Classifier for RandomForest {
    fn family(&self) -> &str {
        FAMILY
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<u8, InferenceError> {
        let [p0, p1] = self.mean_distribution(features)?;
        // Ties resolve to the first class.
        Ok(u8::from(p1 > p0))
    }

    fn predict_probability(&self, features: &[f64]) -> Result<[f64; 2], InferenceError> {
        self.mean_distribution(features)
    }
}

fn class_counts(y: &[u8], samples: &[usize]) -> [usize; 2] {
    let mut counts = [0, 0];
    for &s in samples {
        counts[usize::from(y[s] == 1)] += 1;
    }
    counts
}

fn gini(counts: [usize; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

struct TreeBuilder<'a, R> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    params: &'a ForestParams,
    n_features: usize,
    max_features: usize,
    rng: &'a mut R,
    nodes: Vec<TreeNode>,
}

impl<R: Rng> TreeBuilder<'_, R> {
    fn leaf(counts: [usize; 2]) -> TreeNode {
        let n = (counts[0] + counts[1]).max(1) as f64;
        TreeNode::Leaf {
            probabilities: [counts[0] as f64 / n, counts[1] as f64 / n],
        }
    }

    /// Append the subtree for `samples` and return its root index.
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let idx = self.nodes.len();
        let counts = class_counts(self.y, &samples);
        self.nodes.push(Self::leaf(counts));

        let pure = counts[0] == 0 || counts[1] == 0;
        if pure || depth >= self.params.max_depth || samples.len() < self.params.min_samples_split
        {
            return idx;
        }

        let Some((feature, threshold)) = self.best_split(&samples) else {
            return idx;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.x[s][feature] <= threshold);

        let left = self.build(left_samples, depth + 1);
        let right = self.build(right_samples, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&mut self, samples: &[usize]) -> Option<(usize, f64)> {
        let total = class_counts(self.y, samples);
        let n = samples.len() as f64;
        let mut best: Option<(f64, usize, f64)> = None;

        let candidates = index::sample(&mut *self.rng, self.n_features, self.max_features);
        for feature in candidates.iter() {
            let mut column: Vec<(f64, u8)> = samples
                .iter()
                .map(|&s| (self.x[s][feature], self.y[s]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = [0usize, 0usize];
            for i in 0..column.len().saturating_sub(1) {
                left[usize::from(column[i].1 == 1)] += 1;
                let (here, next) = (column[i].0, column[i + 1].0);
                if here >= next {
                    continue;
                }
                let right = [total[0] - left[0], total[1] - left[1]];
                let nl = (left[0] + left[1]) as f64;
                let impurity = (nl * gini(left) + (n - nl) * gini(right)) / n;

                if best.map_or(true, |(b, _, _)| impurity < b) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some((impurity, feature, threshold));
                }
            }
        }

        best.map(|(_, feature, threshold)| (feature, threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn stump(threshold: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { probabilities: left },
                TreeNode::Leaf {
                    probabilities: right,
                },
            ],
        }
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest {
            n_features: 1,
            trees: vec![
                stump(0.5, [1.0, 0.0], [0.2, 0.8]),
                stump(1.5, [0.6, 0.4], [0.0, 1.0]),
            ],
        };
        assert!(forest.validate(1).is_ok());

        let p = forest.predict_probability(&[1.0]).expect("predict");
        assert!((p[0] - 0.4).abs() < 1e-12);
        assert!((p[1] - 0.6).abs() < 1e-12);
        assert_eq!(forest.predict(&[1.0]).expect("predict"), 1);
        assert_eq!(forest.predict(&[0.0]).expect("predict"), 0);
    }

    #[test]
    fn test_threshold_goes_left() {
        let forest = RandomForest {
            n_features: 1,
            trees: vec![stump(0.5, [1.0, 0.0], [0.0, 1.0])],
        };
        assert_eq!(forest.predict(&[0.5]).expect("predict"), 0);
    }

    #[test]
    fn test_tie_resolves_to_survival() {
        let forest = RandomForest {
            n_features: 1,
            trees: vec![stump(0.5, [0.5, 0.5], [0.5, 0.5])],
        };
        assert_eq!(forest.predict(&[0.0]).expect("predict"), 0);
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf {
                    probabilities: [1.0, 0.0],
                },
            ],
        };
        let forest = RandomForest {
            n_features: 1,
            trees: vec![tree],
        };
        assert!(forest.validate(1).is_err());
        // Unvalidated traversal still terminates with an error instead of looping.
        assert!(forest.predict(&[-1.0]).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_leaf_and_feature() {
        let bad_leaf = RandomForest {
            n_features: 1,
            trees: vec![stump(0.5, [0.7, 0.7], [0.0, 1.0])],
        };
        assert!(bad_leaf.validate(1).is_err());

        let bad_feature = RandomForest {
            n_features: 1,
            trees: vec![stump(0.5, [1.0, 0.0], [0.0, 1.0])],
        };
        assert!(bad_feature.validate(2).is_err());
    }

    #[test]
    fn test_fit_learns_threshold() {
        let x: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![f64::from(i), f64::from(i % 7)])
            .collect();
        let y: Vec<u8> = (0..60).map(|i| u8::from(i >= 30)).collect();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let params = ForestParams {
            n_trees: 15,
            max_features: Some(2),
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, &params, &mut rng).expect("fit");

        assert_eq!(forest.trees.len(), 15);
        assert!(forest.validate(2).is_ok());
        assert_eq!(forest.predict(&[5.0, 5.0]).expect("predict"), 0);
        assert_eq!(forest.predict(&[55.0, 6.0]).expect("predict"), 1);
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![f64::from(i * 3 % 11)]).collect();
        let y: Vec<u8> = (0..30).map(|i| (i % 2) as u8).collect();

        let a = RandomForest::fit(&x, &y, &ForestParams::default(), &mut ChaCha8Rng::seed_from_u64(42))
            .expect("fit");
        let b = RandomForest::fit(&x, &y, &ForestParams::default(), &mut ChaCha8Rng::seed_from_u64(42))
            .expect("fit");
        assert_eq!(a, b);
    }
}
