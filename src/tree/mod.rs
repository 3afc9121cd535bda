//! Decision tree algorithms and ensemble methods.
//!
//! This module implements:
//! - CART classification trees using weighted Gini impurity
//! - Random Forest ensemble classifier with class-balanced weighting
//!
//! Trees accept NaN in any feature. Missing values never take part in
//! threshold search; each split records which child they follow.
//!
//! # Example
//!
//! ```
//! use sleep_quality::primitives::Matrix;
//! use sleep_quality::tree::DecisionTreeClassifier;
//!
//! // Training data (simple 2D binary classification)
//! let x = Matrix::from_vec(4, 2, vec![
//!     0.0, 0.0,  // class 0
//!     0.2, 0.1,  // class 0
//!     1.0, 0.9,  // class 1
//!     0.9, 1.0,  // class 1
//! ]).expect("Matrix creation should succeed in tests");
//! let y = vec![0, 0, 1, 1];
//!
//! let mut tree = DecisionTreeClassifier::new();
//! tree.fit(&x, &y).expect("fit should succeed");
//! assert_eq!(tree.predict(&x), y);
//! ```

mod helpers;
mod random_forest;

pub use random_forest::{ClassWeight, RandomForestClassifier};

use crate::error::{Result, SleepError};
use crate::primitives::Matrix;
use crate::traits::{Classifier, SupportsFeatureImportance};
use helpers::{accumulate_importances, find_best_split, gini, make_leaf, partition, weighted_counts};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Internal node in a decision tree.
///
/// Contains a split condition (feature and threshold) and pointers to
/// left and right subtrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f32,
    /// Whether NaN values follow the left branch
    pub missing_left: bool,
    /// Gini impurity of the samples reaching this node
    pub impurity: f32,
    /// Total sample weight reaching this node
    pub weighted_n: f32,
    /// Number of distinct training samples reaching this node
    pub n_samples: usize,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<TreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<TreeNode>,
}

/// Leaf node in a decision tree.
///
/// Holds the weighted class distribution of the training samples that
/// reached it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Class probabilities, summing to 1.0
    pub distribution: Vec<f32>,
    /// Number of distinct training samples in this leaf
    pub n_samples: usize,
    /// Total sample weight in this leaf
    pub weighted_n: f32,
    /// Gini impurity of this leaf
    pub impurity: f32,
}

impl Leaf {
    /// Most probable class; ties resolve to the lower index.
    #[must_use]
    pub fn class_label(&self) -> usize {
        argmax(&self.distribution)
    }
}

/// A node in a decision tree (either internal node or leaf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with split condition
    Node(Node),
    /// Leaf node with class distribution
    Leaf(Leaf),
}

impl TreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    /// Number of leaves under this node.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Node(node) => node.left.n_leaves() + node.right.n_leaves(),
        }
    }

    fn weighted_n(&self) -> f32 {
        match self {
            TreeNode::Leaf(leaf) => leaf.weighted_n,
            TreeNode::Node(node) => node.weighted_n,
        }
    }

    fn impurity(&self) -> f32 {
        match self {
            TreeNode::Leaf(leaf) => leaf.impurity,
            TreeNode::Node(node) => node.impurity,
        }
    }

    /// Follows splits down to the leaf for `row`.
    fn leaf_for(&self, row: &[f32]) -> &Leaf {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf,
                TreeNode::Node(internal) => {
                    let v = row[internal.feature_idx];
                    let go_left = if v.is_nan() {
                        internal.missing_left
                    } else {
                        v <= internal.threshold
                    };
                    node = if go_left {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }
}

/// Number of features sampled at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Every feature is considered
    #[default]
    All,
    /// `max(1, floor(sqrt(n_features)))`
    Sqrt,
    /// Fixed count, capped at `n_features`
    Count(usize),
}

impl MaxFeatures {
    /// Resolves the per-split feature quota.
    #[must_use]
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Count(k) => k.min(n_features),
        };
        k.max(1)
    }
}

/// Decision tree classifier using the CART algorithm.
///
/// Uses weighted Gini impurity for the splitting criterion and grows
/// until leaves are pure, `max_depth` is reached or fewer than
/// `min_samples_split` samples remain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: Option<TreeNode>,
    max_depth: Option<usize>,
    max_features: MaxFeatures,
    min_samples_split: usize,
    random_state: u64,
    /// Number of features the model was trained on (for validation)
    n_features: Option<usize>,
    n_classes: usize,
}

impl DecisionTreeClassifier {
    /// Creates a new decision tree classifier with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            max_depth: None,
            max_features: MaxFeatures::All,
            min_samples_split: 2,
            random_state: 0,
            n_features: None,
            n_classes: 0,
        }
    }

    /// Sets the maximum depth of the tree.
    ///
    /// # Arguments
    ///
    /// * `depth` - Maximum depth (root has depth 0)
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets an optional maximum depth (`None` = unbounded).
    #[must_use]
    pub fn with_optional_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the per-split feature sampling strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Sets the seed used for feature sampling.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Root of the fitted tree.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Fits the decision tree with uniform sample weights.
    ///
    /// # Arguments
    ///
    /// * `x` - Training features (n_samples × n_features)
    /// * `y` - Training labels (n_samples class indices)
    ///
    /// # Errors
    ///
    /// Returns an error if the data is invalid.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        let n_classes = y.iter().max().map_or(0, |m| m + 1);
        let weights = vec![1.0; y.len()];
        let indices: Vec<usize> = (0..y.len()).collect();
        self.fit_weighted(x, y, &weights, &indices, n_classes)
    }

    /// Fits on the subset `indices` with per-sample weights.
    ///
    /// `n_classes` fixes the width of every leaf distribution so trees
    /// trained on bootstrap samples stay aligned even if a class is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if shapes disagree, a label is out of range or a
    /// weight is negative or non-finite.
    pub fn fit_weighted(
        &mut self,
        x: &Matrix<f32>,
        y: &[usize],
        sample_weight: &[f32],
        indices: &[usize],
        n_classes: usize,
    ) -> Result<()> {
        let (n_rows, n_cols) = x.shape();
        if n_rows != y.len() {
            return Err(SleepError::dimension_mismatch("labels", n_rows, y.len()));
        }
        if sample_weight.len() != n_rows {
            return Err(SleepError::dimension_mismatch(
                "sample weights",
                n_rows,
                sample_weight.len(),
            ));
        }
        if indices.is_empty() {
            return Err(SleepError::empty_input("decision tree fit"));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(SleepError::InvalidHyperparameter {
                param: "n_classes".to_string(),
                value: n_classes.to_string(),
                constraint: format!("> max label {bad}"),
            });
        }
        if sample_weight.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SleepError::Data(
                "sample weights must be finite and non-negative".to_string(),
            ));
        }

        let mut builder = TreeBuilder {
            x,
            y,
            weights: sample_weight,
            n_classes,
            max_depth: self.max_depth,
            max_features: self.max_features.resolve(n_cols),
            min_samples_split: self.min_samples_split,
            rng: StdRng::seed_from_u64(self.random_state),
        };

        self.n_features = Some(n_cols);
        self.n_classes = n_classes;
        self.tree = Some(builder.build(indices, 0));
        Ok(())
    }

    /// Class distribution for one row (empty if unfitted).
    #[must_use]
    pub fn predict_proba_row(&self, row: &[f32]) -> &[f32] {
        self.tree
            .as_ref()
            .map_or(&[], |t| t.leaf_for(row).distribution.as_slice())
    }

    /// Predicts class labels for samples.
    ///
    /// # Panics
    ///
    /// Panics if called before fit() or if the feature count doesn't match
    /// the training data.
    #[must_use]
    pub fn predict(&self, x: &Matrix<f32>) -> Vec<usize> {
        if let Some(expected) = self.n_features {
            assert!(
                x.n_cols() == expected,
                "Feature count mismatch: model was trained with {expected} features but input has {} features",
                x.n_cols()
            );
        }
        let tree = self.tree.as_ref().expect("Model not fitted yet");
        x.rows().map(|row| tree.leaf_for(row).class_label()).collect()
    }

    /// Impurity-decrease importances for this tree, normalized to sum to 1.0.
    ///
    /// A tree without splits yields all zeros.
    #[must_use]
    pub fn feature_importances_raw(&self) -> Option<Vec<f32>> {
        let tree = self.tree.as_ref()?;
        let mut importances = vec![0.0; self.n_features.unwrap_or(0)];
        accumulate_importances(tree, &mut importances);
        let total: f32 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        Some(importances)
    }

    /// Returns true if the fitted tree has at least one split.
    #[must_use]
    pub fn has_splits(&self) -> bool {
        matches!(self.tree, Some(TreeNode::Node(_)))
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SupportsFeatureImportance for DecisionTreeClassifier {
    fn feature_importances(&self) -> Option<Vec<f32>> {
        self.feature_importances_raw()
    }
}

impl Classifier for DecisionTreeClassifier {
    fn n_features(&self) -> usize {
        self.n_features.unwrap_or(0)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba_row(&self, row: &[f32]) -> Vec<f32> {
        DecisionTreeClassifier::predict_proba_row(self, row).to_vec()
    }

    fn describe(&self) -> String {
        let depth = self.tree.as_ref().map_or(0, TreeNode::depth);
        format!("DecisionTreeClassifier(depth={depth})")
    }

    fn feature_importance(&self) -> Option<&dyn SupportsFeatureImportance> {
        Some(self)
    }
}

/// Recursive CART builder over row indices.
struct TreeBuilder<'a> {
    x: &'a Matrix<f32>,
    y: &'a [usize],
    weights: &'a [f32],
    n_classes: usize,
    max_depth: Option<usize>,
    max_features: usize,
    min_samples_split: usize,
    rng: StdRng,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &[usize], depth: usize) -> TreeNode {
        let counts = weighted_counts(self.y, self.weights, indices, self.n_classes);
        let weighted_n: f32 = counts.iter().sum();
        let impurity = gini(&counts);
        let n_samples = indices.len();

        let at_max_depth = self.max_depth.is_some_and(|d| depth >= d);
        if impurity <= 0.0
            || weighted_n <= 0.0
            || n_samples < self.min_samples_split
            || at_max_depth
        {
            return make_leaf(counts, n_samples, impurity);
        }

        let Some(split) = find_best_split(
            self.x,
            self.y,
            self.weights,
            indices,
            self.n_classes,
            self.max_features,
            impurity,
            &mut self.rng,
        ) else {
            return make_leaf(counts, n_samples, impurity);
        };

        let (left_idx, right_idx) = partition(self.x, indices, &split);
        if left_idx.is_empty() || right_idx.is_empty() {
            return make_leaf(counts, n_samples, impurity);
        }

        let left = self.build(&left_idx, depth + 1);
        let right = self.build(&right_idx, depth + 1);

        TreeNode::Node(Node {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            missing_left: split.missing_left,
            impurity,
            weighted_n,
            n_samples,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

/// Index of the largest value; ties resolve to the lower index.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
