//! Random Forest ensemble classifier.

use super::{argmax, DecisionTreeClassifier, MaxFeatures};
use crate::error::{Result, SleepError};
use crate::primitives::Matrix;
use crate::traits::{Classifier, SupportsFeatureImportance};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Per-class sample weighting during fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample weighs 1.0
    Uniform,
    /// `n_samples / (n_classes * count_c)`, computed on the training labels
    #[default]
    Balanced,
}

impl ClassWeight {
    /// Weight for each class given the training labels.
    #[must_use]
    pub fn class_weights(self, y: &[usize], n_classes: usize) -> Vec<f32> {
        match self {
            ClassWeight::Uniform => vec![1.0; n_classes],
            ClassWeight::Balanced => {
                let mut counts = vec![0usize; n_classes];
                for &label in y {
                    counts[label] += 1;
                }
                let n = y.len() as f32;
                counts
                    .iter()
                    .map(|&c| {
                        if c == 0 {
                            0.0
                        } else {
                            n / (n_classes as f32 * c as f32)
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Random Forest classifier - an ensemble of decision trees.
///
/// Each tree is grown on a bootstrap sample of the training data. Repeated
/// draws enter the tree as sample weight, multiplied by the class weight of
/// the sample's label. Predictions average the trees' leaf distributions
/// (soft voting).
///
/// # Examples
///
/// ```
/// use sleep_quality::primitives::Matrix;
/// use sleep_quality::tree::RandomForestClassifier;
///
/// let x = Matrix::from_vec(6, 2, vec![
///     0.0, 0.0,
///     0.1, 0.2,
///     0.2, 0.1,
///     1.0, 1.0,
///     0.9, 1.1,
///     1.1, 0.9,
/// ]).expect("6x2");
/// let y = vec![0, 0, 0, 1, 1, 1];
///
/// let mut rf = RandomForestClassifier::new(25).with_random_state(42);
/// rf.fit(&x, &y).expect("fit should succeed");
///
/// let proba = rf.predict_proba(&x).expect("fitted");
/// assert_eq!(proba.shape(), (6, 2));
/// assert!(proba.get(5, 1) > 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: MaxFeatures,
    class_weight: ClassWeight,
    random_state: Option<u64>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForestClassifier {
    /// Creates a new Random Forest classifier.
    ///
    /// Defaults: unbounded depth, `sqrt(n_features)` candidates per split,
    /// balanced class weights and an unseeded random state.
    ///
    /// # Arguments
    ///
    /// * `n_estimators` - Number of trees in the forest
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            class_weight: ClassWeight::Balanced,
            random_state: None,
            n_features: 0,
            n_classes: 0,
        }
    }

    /// Sets the maximum depth for each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the random state for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Sets the class weighting scheme.
    #[must_use]
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Sets the per-split feature sampling strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Number of configured trees.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTreeClassifier] {
        &self.trees
    }

    /// Returns true once fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fits the random forest to training data.
    ///
    /// Tree `i` draws its bootstrap sample from a generator seeded with
    /// `random_state + i`, so a fixed seed gives identical forests.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty, shapes disagree, fewer than
    /// two classes are present or `n_estimators` is zero.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if self.n_estimators == 0 {
            return Err(SleepError::InvalidHyperparameter {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        if n_samples == 0 {
            return Err(SleepError::empty_input("random forest fit"));
        }
        if y.len() != n_samples {
            return Err(SleepError::dimension_mismatch("labels", n_samples, y.len()));
        }

        let n_classes = y.iter().max().map_or(0, |m| m + 1);
        let classes_present = {
            let mut seen = vec![false; n_classes];
            for &label in y {
                seen[label] = true;
            }
            seen.iter().filter(|s| **s).count()
        };
        if classes_present < 2 {
            return Err(SleepError::Data(
                "training labels contain a single class".to_string(),
            ));
        }

        let class_weights = self.class_weight.class_weights(y, n_classes);
        let base_seed = self.random_state.unwrap_or_else(rand::random);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));

            let mut multiplicity = vec![0u32; n_samples];
            for _ in 0..n_samples {
                multiplicity[rng.gen_range(0..n_samples)] += 1;
            }
            let indices: Vec<usize> = (0..n_samples).filter(|&s| multiplicity[s] > 0).collect();
            let weights: Vec<f32> = (0..n_samples)
                .map(|s| class_weights[y[s]] * multiplicity[s] as f32)
                .collect();

            let mut tree = DecisionTreeClassifier::new()
                .with_optional_max_depth(self.max_depth)
                .with_max_features(self.max_features)
                .with_random_state(rng.gen());
            tree.fit_weighted(x, y, &weights, &indices, n_classes)?;
            trees.push(tree);
        }

        tracing::debug!(
            n_estimators = self.n_estimators,
            n_samples,
            n_features,
            "fitted random forest"
        );
        self.trees = trees;
        self.n_features = n_features;
        self.n_classes = n_classes;
        Ok(())
    }

    fn check_input(&self, x: &Matrix<f32>) -> Result<()> {
        if !self.is_fitted() {
            return Err(SleepError::NotFitted("RandomForestClassifier"));
        }
        if x.n_cols() != self.n_features {
            return Err(SleepError::dimension_mismatch(
                "features",
                self.n_features,
                x.n_cols(),
            ));
        }
        Ok(())
    }

    /// Average class distribution across trees for one row.
    fn average_proba(&self, row: &[f32]) -> Vec<f32> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba_row(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f32;
        for p in &mut proba {
            *p /= n;
        }
        proba
    }

    /// Predict class probabilities for input features.
    ///
    /// # Returns
    ///
    /// `Matrix<f32>` with shape `(n_samples, n_classes)` where each row
    /// sums to 1.0.
    ///
    /// # Errors
    ///
    /// Returns an error if unfitted or the feature count differs from fit.
    pub fn predict_proba(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.check_input(x)?;
        let data: Vec<f32> = x.rows().flat_map(|row| self.average_proba(row)).collect();
        Matrix::from_vec(x.n_rows(), self.n_classes, data)
            .map_err(|e| SleepError::Data(e.to_string()))
    }

    /// Makes predictions for input data (argmax of averaged probabilities).
    ///
    /// # Errors
    ///
    /// Returns an error if unfitted or the feature count differs from fit.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        self.check_input(x)?;
        Ok(x.rows().map(|row| argmax(&self.average_proba(row))).collect())
    }

    /// Calculates accuracy score on test data.
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails or `y` does not match `x`.
    pub fn score(&self, x: &Matrix<f32>, y: &[usize]) -> Result<f32> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() || y.is_empty() {
            return Err(SleepError::dimension_mismatch("labels", predictions.len(), y.len()));
        }
        Ok(crate::metrics::accuracy(&predictions, y))
    }

    /// Mean impurity-decrease importances over trees that split at least once.
    ///
    /// Returns `None` before fit. Sums to 1.0 whenever any tree has a split.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f32>> {
        if !self.is_fitted() {
            return None;
        }
        let mut importances = vec![0.0; self.n_features];
        for tree in self.trees.iter().filter(|t| t.has_splits()) {
            if let Some(tree_imp) = tree.feature_importances_raw() {
                for (acc, v) in importances.iter_mut().zip(tree_imp) {
                    *acc += v;
                }
            }
        }
        let total: f32 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        Some(importances)
    }
}

impl SupportsFeatureImportance for RandomForestClassifier {
    fn feature_importances(&self) -> Option<Vec<f32>> {
        RandomForestClassifier::feature_importances(self)
    }
}

impl Classifier for RandomForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba_row(&self, row: &[f32]) -> Vec<f32> {
        if self.trees.is_empty() {
            return vec![0.0; self.n_classes];
        }
        self.average_proba(row)
    }

    fn describe(&self) -> String {
        let depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        format!(
            "RandomForestClassifier(n_estimators={}, max_depth={depth}, class_weight={:?})",
            self.n_estimators, self.class_weight
        )
    }

    fn feature_importance(&self) -> Option<&dyn SupportsFeatureImportance> {
        Some(self)
    }
}
