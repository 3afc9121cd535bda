//! Core traits for transformers and classifiers.
//!
//! These traits define the seams between preprocessing, the ensemble and
//! inference-time introspection.

use crate::error::Result;
use crate::primitives::Matrix;

/// Trait for matrix-level data transformers (scalers).
///
/// # Examples
///
/// ```
/// use sleep_quality::prelude::*;
///
/// let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).expect("3x1");
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&x).expect("fit_transform should succeed");
/// assert!(scaled.get(1, 0).abs() < 1e-6);
/// ```
pub trait Transformer {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()>;

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if transformer is not fitted.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Capability: exposes impurity-based global feature importances.
///
/// Importances are indexed like the model's input features and sum to 1.0
/// when any split exists.
pub trait SupportsFeatureImportance {
    /// Returns one importance score per input feature, or `None` if the
    /// model is not fitted.
    fn feature_importances(&self) -> Option<Vec<f32>>;
}

/// A fitted probabilistic classifier over transformed feature rows.
pub trait Classifier {
    /// Number of input features the model was trained on.
    fn n_features(&self) -> usize;

    /// Number of classes (probability vector width).
    fn n_classes(&self) -> usize;

    /// Class probability distribution for one feature row.
    fn predict_proba_row(&self, row: &[f32]) -> Vec<f32>;

    /// Short model description for operator output.
    fn describe(&self) -> String;

    /// Capability query for feature importances.
    ///
    /// Models without introspection keep the default.
    fn feature_importance(&self) -> Option<&dyn SupportsFeatureImportance> {
        None
    }
}
