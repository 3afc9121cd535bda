//! Preprocessing transformers: standardization and one-hot encoding.
//!
//! [`ColumnTransformer`] applies a [`StandardScaler`] to the numeric schema
//! columns and a [`OneHotEncoder`] to the categorical ones, producing
//! one feature row per record:
//!
//! ```text
//! [ scaled numeric (schema order) | one-hot groups (schema order, sorted categories) ]
//! ```
//!
//! # Example
//!
//! ```
//! use sleep_quality::prelude::*;
//! use sleep_quality::preprocessing::StandardScaler;
//!
//! // Create data with different scales
//! let data = Matrix::from_vec(4, 2, vec![
//!     1.0, 100.0,
//!     2.0, 200.0,
//!     3.0, 300.0,
//!     4.0, 400.0,
//! ]).expect("valid matrix dimensions");
//!
//! // Standardize to zero mean and unit variance
//! let mut scaler = StandardScaler::new();
//! let scaled = scaler.fit_transform(&data).expect("fit_transform should succeed");
//!
//! // Each column now has mean ≈ 0 and std ≈ 1
//! assert!(scaled.get(0, 0).abs() < 2.0);
//! ```

mod column;
mod encoder;

pub use column::ColumnTransformer;
pub use encoder::OneHotEncoder;

use crate::error::{Result, SleepError};
use crate::primitives::Matrix;
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};

/// Variance floor below which a column is treated as constant.
const MIN_STD: f64 = 1e-10;

/// Standardizes features by removing mean and scaling to unit variance.
///
/// The standard score of a sample x is: z = (x - mean) / std
///
/// NaN cells are ignored when fitting and pass through `transform`
/// unchanged. A column with no finite values gets mean 0 and std 1; a
/// constant column gets std 1 so it is only centered.
///
/// # Example
///
/// ```
/// use sleep_quality::prelude::*;
/// use sleep_quality::preprocessing::StandardScaler;
///
/// let data = Matrix::from_vec(3, 2, vec![
///     0.0, 0.0,
///     1.0, 10.0,
///     2.0, f32::NAN,
/// ]).expect("valid matrix dimensions");
///
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&data).expect("fit_transform should succeed");
///
/// assert!((scaler.mean()[1] - 5.0).abs() < 1e-6);
/// assert!(scaled.get(2, 1).is_nan());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f32>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f32>>,
}

impl StandardScaler {
    /// Creates a new unfitted `StandardScaler`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Returns the mean of each feature.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn mean(&self) -> &[f32] {
        self.mean
            .as_ref()
            .expect("Scaler not fitted. Call fit() first.")
    }

    /// Returns the standard deviation of each feature.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn std(&self) -> &[f32] {
        self.std
            .as_ref()
            .expect("Scaler not fitted. Call fit() first.")
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Number of features seen during fit.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.mean.as_ref().map(Vec::len)
    }

    /// Standardizes one row in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or the row width differs.
    pub fn transform_values(&self, values: &mut [f32]) -> Result<()> {
        let (mean, std) = self.params()?;
        if values.len() != mean.len() {
            return Err(SleepError::dimension_mismatch(
                "numeric features",
                mean.len(),
                values.len(),
            ));
        }
        for ((v, m), s) in values.iter_mut().zip(mean).zip(std) {
            *v = (*v - m) / s;
        }
        Ok(())
    }

    fn params(&self) -> Result<(&[f32], &[f32])> {
        match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => Ok((mean, std)),
            _ => Err(SleepError::NotFitted("StandardScaler")),
        }
    }
}

impl Transformer for StandardScaler {
    /// Computes the mean and population standard deviation of each feature,
    /// skipping NaN cells.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples == 0 {
            return Err(SleepError::empty_input("scaler fit"));
        }

        let mut mean = vec![0.0; n_features];
        let mut std = vec![1.0; n_features];

        for j in 0..n_features {
            let values: Vec<f64> = x
                .column(j)
                .into_iter()
                .map(f64::from)
                .filter(|v| !v.is_nan())
                .collect();
            if values.is_empty() {
                continue;
            }
            let n = values.len() as f64;
            let m = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n;
            let s = var.sqrt();

            mean[j] = m as f32;
            std[j] = if s > MIN_STD { s as f32 } else { 1.0 };
        }

        self.mean = Some(mean);
        self.std = Some(std);

        Ok(())
    }

    /// Standardizes the data using fitted mean and std.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let (mean, _) = self.params()?;
        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err(SleepError::dimension_mismatch(
                "numeric features",
                mean.len(),
                n_features,
            ));
        }

        let mut data = Vec::with_capacity(n_samples * n_features);
        for row in x.rows() {
            let mut row = row.to_vec();
            self.transform_values(&mut row)?;
            data.extend(row);
        }

        Matrix::from_vec(n_samples, n_features, data).map_err(|e| SleepError::Data(e.to_string()))
    }
}
