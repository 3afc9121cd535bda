//! Schema-driven column transformer.

use super::{OneHotEncoder, StandardScaler};
use crate::data::RawRecord;
use crate::error::{Result, SleepError};
use crate::primitives::Matrix;
use crate::schema::FeatureSchema;
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};

/// Scales numeric columns and one-hot encodes categorical columns.
///
/// Fit on the training split only; the learned means, deviations and
/// vocabularies are frozen afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    schema: FeatureSchema,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl ColumnTransformer {
    /// Creates an unfitted transformer for `schema`.
    #[must_use]
    pub fn new(schema: FeatureSchema) -> Self {
        let encoder = OneHotEncoder::new(schema.categorical().to_vec());
        Self {
            schema,
            scaler: StandardScaler::new(),
            encoder,
        }
    }

    /// The schema this transformer was built for.
    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// The fitted numeric scaler.
    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// The fitted categorical encoder.
    #[must_use]
    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Returns true once both stages are fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.scaler.is_fitted() && self.encoder.is_fitted()
    }

    /// Fits scaler and encoder on `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if `records` is empty.
    pub fn fit(&mut self, records: &[RawRecord]) -> Result<()> {
        if records.is_empty() {
            return Err(SleepError::empty_input("column transformer fit"));
        }
        let numeric = self.numeric_matrix(records)?;
        self.scaler.fit(&numeric)?;
        self.encoder.fit(records)?;
        Ok(())
    }

    /// Transforms `records` into a feature matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformer is not fitted.
    pub fn transform(&self, records: &[RawRecord]) -> Result<Matrix<f32>> {
        let scaled = self.scaler.transform(&self.numeric_matrix(records)?)?;

        let mut one_hot = Matrix::zeros(records.len(), self.encoder.n_output_features());
        for (i, record) in records.iter().enumerate() {
            for (j, v) in self.encoder.encode(record)?.into_iter().enumerate() {
                if v != 0.0 {
                    one_hot.set(i, j, v);
                }
            }
        }

        scaled
            .hstack(&one_hot)
            .map_err(|e| SleepError::Data(e.to_string()))
    }

    /// Fits on `records` and returns their transformed matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    pub fn fit_transform(&mut self, records: &[RawRecord]) -> Result<Matrix<f32>> {
        self.fit(records)?;
        self.transform(records)
    }

    /// Transforms a single record. Absent numeric fields become NaN and
    /// absent or unseen categories become all-zero groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformer is not fitted.
    pub fn transform_one(&self, record: &RawRecord) -> Result<Vec<f32>> {
        let mut row = self.numeric_values(record);
        self.scaler.transform_values(&mut row)?;
        self.encoder.encode_into(record, &mut row)?;
        Ok(row)
    }

    /// Width of a transformed row.
    #[must_use]
    pub fn n_output_features(&self) -> usize {
        self.schema.numeric().len() + self.encoder.n_output_features()
    }

    /// Post-encoding feature names, aligned with output indices.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.schema
            .numeric()
            .iter()
            .cloned()
            .chain(self.encoder.feature_names())
            .collect()
    }

    fn numeric_values(&self, record: &RawRecord) -> Vec<f32> {
        self.schema
            .numeric()
            .iter()
            .map(|col| record.number(col) as f32)
            .collect()
    }

    fn numeric_matrix(&self, records: &[RawRecord]) -> Result<Matrix<f32>> {
        let width = self.schema.numeric().len();
        let data = records
            .iter()
            .flat_map(|r| self.numeric_values(r))
            .collect();
        Matrix::from_vec(records.len(), width, data).map_err(|e| SleepError::Data(e.to_string()))
    }
}
