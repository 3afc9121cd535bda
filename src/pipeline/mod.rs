//! Preprocessor plus forest as one fitted unit.
//!
//! The pipeline is the object persisted to `model.bin`. Callers hand it raw
//! records; it owns the column layout, so feature order can never drift
//! between training and inference.

use crate::data::RawRecord;
use crate::error::{Result, SleepError};
use crate::preprocessing::ColumnTransformer;
use crate::primitives::Matrix;
use crate::schema::FeatureSchema;
use crate::traits::Classifier;
use crate::tree::RandomForestClassifier;
use serde::{Deserialize, Serialize};

/// Column transformer followed by a random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPipeline {
    preprocessor: ColumnTransformer,
    model: RandomForestClassifier,
}

impl SleepPipeline {
    /// Creates an unfitted pipeline.
    #[must_use]
    pub fn new(schema: FeatureSchema, model: RandomForestClassifier) -> Self {
        Self {
            preprocessor: ColumnTransformer::new(schema),
            model,
        }
    }

    /// Fits the preprocessor on `records`, then the forest on the
    /// transformed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if `records` and `labels` differ in length or either
    /// stage fails to fit.
    pub fn fit(&mut self, records: &[RawRecord], labels: &[usize]) -> Result<()> {
        if records.len() != labels.len() {
            return Err(SleepError::dimension_mismatch(
                "labels",
                records.len(),
                labels.len(),
            ));
        }
        let x = self.preprocessor.fit_transform(records)?;
        self.model.fit(&x, labels)
    }

    /// Transformed feature matrix for `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not fitted.
    pub fn transform(&self, records: &[RawRecord]) -> Result<Matrix<f32>> {
        self.preprocessor.transform(records)
    }

    /// Class probabilities, one row per record.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not fitted.
    pub fn predict_proba(&self, records: &[RawRecord]) -> Result<Matrix<f32>> {
        let x = self.transform(records)?;
        self.model.predict_proba(&x)
    }

    /// Class probabilities for a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not fitted.
    pub fn predict_proba_one(&self, record: &RawRecord) -> Result<Vec<f32>> {
        if !self.model.is_fitted() {
            return Err(SleepError::NotFitted("SleepPipeline"));
        }
        let row = self.preprocessor.transform_one(record)?;
        Ok(Classifier::predict_proba_row(&self.model, &row))
    }

    /// Most probable class per record.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not fitted.
    pub fn predict(&self, records: &[RawRecord]) -> Result<Vec<usize>> {
        let x = self.transform(records)?;
        self.model.predict(&x)
    }

    /// Raw input columns in the order the preprocessor consumes them.
    #[must_use]
    pub fn expected_columns(&self) -> Vec<String> {
        self.preprocessor.schema().all_columns()
    }

    /// The fitted preprocessor.
    #[must_use]
    pub fn preprocessor(&self) -> &ColumnTransformer {
        &self.preprocessor
    }

    /// The trained model behind its capability interface.
    #[must_use]
    pub fn model(&self) -> &dyn Classifier {
        &self.model
    }

    /// The concrete forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForestClassifier {
        &self.model
    }
}
