//! One-hot encoding with an ignore-unknown policy.

use crate::data::RawRecord;
use crate::error::{Result, SleepError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Encodes categorical columns as binary indicator groups.
///
/// Each column's vocabulary is the sorted set of non-missing values seen
/// during fit. At transform time a value outside the vocabulary, or a
/// missing value, yields an all-zero group rather than an error.
///
/// # Examples
///
/// ```
/// use sleep_quality::data::{FieldValue, RawRecord};
/// use sleep_quality::preprocessing::OneHotEncoder;
///
/// let rows: Vec<RawRecord> = ["Nurse", "Doctor", "Nurse"]
///     .iter()
///     .map(|v| [("occupation", FieldValue::from(*v))].into_iter().collect())
///     .collect();
///
/// let mut encoder = OneHotEncoder::new(vec!["occupation".to_string()]);
/// encoder.fit(&rows).expect("fit should succeed");
/// assert_eq!(encoder.categories()[0], vec!["Doctor", "Nurse"]);
///
/// let unseen: RawRecord = [("occupation", FieldValue::from("Pilot"))].into_iter().collect();
/// assert_eq!(encoder.encode(&unseen).expect("fitted"), vec![0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Option<Vec<Vec<String>>>,
}

impl OneHotEncoder {
    /// Creates an unfitted encoder over `columns`.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            categories: None,
        }
    }

    /// Learns the per-column vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an error if `records` is empty.
    pub fn fit(&mut self, records: &[RawRecord]) -> Result<()> {
        if records.is_empty() {
            return Err(SleepError::empty_input("encoder fit"));
        }

        let categories = self
            .columns
            .iter()
            .map(|col| {
                records
                    .iter()
                    .filter_map(|r| r.category(col))
                    .collect::<BTreeSet<String>>()
                    .into_iter()
                    .collect::<Vec<String>>()
            })
            .collect();

        self.categories = Some(categories);
        Ok(())
    }

    /// Returns true once fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.categories.is_some()
    }

    /// Encoded columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Learned vocabulary per column (empty before fit).
    #[must_use]
    pub fn categories(&self) -> &[Vec<String>] {
        self.categories.as_deref().unwrap_or(&[])
    }

    /// Total one-hot width.
    #[must_use]
    pub fn n_output_features(&self) -> usize {
        self.categories().iter().map(Vec::len).sum()
    }

    /// Appends the one-hot groups for `record` to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder is not fitted.
    pub fn encode_into(&self, record: &RawRecord, out: &mut Vec<f32>) -> Result<()> {
        let categories = self
            .categories
            .as_ref()
            .ok_or(SleepError::NotFitted("OneHotEncoder"))?;

        for (col, vocab) in self.columns.iter().zip(categories) {
            let start = out.len();
            out.resize(start + vocab.len(), 0.0);
            if let Some(value) = record.category(col) {
                if let Ok(pos) = vocab.binary_search(&value) {
                    out[start + pos] = 1.0;
                }
            }
        }
        Ok(())
    }

    /// One-hot groups for a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder is not fitted.
    pub fn encode(&self, record: &RawRecord) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(self.n_output_features());
        self.encode_into(record, &mut out)?;
        Ok(out)
    }

    /// Output feature names, `"{column}_{category}"`.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(self.categories())
            .flat_map(|(col, vocab)| vocab.iter().map(move |cat| format!("{col}_{cat}")))
            .collect()
    }
}
