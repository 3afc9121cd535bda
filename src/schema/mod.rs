//! Feature schema: which columns feed the model and in what order.
//!
//! The schema is captured once at training time from a fixed candidate
//! list filtered by presence in the data. Its ordering defines the meaning
//! of every transformed feature index and is persisted with the model.

use crate::error::{Result, SleepError};
use serde::{Deserialize, Serialize};

/// Numeric feature candidates, in schema order.
pub const NUMERIC_CANDIDATES: &[&str] = &[
    "sleep_duration",
    "physical_activity_level",
    "stress_level",
    "age",
    "heart_rate",
    "daily_steps",
];

/// Categorical feature candidates, in schema order.
pub const CATEGORICAL_CANDIDATES: &[&str] =
    &["gender", "occupation", "bmi_category", "sleep_disorder"];

/// Observed 1-10 sleep quality score the label is derived from.
pub const TARGET_COLUMN: &str = "quality_of_sleep";

/// Minimum quality score counted as good sleep.
pub const GOOD_SLEEP_MIN_QUALITY: f64 = 7.0;

/// Human-readable label derivation rule, persisted in metadata.
pub const TARGET_DEFINITION: &str = "sleep_quality_label = 1 if quality_of_sleep >= 7 else 0";

/// Class index of "Good" sleep.
pub const GOOD_CLASS: usize = 1;

/// Class index of "Poor" sleep.
pub const POOR_CLASS: usize = 0;

/// Derives the binary label from an observed quality score.
///
/// # Examples
///
/// ```
/// use sleep_quality::schema::{derive_label, GOOD_CLASS, POOR_CLASS};
///
/// assert_eq!(derive_label(7.0), GOOD_CLASS);
/// assert_eq!(derive_label(6.9), POOR_CLASS);
/// ```
#[must_use]
pub fn derive_label(quality: f64) -> usize {
    if quality >= GOOD_SLEEP_MIN_QUALITY {
        GOOD_CLASS
    } else {
        POOR_CLASS
    }
}

/// Ordered numeric and categorical column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    numeric: Vec<String>,
    categorical: Vec<String>,
}

impl FeatureSchema {
    /// Creates a schema from explicit column lists.
    ///
    /// # Errors
    ///
    /// Returns an error if both lists are empty or a column appears twice.
    pub fn new(numeric: Vec<String>, categorical: Vec<String>) -> Result<Self> {
        if numeric.is_empty() && categorical.is_empty() {
            return Err(SleepError::Data(
                "no feature columns present in dataset".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for col in numeric.iter().chain(categorical.iter()) {
            if !seen.insert(col.as_str()) {
                return Err(SleepError::Data(format!("duplicate feature column '{col}'")));
            }
        }
        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Selects the candidate columns present in `columns`, keeping
    /// candidate order.
    ///
    /// # Errors
    ///
    /// Returns an error if no candidate column is present.
    pub fn detect(columns: &[String]) -> Result<Self> {
        let present = |candidates: &[&str]| -> Vec<String> {
            candidates
                .iter()
                .filter(|c| columns.iter().any(|col| col == *c))
                .map(|c| (*c).to_string())
                .collect()
        };
        Self::new(present(NUMERIC_CANDIDATES), present(CATEGORICAL_CANDIDATES))
    }

    /// Numeric columns in schema order.
    #[must_use]
    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    /// Categorical columns in schema order.
    #[must_use]
    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Numeric columns followed by categorical columns.
    #[must_use]
    pub fn all_columns(&self) -> Vec<String> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .cloned()
            .collect()
    }
}
