//! Raw tabular records and CSV loading.
//!
//! A [`RawRecord`] is one subject's measurements keyed by column name.
//! Lookup is always by name, so the order in which a caller supplies
//! fields never matters. Missing values are data here, not errors:
//! numeric lookups yield NaN and categorical lookups yield `None`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Cell tokens treated as missing, matching common tabular loaders.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "NULL", "null", "None", "<NA>", "#N/A", "#NA",
];

/// Returns true if `cell` (already trimmed) denotes a missing value.
#[must_use]
pub fn is_missing_token(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Normalizes a column header: trim, spaces and hyphens to `_`, lowercase.
///
/// # Examples
///
/// ```
/// use sleep_quality::data::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" Quality of Sleep "), "quality_of_sleep");
/// assert_eq!(normalize_column_name("Heart-Rate"), "heart_rate");
/// ```
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// A single field value: number, free-form text, or explicit null.
///
/// Deserializes from untagged JSON (`7`, `"Nurse"`, `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric measurement
    Number(f64),
    /// Categorical or unparsed text
    Text(String),
    /// Explicitly missing
    Null,
}

impl FieldValue {
    /// Parses a CSV cell into a value.
    #[must_use]
    pub fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if is_missing_token(cell) {
            return FieldValue::Null;
        }
        match cell.parse::<f64>() {
            Ok(v) => FieldValue::Number(v),
            Err(_) => FieldValue::Text(cell.to_string()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// One subject's measurements, keyed by normalized column name.
///
/// # Examples
///
/// ```
/// use sleep_quality::data::{FieldValue, RawRecord};
///
/// let record: RawRecord = [
///     ("sleep_duration", FieldValue::from(7.5)),
///     ("gender", FieldValue::from("Female")),
///     ("sleep_disorder", FieldValue::Null),
/// ]
/// .into_iter()
/// .collect();
///
/// assert!((record.number("sleep_duration") - 7.5).abs() < 1e-9);
/// assert_eq!(record.category("gender").as_deref(), Some("Female"));
/// assert_eq!(record.category("sleep_disorder"), None);
/// assert!(record.number("age").is_nan());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: HashMap<String, FieldValue>,
}

impl RawRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the raw value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Removes a field.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Number of fields present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Numeric view of a field; NaN when absent, null or unparsable.
    #[must_use]
    pub fn number(&self, name: &str) -> f64 {
        match self.fields.get(name) {
            Some(FieldValue::Number(v)) => *v,
            Some(FieldValue::Text(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Some(FieldValue::Null) | None => f64::NAN,
        }
    }

    /// Categorical view of a field; `None` when absent, null or a missing token.
    ///
    /// Integral numbers render without a fractional part so `3` and `"3"`
    /// encode identically.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            FieldValue::Text(s) => {
                let s = s.trim();
                (!is_missing_token(s)).then(|| s.to_string())
            }
            FieldValue::Number(v) if v.is_nan() => None,
            FieldValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            FieldValue::Number(v) => Some(v.to_string()),
            FieldValue::Null => None,
        }
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A loaded tabular dataset with normalized headers.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<RawRecord>,
}

impl Dataset {
    /// Builds a dataset from normalized column names and records.
    #[must_use]
    pub fn new(columns: Vec<String>, records: Vec<RawRecord>) -> Self {
        Self { columns, records }
    }

    /// Loads a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a row is malformed.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        tracing::debug!(
            path = %path.display(),
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Loads CSV data from any reader. Headers are normalized with
    /// [`normalize_column_name`].
    ///
    /// # Errors
    ///
    /// Returns an error if the header or any row cannot be parsed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(normalize_column_name)
            .collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let record = columns
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), FieldValue::from_cell(cell)))
                .collect();
            records.push(record);
        }

        Ok(Self { columns, records })
    }

    /// Normalized column names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns true if the dataset has a column named `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All rows.
    #[must_use]
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Drops rows whose `column` is not a finite number. Returns how many
    /// rows were removed.
    pub fn drop_missing(&mut self, column: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.number(column).is_finite());
        before - self.records.len()
    }
}
