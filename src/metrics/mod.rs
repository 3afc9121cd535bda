//! Evaluation metrics for the held-out split.
//!
//! Classification metrics only: accuracy, per-class precision, recall and
//! F1, the confusion matrix and a printable report.

pub mod classification;

pub use classification::{accuracy, confusion_matrix, ClassMetrics, ClassificationReport};
