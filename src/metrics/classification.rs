//! Classification metrics for evaluating classifier performance.

use crate::error::{Result, SleepError};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use sleep_quality::metrics::accuracy;
///
/// let y_true = vec![0, 1, 1, 0];
/// let y_pred = vec![0, 1, 0, 0];
/// assert!((accuracy(&y_pred, &y_true) - 0.75).abs() < 1e-6);
/// ```
#[must_use]
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    correct as f32 / y_true.len() as f32
}

/// Compute the confusion matrix.
///
/// Entry `(i, j)` counts samples with true class `i` predicted as `j`.
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn confusion_matrix(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Matrix<usize> {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let n_classes = y_true
        .iter()
        .chain(y_pred.iter())
        .max()
        .map_or(0, |&m| m + 1)
        .max(n_classes);

    let mut data = vec![0usize; n_classes * n_classes];
    for (&true_label, &pred_label) in y_true.iter().zip(y_pred.iter()) {
        data[true_label * n_classes + pred_label] += 1;
    }

    Matrix::from_vec(n_classes, n_classes, data)
        .expect("Confusion matrix dimensions match data length")
}

/// Per-class scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Display name of the class
    pub name: String,
    /// TP / (TP + FP), 0.0 when nothing was predicted as this class
    pub precision: f32,
    /// TP / (TP + FN), 0.0 when the class has no support
    pub recall: f32,
    /// Harmonic mean of precision and recall
    pub f1: f32,
    /// Number of true samples of this class
    pub support: usize,
}

/// Held-out evaluation summary.
///
/// `Display` renders a fixed-width text table with 3 decimal digits; use
/// [`ClassificationReport::render`] for other precisions.
///
/// # Examples
///
/// ```
/// use sleep_quality::metrics::ClassificationReport;
///
/// let y_true = vec![0, 0, 1, 1];
/// let y_pred = vec![0, 1, 1, 1];
/// let report = ClassificationReport::new(&y_pred, &y_true, &["Poor", "Good"])
///     .expect("aligned labels");
/// assert!((report.accuracy - 0.75).abs() < 1e-6);
/// assert!((report.classes[1].recall - 1.0).abs() < 1e-6);
/// println!("{report}");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Scores per class, indexed by class id
    pub classes: Vec<ClassMetrics>,
    /// Fraction of correct predictions
    pub accuracy: f64,
    /// Confusion matrix rows (true class) by columns (predicted class)
    pub confusion: Vec<Vec<usize>>,
}

impl ClassificationReport {
    /// Builds the report for class names indexed by label.
    ///
    /// # Errors
    ///
    /// Returns an error if `y_pred` and `y_true` differ in length, are
    /// empty or a label has no name.
    pub fn new(y_pred: &[usize], y_true: &[usize], class_names: &[&str]) -> Result<Self> {
        if y_pred.len() != y_true.len() {
            return Err(SleepError::dimension_mismatch(
                "predictions",
                y_true.len(),
                y_pred.len(),
            ));
        }
        if y_true.is_empty() {
            return Err(SleepError::empty_input("classification report"));
        }
        let n_classes = class_names.len();
        if let Some(&bad) = y_true.iter().chain(y_pred).find(|&&l| l >= n_classes) {
            return Err(SleepError::Data(format!(
                "label {bad} has no class name (known: {class_names:?})"
            )));
        }

        let (tp, fp, fn_counts, support) = compute_tp_fp_fn(y_pred, y_true, n_classes);
        let classes = class_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let precision = ratio(tp[i], tp[i] + fp[i]);
                let recall = ratio(tp[i], tp[i] + fn_counts[i]);
                ClassMetrics {
                    name: (*name).to_string(),
                    precision,
                    recall,
                    f1: harmonic_mean(precision, recall),
                    support: support[i],
                }
            })
            .collect();

        let cm = confusion_matrix(y_pred, y_true, n_classes);
        let confusion = (0..n_classes).map(|i| cm.row(i).to_vec()).collect();
        let correct: usize = (0..n_classes).map(|i| cm.get(i, i)).sum();

        Ok(Self {
            classes,
            accuracy: correct as f64 / y_true.len() as f64,
            confusion,
        })
    }

    /// Total support.
    #[must_use]
    pub fn support(&self) -> usize {
        self.classes.iter().map(|c| c.support).sum()
    }

    /// Unweighted means of (precision, recall, f1).
    #[must_use]
    pub fn macro_avg(&self) -> (f32, f32, f32) {
        let n = self.classes.len().max(1) as f32;
        let sum = self.classes.iter().fold((0.0, 0.0, 0.0), |acc, c| {
            (acc.0 + c.precision, acc.1 + c.recall, acc.2 + c.f1)
        });
        (sum.0 / n, sum.1 / n, sum.2 / n)
    }

    /// Support-weighted means of (precision, recall, f1).
    #[must_use]
    pub fn weighted_avg(&self) -> (f32, f32, f32) {
        let total = self.support();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let sum = self.classes.iter().fold((0.0, 0.0, 0.0), |acc, c| {
            let w = c.support as f32;
            (
                acc.0 + c.precision * w,
                acc.1 + c.recall * w,
                acc.2 + c.f1 * w,
            )
        });
        let t = total as f32;
        (sum.0 / t, sum.1 / t, sum.2 / t)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(3))
    }
}

impl ClassificationReport {
    /// Renders the report table with `digits` decimal places.
    #[must_use]
    pub fn render(&self, digits: usize) -> String {
        let width = self
            .classes
            .iter()
            .map(|c| c.name.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);
        let col = (digits + 2).max(9);
        let total = self.support();

        let mut out = format!(
            "{:>width$} {:>col$} {:>col$} {:>col$} {:>col$}\n\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for c in &self.classes {
            out.push_str(&format!(
                "{:>width$} {:>col$.digits$} {:>col$.digits$} {:>col$.digits$} {:>col$}\n",
                c.name, c.precision, c.recall, c.f1, c.support
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "{:>width$} {:>col$} {:>col$} {:>col$.digits$} {total:>col$}\n",
            "accuracy", "", "", self.accuracy
        ));
        let (p, r, f1) = self.macro_avg();
        out.push_str(&format!(
            "{:>width$} {p:>col$.digits$} {r:>col$.digits$} {f1:>col$.digits$} {total:>col$}\n",
            "macro avg"
        ));
        let (p, r, f1) = self.weighted_avg();
        out.push_str(&format!(
            "{:>width$} {p:>col$.digits$} {r:>col$.digits$} {f1:>col$.digits$} {total:>col$}",
            "weighted avg"
        ));
        out
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

fn harmonic_mean(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Helper function to compute TP, FP, FN and support for each class.
fn compute_tp_fp_fn(
    y_pred: &[usize],
    y_true: &[usize],
    n_classes: usize,
) -> (Vec<usize>, Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut tp = vec![0usize; n_classes];
    let mut fp = vec![0usize; n_classes];
    let mut fn_counts = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];

    for (&true_label, &pred_label) in y_true.iter().zip(y_pred.iter()) {
        support[true_label] += 1;

        if true_label == pred_label {
            tp[true_label] += 1;
        } else {
            fp[pred_label] += 1;
            fn_counts[true_label] += 1;
        }
    }

    (tp, fp, fn_counts, support)
}
