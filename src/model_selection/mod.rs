//! Train/test splitting.
//!
//! Stratified splitting keeps the class proportions of the full dataset in
//! both partitions, which matters for the imbalanced Good/Poor target.

use crate::error::{Result, SleepError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Splits sample indices into (train, test) preserving class proportions.
///
/// The test partition holds `ceil(test_size * n)` samples. Each class
/// contributes its proportional share, with leftover slots going to the
/// classes with the largest fractional remainder; every class keeps at
/// least one sample on each side. The same `random_state` always produces
/// the same partition.
///
/// # Arguments
///
/// * `labels` - Class index per sample
/// * `test_size` - Fraction of samples held out, in (0, 1)
/// * `random_state` - Seed for the per-class shuffles
///
/// # Errors
///
/// Returns an error if `test_size` is out of range, the labels are empty,
/// only one class is present or a class has fewer than two members.
///
/// # Examples
///
/// ```
/// use sleep_quality::model_selection::stratified_train_test_split;
///
/// let labels = vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
/// let (train, test) = stratified_train_test_split(&labels, 0.2, 42).expect("valid split");
/// assert_eq!(train.len(), 8);
/// assert_eq!(test.len(), 2);
/// assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 1);
/// ```
pub fn stratified_train_test_split(
    labels: &[usize],
    test_size: f64,
    random_state: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SleepError::InvalidHyperparameter {
            param: "test_size".to_string(),
            value: test_size.to_string(),
            constraint: "in (0, 1)".to_string(),
        });
    }
    if labels.is_empty() {
        return Err(SleepError::empty_input("stratified split"));
    }

    let n_classes = labels.iter().max().map_or(0, |m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }
    by_class.retain(|members| !members.is_empty());

    if by_class.len() < 2 {
        return Err(SleepError::Data(
            "target has a single class; cannot stratify".to_string(),
        ));
    }
    if let Some(small) = by_class.iter().find(|members| members.len() < 2) {
        return Err(SleepError::Data(format!(
            "class of sample {} has a single member; stratification needs at least 2",
            small[0]
        )));
    }

    let n = labels.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    let allocation = allocate_test_counts(&by_class, n, n_test);

    let mut rng = StdRng::seed_from_u64(random_state);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (members, &k) in by_class.iter_mut().zip(&allocation) {
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..k]);
        train.extend_from_slice(&members[k..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok((train, test))
}

/// Largest-remainder allocation of `n_test` slots across classes.
fn allocate_test_counts(by_class: &[Vec<usize>], n: usize, n_test: usize) -> Vec<usize> {
    let exact: Vec<f64> = by_class
        .iter()
        .map(|members| n_test as f64 * members.len() as f64 / n as f64)
        .collect();
    let mut counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut order: Vec<usize> = (0..by_class.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    let assigned: usize = counts.iter().sum();
    for &c in order.iter().take(n_test.saturating_sub(assigned)) {
        counts[c] += 1;
    }

    for (count, members) in counts.iter_mut().zip(by_class) {
        *count = (*count).clamp(1, members.len() - 1);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_neg: usize, n_pos: usize) -> Vec<usize> {
        std::iter::repeat(0)
            .take(n_neg)
            .chain(std::iter::repeat(1).take(n_pos))
            .collect()
    }

    #[test]
    fn test_split_sizes_and_proportions() {
        let y = labels(60, 40);
        let (train, test) = stratified_train_test_split(&y, 0.2, 42).expect("split");
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(test.iter().filter(|&&i| y[i] == 1).count(), 8);
    }

    #[test]
    fn test_split_partitions_indices() {
        let y = labels(7, 5);
        let (train, test) = stratified_train_test_split(&y, 0.25, 1).expect("split");
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_reproducible() {
        let y = labels(30, 20);
        let a = stratified_train_test_split(&y, 0.2, 42).expect("a");
        let b = stratified_train_test_split(&y, 0.2, 42).expect("b");
        assert_eq!(a, b);
        let c = stratified_train_test_split(&y, 0.2, 43).expect("c");
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_test_size_rounds_up() {
        let y = labels(6, 5);
        let (_, test) = stratified_train_test_split(&y, 0.2, 0).expect("split");
        // ceil(0.2 * 11) = 3
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn test_every_class_on_both_sides() {
        let y = labels(97, 3);
        let (train, test) = stratified_train_test_split(&y, 0.2, 5).expect("split");
        assert!(test.iter().any(|&i| y[i] == 1));
        assert!(train.iter().any(|&i| y[i] == 1));
    }

    #[test]
    fn test_single_class_errors() {
        assert!(matches!(
            stratified_train_test_split(&labels(10, 0), 0.2, 0),
            Err(SleepError::Data(_))
        ));
    }

    #[test]
    fn test_singleton_class_errors() {
        assert!(stratified_train_test_split(&labels(10, 1), 0.2, 0).is_err());
    }

    #[test]
    fn test_invalid_test_size_errors() {
        let y = labels(5, 5);
        assert!(stratified_train_test_split(&y, 0.0, 0).is_err());
        assert!(stratified_train_test_split(&y, 1.0, 0).is_err());
        assert!(stratified_train_test_split(&y, f64::NAN, 0).is_err());
    }

    #[test]
    fn test_empty_labels_errors() {
        assert!(stratified_train_test_split(&[], 0.2, 0).is_err());
    }
}
