//! Helper functions for tree building algorithms.
//!
//! Split search works on weighted class counts so bootstrap multiplicity
//! and class-balanced weights enter the impurity directly.

use super::{Leaf, Node, TreeNode};
use crate::primitives::Matrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

// ============================================================================
// Impurity
// ============================================================================

/// Gini impurity of a weighted class histogram.
///
/// Gini = 1 - Σ(p_i²). Returns 0.0 for an empty histogram.
pub(super) fn gini(counts: &[f32]) -> f32 {
    let total: f32 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let sum_sq: f32 = counts.iter().map(|c| (c / total) * (c / total)).sum();
    (1.0 - sum_sq).max(0.0)
}

/// Weighted class histogram over `indices`.
pub(super) fn weighted_counts(
    y: &[usize],
    weights: &[f32],
    indices: &[usize],
    n_classes: usize,
) -> Vec<f32> {
    let mut counts = vec![0.0; n_classes];
    for &i in indices {
        counts[y[i]] += weights[i];
    }
    counts
}

// ============================================================================
// Split search
// ============================================================================

/// Candidate split for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Split {
    pub(super) feature_idx: usize,
    pub(super) threshold: f32,
    pub(super) missing_left: bool,
    /// Parent impurity minus weighted child impurity
    pub(super) improvement: f32,
}

/// Outcome of scanning one feature at a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum FeatureScan {
    /// Fewer than two distinct finite values; does not count toward
    /// the feature quota.
    Constant,
    /// Feature varies but no threshold reduces impurity.
    NoImprovement,
    /// Best threshold for this feature.
    Found(Split),
}

/// Which child receives missing values for a candidate split.
///
/// Missing values follow the heavier side of the finite samples; ties go
/// left.
fn missing_goes_left(left_weight: f32, right_weight: f32) -> bool {
    left_weight >= right_weight
}

/// Scans every midpoint threshold of `feature_idx` over `indices`.
pub(super) fn scan_feature(
    x: &Matrix<f32>,
    y: &[usize],
    weights: &[f32],
    indices: &[usize],
    feature_idx: usize,
    n_classes: usize,
    parent_impurity: f32,
) -> FeatureScan {
    let mut present: Vec<(f32, usize)> = Vec::with_capacity(indices.len());
    let mut missing = vec![0.0; n_classes];
    for &i in indices {
        let v = x.get(i, feature_idx);
        if v.is_nan() {
            missing[y[i]] += weights[i];
        } else {
            present.push((v, i));
        }
    }

    if present.len() < 2 {
        return FeatureScan::Constant;
    }
    present.sort_by(|a, b| a.0.total_cmp(&b.0));
    if present[0].0 >= present[present.len() - 1].0 {
        return FeatureScan::Constant;
    }

    let mut total = vec![0.0; n_classes];
    for &(_, i) in &present {
        total[y[i]] += weights[i];
    }
    let missing_weight: f32 = missing.iter().sum();
    let node_weight: f32 = total.iter().sum::<f32>() + missing_weight;
    if node_weight <= 0.0 {
        return FeatureScan::NoImprovement;
    }

    let mut left = vec![0.0; n_classes];
    let mut right = vec![0.0; n_classes];
    let mut best: Option<Split> = None;

    for k in 0..present.len() - 1 {
        let (value, i) = present[k];
        left[y[i]] += weights[i];

        let next = present[k + 1].0;
        if next <= value {
            continue;
        }

        let mut threshold = value + (next - value) / 2.0;
        if threshold >= next || !threshold.is_finite() {
            threshold = value;
        }

        for c in 0..n_classes {
            right[c] = total[c] - left[c];
        }
        let left_weight: f32 = left.iter().sum();
        let right_weight: f32 = right.iter().sum();
        let missing_left = missing_goes_left(left_weight, right_weight);

        let (child_impurity, wl, wr) = if missing_left {
            let with_missing: Vec<f32> = left.iter().zip(&missing).map(|(a, b)| a + b).collect();
            (
                (left_weight + missing_weight) * gini(&with_missing) + right_weight * gini(&right),
                left_weight + missing_weight,
                right_weight,
            )
        } else {
            let with_missing: Vec<f32> = right.iter().zip(&missing).map(|(a, b)| a + b).collect();
            (
                left_weight * gini(&left) + (right_weight + missing_weight) * gini(&with_missing),
                left_weight,
                right_weight + missing_weight,
            )
        };
        if wl <= 0.0 || wr <= 0.0 {
            continue;
        }

        let improvement = parent_impurity - child_impurity / node_weight;
        if improvement > best.map_or(0.0, |b| b.improvement) {
            best = Some(Split {
                feature_idx,
                threshold,
                missing_left,
                improvement,
            });
        }
    }

    best.map_or(FeatureScan::NoImprovement, FeatureScan::Found)
}

/// Finds the best split among randomly ordered features.
///
/// Evaluates features until `max_features` non-constant ones were seen,
/// so constant features never use up the quota.
#[allow(clippy::too_many_arguments)]
pub(super) fn find_best_split(
    x: &Matrix<f32>,
    y: &[usize],
    weights: &[f32],
    indices: &[usize],
    n_classes: usize,
    max_features: usize,
    parent_impurity: f32,
    rng: &mut StdRng,
) -> Option<Split> {
    let mut features: Vec<usize> = (0..x.n_cols()).collect();
    features.shuffle(rng);

    let mut evaluated = 0;
    let mut best: Option<Split> = None;
    for feature_idx in features {
        if evaluated >= max_features {
            break;
        }
        match scan_feature(
            x,
            y,
            weights,
            indices,
            feature_idx,
            n_classes,
            parent_impurity,
        ) {
            FeatureScan::Constant => {}
            FeatureScan::NoImprovement => evaluated += 1,
            FeatureScan::Found(split) => {
                evaluated += 1;
                if best.map_or(true, |b| split.improvement > b.improvement) {
                    best = Some(split);
                }
            }
        }
    }
    best
}

/// Partitions `indices` by a split, routing NaN per `missing_left`.
pub(super) fn partition(
    x: &Matrix<f32>,
    indices: &[usize],
    split: &Split,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &i in indices {
        let v = x.get(i, split.feature_idx);
        let go_left = if v.is_nan() {
            split.missing_left
        } else {
            v <= split.threshold
        };
        if go_left {
            left.push(i);
        } else {
            right.push(i);
        }
    }
    (left, right)
}

// ============================================================================
// Leaves and importances
// ============================================================================

/// Builds a leaf holding the normalized class distribution.
pub(super) fn make_leaf(counts: Vec<f32>, n_samples: usize, impurity: f32) -> TreeNode {
    let weighted_n: f32 = counts.iter().sum();
    let n_classes = counts.len();
    let distribution = if weighted_n > 0.0 {
        counts.iter().map(|c| c / weighted_n).collect()
    } else {
        vec![1.0 / n_classes.max(1) as f32; n_classes]
    };
    TreeNode::Leaf(Leaf {
        distribution,
        n_samples,
        weighted_n,
        impurity,
    })
}

/// Accumulates weighted impurity decrease per feature.
pub(super) fn accumulate_importances(node: &TreeNode, importances: &mut [f32]) {
    if let TreeNode::Node(Node {
        feature_idx,
        weighted_n,
        impurity,
        left,
        right,
        ..
    }) = node
    {
        let decrease = weighted_n * impurity
            - left.weighted_n() * left.impurity()
            - right.weighted_n() * right.impurity();
        importances[*feature_idx] += decrease.max(0.0);
        accumulate_importances(left, importances);
        accumulate_importances(right, importances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_gini_pure_and_mixed() {
        assert!(gini(&[4.0, 0.0]).abs() < 1e-6);
        assert!((gini(&[2.0, 2.0]) - 0.5).abs() < 1e-6);
        assert!(gini(&[]).abs() < 1e-6);
        assert!(gini(&[0.0, 0.0]).abs() < 1e-6);
    }

    #[test]
    fn test_gini_respects_weights() {
        // 1 sample of class 0 weighted 3, 3 samples of class 1 weighted 1
        assert!((gini(&[3.0, 3.0]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_counts() {
        let y = [0, 1, 1, 0];
        let w = [1.0, 2.0, 0.5, 1.0];
        assert_eq!(weighted_counts(&y, &w, &[0, 1, 2], 2), vec![1.0, 2.5]);
    }

    #[test]
    fn test_scan_feature_finds_midpoint() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 10.0, 11.0]).expect("4x1");
        let y = [0, 0, 1, 1];
        let w = [1.0; 4];
        let scan = scan_feature(&x, &y, &w, &[0, 1, 2, 3], 0, 2, 0.5);
        let FeatureScan::Found(split) = scan else {
            panic!("expected a split, got {scan:?}");
        };
        assert!((split.threshold - 6.0).abs() < 1e-6);
        assert!((split.improvement - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_scan_feature_constant() {
        let x = Matrix::from_vec(3, 1, vec![5.0, 5.0, f32::NAN]).expect("3x1");
        let scan = scan_feature(&x, &[0, 1, 0], &[1.0; 3], &[0, 1, 2], 0, 2, 0.44);
        assert_eq!(scan, FeatureScan::Constant);
    }

    #[test]
    fn test_scan_feature_routes_missing_to_heavier_side() {
        // Three finite samples on the right, one on the left, one NaN
        let x = Matrix::from_vec(5, 1, vec![0.0, 5.0, 6.0, 7.0, f32::NAN]).expect("5x1");
        let y = [0, 1, 1, 1, 1];
        let scan = scan_feature(&x, &y, &[1.0; 5], &[0, 1, 2, 3, 4], 0, 2, gini(&[1.0, 4.0]));
        let FeatureScan::Found(split) = scan else {
            panic!("expected a split");
        };
        assert!(!split.missing_left);
        assert!((split.threshold - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_partition_respects_missing_direction() {
        let x = Matrix::from_vec(3, 1, vec![1.0, f32::NAN, 9.0]).expect("3x1");
        let split = Split {
            feature_idx: 0,
            threshold: 5.0,
            missing_left: true,
            improvement: 0.1,
        };
        let (left, right) = partition(&x, &[0, 1, 2], &split);
        assert_eq!(left, vec![0, 1]);
        assert_eq!(right, vec![2]);
    }

    #[test]
    fn test_find_best_split_picks_informative_feature() {
        // Feature 0 is noise, feature 1 separates the classes, feature 2 constant
        let x = Matrix::from_vec(
            4,
            3,
            vec![
                3.0, 0.0, 1.0, //
                1.0, 0.1, 1.0, //
                2.0, 1.0, 1.0, //
                3.0, 1.1, 1.0, //
            ],
        )
        .expect("4x3");
        let y = [0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let split = find_best_split(&x, &y, &[1.0; 4], &[0, 1, 2, 3], 2, 3, 0.5, &mut rng)
            .expect("informative feature exists");
        assert_eq!(split.feature_idx, 1);
    }

    #[test]
    fn test_make_leaf_normalizes() {
        let TreeNode::Leaf(leaf) = make_leaf(vec![1.0, 3.0], 4, 0.375) else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.distribution, vec![0.25, 0.75]);
        assert_eq!(leaf.n_samples, 4);
        assert!((leaf.weighted_n - 4.0).abs() < 1e-6);
    }
}
