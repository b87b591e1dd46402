//! Vector similarity and ranking helpers shared by the models.

use sprs::CsVecView;
use std::cmp::Ordering;

/// Dot product of a sparse vector with a dense one
pub fn dot_sparse_dense(sparse: &CsVecView<'_, f32>, dense: &[f32]) -> f32 {
    sparse
        .iter()
        .filter_map(|(idx, &v)| dense.get(idx).map(|&d| v * d))
        .sum()
}

/// Dot product of two sparse vectors with sorted indices
pub fn dot_sparse(a: &CsVecView<'_, f32>, b: &CsVecView<'_, f32>) -> f32 {
    let (a_idx, a_val) = (a.indices(), a.data());
    let (b_idx, b_val) = (b.indices(), b.data());
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;

    while i < a_idx.len() && j < b_idx.len() {
        match a_idx[i].cmp(&b_idx[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a_val[i] * b_val[j];
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Cosine similarity from a dot product and the two norms.
///
/// A zero vector is similar to nothing: the result is 0.0.
pub fn cosine(dot: f32, norm_a: f32, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Top `n` `(index, score)` pairs by descending score.
///
/// Equal scores keep ascending index order, so results are reproducible.
/// NaN scores are dropped.
pub fn top_n(scores: impl IntoIterator<Item = (usize, f32)>, n: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.into_iter().filter(|(_, s)| !s.is_nan()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::CsVec;

    #[test]
    fn test_sparse_dots() {
        let a = CsVec::new(5, vec![0, 2, 4], vec![1.0f32, 2.0, 3.0]);
        let b = CsVec::new(5, vec![2, 3, 4], vec![4.0f32, 5.0, 6.0]);

        assert_eq!(dot_sparse(&a.view(), &b.view()), 2.0 * 4.0 + 3.0 * 6.0);
        assert_eq!(dot_sparse_dense(&a.view(), &[1.0, 1.0, 1.0, 1.0, 1.0]), 6.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine(0.0, 0.0, 3.0), 0.0);
        assert!((cosine(6.0, 2.0, 3.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_top_n_orders_and_breaks_ties() {
        let ranked = top_n(vec![(3, 0.5), (1, 0.9), (2, 0.5), (0, f32::NAN), (4, 0.1)], 3);
        assert_eq!(ranked, vec![(1, 0.9), (2, 0.5), (3, 0.5)]);
    }
}
