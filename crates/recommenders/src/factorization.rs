//! Factorization Recommender - rank-reduced reconstruction of the ratings
//!
//! The rating matrix is approximated by its top `rank` singular triplets and
//! the full dense reconstruction is kept. Recommending for a user is then a
//! row lookup, and predicting a rating is a single cell lookup.
//!
//! ## Algorithm
//! Randomized truncated SVD (Halko, Martinsson & Tropp):
//! 1. Sketch the column space with a random test matrix of width
//!    `rank + oversamples`
//! 2. Sharpen it with `power_iters` rounds of subspace iteration,
//!    re-orthonormalising (QR) after every product
//! 3. Project the matrix onto the basis and take the SVD of the small
//!    projected matrix
//! 4. Keep the top `rank` right singular vectors `V` and reconstruct
//!    `A V Vᵀ`
//!
//! Unlike the cluster model, already-rated movies are not masked out of
//! `recommend`.

use crate::error::{ModelError, Result};
use crate::similarity::top_n;
use crate::traits::RatingPredictor;
use crate::types::Recommendation;
use data_loader::RatingStore;
use nalgebra::{DMatrix, SVD};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sprs::CsMat;
use tracing::{debug, info, instrument};

const MODEL_NAME: &str = "factorization";

/// Low-rank matrix approximation model
#[derive(Debug, Clone)]
pub struct FactorizationRecommender {
    rank: usize,
    oversamples: usize,
    power_iters: usize,
    seed: u64,

    state: Option<FactorizationState>,
}

#[derive(Debug, Clone)]
struct FactorizationState {
    reconstruction: Array2<f32>,
    singular_values: Vec<f32>,
    explained_variance_ratio: Vec<f32>,
    titles: Vec<String>,
}

impl FactorizationRecommender {
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            oversamples: 10,
            power_iters: 7,
            seed: 42,
            state: None,
        }
    }

    /// Configure the extra sketch columns (default: 10)
    pub fn with_oversamples(mut self, oversamples: usize) -> Self {
        self.oversamples = oversamples;
        self
    }

    /// Configure the subspace iteration rounds (default: 7)
    pub fn with_power_iters(mut self, power_iters: usize) -> Self {
        self.power_iters = power_iters;
        self
    }

    /// Configure the seed of the random sketch (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Factorize the store's rating matrix and keep the reconstruction
    #[instrument(skip(self, store), fields(rank = self.rank))]
    pub fn fit(&mut self, store: &RatingStore) -> Result<&mut Self> {
        let (n_users, n_movies) = (store.n_users(), store.n_movies());
        if n_users == 0 || n_movies == 0 {
            return Err(ModelError::EmptyInput("rating matrix"));
        }
        if self.rank == 0 || self.rank > n_users.min(n_movies) {
            return Err(ModelError::InvalidParameter {
                name: "rank",
                reason: format!(
                    "must be in 1..={} for a {}x{} matrix, got {}",
                    n_users.min(n_movies),
                    n_users,
                    n_movies,
                    self.rank
                ),
            });
        }

        info!("Factorizing {}x{} ratings at rank {}", n_users, n_movies, self.rank);
        let matrix = store.matrix();
        let (singular_values, components) = randomized_svd(
            matrix,
            self.rank,
            self.oversamples,
            self.power_iters,
            self.seed,
        )?;

        let projected = sparse_times_dense(matrix, &components);
        let explained_variance_ratio = explained_variance(matrix, &projected);
        let dense = &projected * components.transpose();
        let reconstruction = Array2::from_shape_fn((n_users, n_movies), |(u, m)| dense[(u, m)] as f32);

        debug!(
            singular_values = ?&singular_values,
            explained = explained_variance_ratio.iter().sum::<f64>(),
            "factorization done"
        );
        self.state = Some(FactorizationState {
            reconstruction,
            singular_values: singular_values.iter().map(|&s| s as f32).collect(),
            explained_variance_ratio: explained_variance_ratio.iter().map(|&r| r as f32).collect(),
            titles: store.movies().labels().to_vec(),
        });
        Ok(self)
    }

    fn state(&self) -> Result<&FactorizationState> {
        self.state
            .as_ref()
            .ok_or(ModelError::NotFitted { model: MODEL_NAME })
    }

    /// Top `n` movies of a user's reconstructed row
    ///
    /// Returns an empty list for a row index outside the fitted matrix.
    #[instrument(skip(self))]
    pub fn recommend(&self, user_index: usize, n: usize) -> Result<Vec<Recommendation>> {
        let state = self.state()?;
        if user_index >= state.reconstruction.nrows() {
            debug!("User row {} outside the reconstruction", user_index);
            return Ok(Vec::new());
        }

        let row = state.reconstruction.row(user_index);
        Ok(top_n(row.iter().copied().enumerate(), n)
            .into_iter()
            .map(|(movie, score)| Recommendation::new(movie, state.titles[movie].as_str(), score))
            .collect())
    }

    /// Singular values of the kept components, descending
    pub fn singular_values(&self) -> Result<&[f32]> {
        Ok(&self.state()?.singular_values)
    }

    /// Share of the total column variance carried by each component
    pub fn explained_variance_ratio(&self) -> Result<&[f32]> {
        Ok(&self.state()?.explained_variance_ratio)
    }

    /// The dense users × movies reconstruction
    pub fn reconstruction(&self) -> Result<&Array2<f32>> {
        Ok(&self.state()?.reconstruction)
    }
}

impl RatingPredictor for FactorizationRecommender {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    fn predict_rating(
        &self,
        _store: &RatingStore,
        user_index: usize,
        movie_index: usize,
    ) -> Result<Option<f32>> {
        Ok(self
            .state()?
            .reconstruction
            .get([user_index, movie_index])
            .copied())
    }
}

/// Top `rank` singular values and right singular vectors (as columns)
fn randomized_svd(
    matrix: &CsMat<f32>,
    rank: usize,
    oversamples: usize,
    power_iters: usize,
    seed: u64,
) -> Result<(Vec<f64>, DMatrix<f64>)> {
    let n_cols = matrix.cols();
    let width = (rank + oversamples).min(matrix.rows().min(n_cols));

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sketch = DMatrix::from_fn(n_cols, width, |_, _| rng.random_range(-1.0..1.0));

    let mut basis = sparse_times_dense(matrix, &sketch).qr().q();
    for _ in 0..power_iters {
        let row_space = sparse_t_times_dense(matrix, &basis).qr().q();
        basis = sparse_times_dense(matrix, &row_space).qr().q();
    }

    // B = Qᵀ A is width × n; its right singular vectors approximate A's
    let projected = sparse_t_times_dense(matrix, &basis).transpose();
    let svd = SVD::new(projected, false, true);
    let v_t = svd
        .v_t
        .ok_or(ModelError::Decomposition("SVD did not return right singular vectors"))?;

    let singular_values = svd.singular_values.iter().take(rank).copied().collect();
    let components = v_t.rows(0, rank).transpose();
    Ok((singular_values, components))
}

/// `A · D` for sparse `A` (m × n) and dense `D` (n × l)
fn sparse_times_dense(matrix: &CsMat<f32>, dense: &DMatrix<f64>) -> DMatrix<f64> {
    let width = dense.ncols();
    let rows: Vec<f64> = (0..matrix.rows())
        .into_par_iter()
        .flat_map_iter(|i| {
            let mut out = vec![0.0f64; width];
            if let Some(row) = matrix.outer_view(i) {
                for (j, &value) in row.iter() {
                    let value = f64::from(value);
                    for (c, slot) in out.iter_mut().enumerate() {
                        *slot += value * dense[(j, c)];
                    }
                }
            }
            out
        })
        .collect();
    DMatrix::from_row_slice(matrix.rows(), width, &rows)
}

/// `Aᵀ · D` for sparse `A` (m × n) and dense `D` (m × l)
fn sparse_t_times_dense(matrix: &CsMat<f32>, dense: &DMatrix<f64>) -> DMatrix<f64> {
    let mut product = DMatrix::zeros(matrix.cols(), dense.ncols());
    for (i, row) in matrix.outer_iterator().enumerate() {
        for (j, &value) in row.iter() {
            let value = f64::from(value);
            for c in 0..dense.ncols() {
                product[(j, c)] += value * dense[(i, c)];
            }
        }
    }
    product
}

/// Variance of each projected component over the total column variance
fn explained_variance(matrix: &CsMat<f32>, projected: &DMatrix<f64>) -> Vec<f64> {
    let n_rows = matrix.rows() as f64;

    let mut sums = vec![0.0f64; matrix.cols()];
    let mut squares = vec![0.0f64; matrix.cols()];
    for row in matrix.outer_iterator() {
        for (j, &value) in row.iter() {
            let value = f64::from(value);
            sums[j] += value;
            squares[j] += value * value;
        }
    }
    let total: f64 = sums
        .iter()
        .zip(&squares)
        .map(|(&s, &sq)| sq / n_rows - (s / n_rows).powi(2))
        .sum();

    projected
        .column_iter()
        .map(|column| {
            let mean = column.sum() / n_rows;
            let variance = column.norm_squared() / n_rows - mean * mean;
            if total > 0.0 { variance / total } else { 0.0 }
        })
        .collect()
}
