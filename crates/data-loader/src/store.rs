//! The Rating Store: sparse user×movie matrix plus its label mappings.
//!
//! Rows are users, columns are movies. An absent entry means "unrated";
//! every stored value is strictly positive. The store is built once and
//! only read afterwards, so it can be shared behind an `Arc` freely.

use crate::error::{DataLoadError, Result};
use crate::types::{LabelIndex, MovieTitle, UserId};
use sprs::{CsMat, CsVecView, TriMat};
use std::collections::{HashMap, HashSet};

/// Sparse rating matrix with validated user/movie labels and a tag lookup.
#[derive(Debug, Clone)]
pub struct RatingStore {
    matrix: CsMat<f32>,
    users: LabelIndex<UserId>,
    movies: LabelIndex<MovieTitle>,
    tags: HashMap<MovieTitle, Vec<String>>,
    /// L2 norm of every user row, precomputed for cosine similarity
    row_norms: Vec<f32>,
}

impl RatingStore {
    /// Build a store from label arrays and `(row, col, rating)` triplets.
    ///
    /// Fails if a coordinate falls outside the label arrays, a rating is
    /// not a finite positive number, or a cell is given twice.
    pub fn new(
        users: LabelIndex<UserId>,
        movies: LabelIndex<MovieTitle>,
        triplets: impl IntoIterator<Item = (usize, usize, f32)>,
    ) -> Result<Self> {
        let (n_users, n_movies) = (users.len(), movies.len());
        let mut tri = TriMat::new((n_users, n_movies));
        let mut seen = HashSet::new();

        for (row, col, value) in triplets {
            if row >= n_users {
                return Err(DataLoadError::IndexOutOfBounds {
                    axis: "user",
                    index: row,
                    len: n_users,
                });
            }
            if col >= n_movies {
                return Err(DataLoadError::IndexOutOfBounds {
                    axis: "movie",
                    index: col,
                    len: n_movies,
                });
            }
            if !value.is_finite() || value <= 0.0 {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: value.to_string(),
                });
            }
            if !seen.insert((row, col)) {
                return Err(DataLoadError::DuplicateRating { row, col });
            }
            tri.add_triplet(row, col, value);
        }

        let matrix: CsMat<f32> = tri.to_csr();
        let row_norms = matrix
            .outer_iterator()
            .map(|row| row.iter().map(|(_, &v)| v * v).sum::<f32>().sqrt())
            .collect();

        Ok(Self {
            matrix,
            users,
            movies,
            tags: HashMap::new(),
            row_norms,
        })
    }

    /// Attach the movie→tags lookup (ordered, most frequent first)
    pub fn with_tags(mut self, tags: HashMap<MovieTitle, Vec<String>>) -> Self {
        self.tags = tags;
        self
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_movies(&self) -> usize {
        self.movies.len()
    }

    /// Number of stored ratings
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    pub fn users(&self) -> &LabelIndex<UserId> {
        &self.users
    }

    pub fn movies(&self) -> &LabelIndex<MovieTitle> {
        &self.movies
    }

    /// The underlying CSR matrix
    pub fn matrix(&self) -> &CsMat<f32> {
        &self.matrix
    }

    /// Title of a movie column
    pub fn title(&self, movie_idx: usize) -> Option<&str> {
        self.movies.label(movie_idx).map(String::as_str)
    }

    /// Tags for a title; an empty slice when the movie has none
    pub fn tags_for(&self, title: &str) -> &[String] {
        self.tags.get(title).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Stored rating for a cell, `None` when unrated or out of range
    pub fn rating(&self, user_idx: usize, movie_idx: usize) -> Option<f32> {
        if user_idx >= self.n_users() || movie_idx >= self.n_movies() {
            return None;
        }
        self.matrix.get(user_idx, movie_idx).copied()
    }

    /// Sparse view of a user row, `None` when the row does not exist
    pub fn row(&self, user_idx: usize) -> Option<CsVecView<'_, f32>> {
        self.matrix.outer_view(user_idx)
    }

    /// Rated `(movie_idx, rating)` pairs of a user, ascending by column
    pub fn user_ratings(&self, user_idx: usize) -> Vec<(usize, f32)> {
        self.row(user_idx)
            .map(|row| row.iter().map(|(col, &v)| (col, v)).collect())
            .unwrap_or_default()
    }

    /// Number of movies a user has rated
    pub fn rated_count(&self, user_idx: usize) -> usize {
        self.row(user_idx)
            .map(|row| row.nnz())
            .unwrap_or(0)
    }

    /// A user's row as a dense vector (0.0 for unrated)
    pub fn dense_row(&self, user_idx: usize) -> Vec<f32> {
        let mut row = vec![0.0; self.n_movies()];
        for (col, value) in self.user_ratings(user_idx) {
            row[col] = value;
        }
        row
    }

    /// L2 norm of a user row (0.0 for unknown rows)
    pub fn row_norm(&self, user_idx: usize) -> f32 {
        self.row_norms.get(user_idx).copied().unwrap_or(0.0)
    }
}
