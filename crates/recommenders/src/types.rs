//! Output types handed to reporting code.

use data_loader::UserId;
use serde::Serialize;

/// One ranked movie, as returned by every `recommend` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Column index in the Rating Store, or catalog position for the
    /// content model
    pub movie_index: usize,
    pub title: String,
    /// Predicted rating, reconstructed value, or similarity, depending on
    /// the model
    pub score: f32,
}

impl Recommendation {
    pub fn new(movie_index: usize, title: impl Into<String>, score: f32) -> Self {
        Self {
            movie_index,
            title: title.into(),
            score,
        }
    }
}

/// One row of the cluster assignment table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    pub user_id: UserId,
    pub cluster: usize,
}
