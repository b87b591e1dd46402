//! The seam between rating models and the evaluator.

use crate::error::Result;
use data_loader::RatingStore;

/// A model that can estimate a single (user, movie) rating.
///
/// `Ok(None)` means the model has no signal for that pair (unknown user,
/// no qualifying peers) and the caller should skip it. `Err` is reserved
/// for structural failures such as an unfitted model.
pub trait RatingPredictor: Send + Sync {
    /// Short model name for logs and reports
    fn name(&self) -> &str;

    /// Predict the rating of `movie_index` for the user in row `user_index`
    fn predict_rating(
        &self,
        store: &RatingStore,
        user_index: usize,
        movie_index: usize,
    ) -> Result<Option<f32>>;
}
