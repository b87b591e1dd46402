//! Sampled RMSE of a rating model against the stored ratings.
//!
//! ## Algorithm
//! 1. Draw `sample_size` user rows uniformly, with replacement
//! 2. Skip users with fewer than `min_ratings` ratings
//! 3. Pick up to `movies_per_user` of their rated movies without replacement
//! 4. Ask the model for each pair; pairs it cannot predict are skipped
//! 5. RMSE over every collected (actual, predicted) pair
//!
//! Collecting no pairs at all is reported as `RmseOutcome::NoData`, never
//! as a perfect score.

use data_loader::RatingStore;
use rand::Rng;
use rand::seq::index;
use recommenders::{RatingPredictor, Result};
use std::fmt;
use tracing::{debug, info, instrument};

/// Result of one evaluation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RmseOutcome {
    Score { rmse: f64, pairs: usize },
    /// No (actual, predicted) pair could be collected
    NoData,
}

impl RmseOutcome {
    /// The score, with `NoData` collapsed to 0.0
    pub fn value_or_zero(&self) -> f64 {
        match self {
            RmseOutcome::Score { rmse, .. } => *rmse,
            RmseOutcome::NoData => 0.0,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, RmseOutcome::NoData)
    }
}

impl fmt::Display for RmseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RmseOutcome::Score { rmse, pairs } => write!(f, "{rmse:.4} ({pairs} pairs)"),
            RmseOutcome::NoData => write!(f, "no data"),
        }
    }
}

/// Sampling evaluator
#[derive(Debug, Clone)]
pub struct Evaluator {
    sample_size: usize,
    movies_per_user: usize,
    min_ratings: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            sample_size: 50,
            movies_per_user: 5,
            min_ratings: 2,
        }
    }

    /// Configure the number of user draws (default: 50)
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Configure the movies checked per drawn user (default: 5)
    pub fn with_movies_per_user(mut self, movies_per_user: usize) -> Self {
        self.movies_per_user = movies_per_user;
        self
    }

    /// Configure the minimum ratings a drawn user needs (default: 2)
    pub fn with_min_ratings(mut self, min_ratings: usize) -> Self {
        self.min_ratings = min_ratings;
        self
    }

    /// Estimate the model's RMSE on a random sample of stored ratings
    #[instrument(skip_all, fields(model = predictor.name(), samples = self.sample_size))]
    pub fn evaluate<P, R>(&self, predictor: &P, store: &RatingStore, rng: &mut R) -> Result<RmseOutcome>
    where
        P: RatingPredictor + ?Sized,
        R: Rng,
    {
        let n_users = store.n_users();
        if n_users == 0 {
            return Ok(RmseOutcome::NoData);
        }

        let mut squared_error = 0.0f64;
        let mut pairs = 0usize;
        for _ in 0..self.sample_size {
            let user = rng.random_range(0..n_users);
            let rated = store.user_ratings(user);
            if rated.len() < self.min_ratings {
                continue;
            }

            let amount = self.movies_per_user.min(rated.len());
            for pick in index::sample(&mut *rng, rated.len(), amount).iter() {
                let (movie, actual) = rated[pick];
                let Some(predicted) = predictor.predict_rating(store, user, movie)? else {
                    continue;
                };
                squared_error += f64::from(actual - predicted).powi(2);
                pairs += 1;
            }
        }

        if pairs == 0 {
            debug!("No evaluable pairs collected");
            return Ok(RmseOutcome::NoData);
        }
        let rmse = (squared_error / pairs as f64).sqrt();
        info!("{} RMSE {:.4} over {} pairs", predictor.name(), rmse, pairs);
        Ok(RmseOutcome::Score { rmse, pairs })
    }
}
