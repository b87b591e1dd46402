//! Profile inspection: what a user loved, and what a cluster watches.

use data_loader::RatingStore;
use rand::Rng;
use rand::seq::index;
use recommenders::similarity::top_n;
use recommenders::{ClusterRecommender, Result};
use std::fmt;
use tracing::debug;

/// Tags shown next to a history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSummary {
    Tags(Vec<String>),
    NoTags,
}

impl fmt::Display for TagSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSummary::Tags(tags) => write!(f, "{}", tags.join(", ")),
            TagSummary::NoTags => write!(f, "no tags"),
        }
    }
}

/// One highly rated movie from a user's history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub movie_index: usize,
    pub title: String,
    pub rating: f32,
    pub tags: TagSummary,
}

/// Summaries of user taste and cluster taste
#[derive(Debug, Clone)]
pub struct ProfileInspector {
    min_rating: f32,
    tags_per_entry: usize,
    vibe_sample: usize,
}

impl Default for ProfileInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileInspector {
    pub fn new() -> Self {
        Self {
            min_rating: 4.0,
            tags_per_entry: 3,
            vibe_sample: 1000,
        }
    }

    /// Configure the rating a history movie needs (default: 4.0)
    pub fn with_min_rating(mut self, min_rating: f32) -> Self {
        self.min_rating = min_rating;
        self
    }

    /// Configure the members summed for a cluster vibe (default: 1000)
    pub fn with_vibe_sample(mut self, vibe_sample: usize) -> Self {
        self.vibe_sample = vibe_sample;
        self
    }

    /// Up to `n` of the user's best-rated movies, highest first
    ///
    /// Equal ratings keep column order. Unknown rows give an empty list.
    pub fn user_history(&self, store: &RatingStore, user_index: usize, n: usize) -> Vec<HistoryEntry> {
        let mut liked: Vec<(usize, f32)> = store
            .user_ratings(user_index)
            .into_iter()
            .filter(|&(_, rating)| rating >= self.min_rating)
            .collect();
        liked.sort_by(|a, b| b.1.total_cmp(&a.1));

        liked
            .into_iter()
            .take(n)
            .filter_map(|(movie_index, rating)| {
                let title = store.title(movie_index)?;
                let tags = store.tags_for(title);
                let tags = if tags.is_empty() {
                    TagSummary::NoTags
                } else {
                    TagSummary::Tags(tags.iter().take(self.tags_per_entry).cloned().collect())
                };
                Some(HistoryEntry {
                    movie_index,
                    title: title.to_string(),
                    rating,
                    tags,
                })
            })
            .collect()
    }

    /// The `n_top` movies with the largest summed rating over a sample of
    /// cluster members
    ///
    /// Movies nobody in the sample rated are never returned. An unknown
    /// cluster id gives an empty list; an unfitted model is an error.
    pub fn cluster_vibe<R: Rng>(
        &self,
        model: &ClusterRecommender,
        cluster: usize,
        store: &RatingStore,
        n_top: usize,
        rng: &mut R,
    ) -> Result<Vec<(String, f32)>> {
        let members = model.members(cluster)?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let amount = self.vibe_sample.min(members.len());
        let mut sums = vec![0.0f32; store.n_movies()];
        for pick in index::sample(rng, members.len(), amount).iter() {
            let Some(row) = store.users().index_of(&members[pick]) else {
                continue;
            };
            for (movie, rating) in store.user_ratings(row) {
                sums[movie] += rating;
            }
        }
        debug!("Cluster {} vibe from {} of {} members", cluster, amount, members.len());

        Ok(top_n(sums.into_iter().enumerate().filter(|&(_, sum)| sum > 0.0), n_top)
            .into_iter()
            .filter_map(|(movie, sum)| store.title(movie).map(|title| (title.to_string(), sum)))
            .collect())
    }
}
