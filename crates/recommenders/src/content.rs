//! Content Recommender - "movies like this one" from genres and tags
//!
//! Every catalog movie becomes one metadata document (its genres plus all
//! of its lowercased tags). Documents are TF-IDF weighted and L2
//! normalised, so the cosine similarity of two movies is a sparse dot
//! product.
//!
//! ## Algorithm
//! 1. Resolve the query title to its first catalog position
//! 2. Score every catalog movie against it
//! 3. Drop the query title itself, keep the `n` best (ties by catalog order)

use crate::error::{ModelError, Result};
use crate::similarity::{dot_sparse, top_n};
use crate::tfidf::TfidfVectorizer;
use crate::types::Recommendation;
use data_loader::{MovieId, MovieMetadata, TagEvent};
use rayon::prelude::*;
use sprs::CsMat;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

const MODEL_NAME: &str = "content";

#[derive(Debug, Clone)]
pub struct ContentRecommender {
    max_features: usize,
    state: Option<ContentState>,
}

#[derive(Debug, Clone)]
struct ContentState {
    titles: Vec<String>,
    /// Title -> first catalog position
    positions: HashMap<String, usize>,
    vectors: CsMat<f32>,
    vocabulary_size: usize,
}

impl Default for ContentRecommender {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl ContentRecommender {
    /// Create an unfitted model keeping at most `max_features` terms
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            state: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Vectorize the catalog
    #[instrument(skip_all, fields(movies = movies.len(), tags = tags.len()))]
    pub fn fit(&mut self, movies: &[MovieMetadata], tags: &[TagEvent]) -> Result<&mut Self> {
        if movies.is_empty() {
            return Err(ModelError::EmptyInput("movie catalog"));
        }
        if self.max_features == 0 {
            return Err(ModelError::InvalidParameter {
                name: "max_features",
                reason: "must be at least 1".to_string(),
            });
        }

        let documents = build_metadata(movies, tags);
        let mut vectorizer = TfidfVectorizer::new(self.max_features);
        let vectors = vectorizer.fit_transform(&documents);

        let mut positions = HashMap::with_capacity(movies.len());
        for (idx, movie) in movies.iter().enumerate() {
            positions.entry(movie.title.clone()).or_insert(idx);
        }

        info!(
            "Content vectors built: {} movies, {} terms",
            movies.len(),
            vectorizer.vocabulary().len()
        );
        self.state = Some(ContentState {
            titles: movies.iter().map(|m| m.title.clone()).collect(),
            positions,
            vectors,
            vocabulary_size: vectorizer.vocabulary().len(),
        });
        Ok(self)
    }

    fn state(&self) -> Result<&ContentState> {
        self.state
            .as_ref()
            .ok_or(ModelError::NotFitted { model: MODEL_NAME })
    }

    /// Number of terms kept by the vectorizer
    pub fn vocabulary_size(&self) -> Result<usize> {
        Ok(self.state()?.vocabulary_size)
    }

    /// Cosine similarity of two titles; `None` if either is unknown
    pub fn similarity(&self, a: &str, b: &str) -> Result<Option<f32>> {
        let state = self.state()?;
        let (Some(&i), Some(&j)) = (state.positions.get(a), state.positions.get(b)) else {
            return Ok(None);
        };
        Ok(state.similarity(i, j))
    }

    /// Up to `n` movies most similar to `title`, never `title` itself
    #[instrument(skip(self))]
    pub fn recommend(&self, title: &str, n: usize) -> Result<Vec<Recommendation>> {
        let state = self.state()?;
        let Some(&query) = state.positions.get(title) else {
            debug!("Unknown title {:?}", title);
            return Ok(Vec::new());
        };

        let scores: Vec<(usize, f32)> = (0..state.titles.len())
            .into_par_iter()
            .filter(|&idx| state.titles[idx] != title)
            .filter_map(|idx| state.similarity(query, idx).map(|score| (idx, score)))
            .collect();

        Ok(top_n(scores, n)
            .into_iter()
            .map(|(idx, score)| Recommendation::new(idx, state.titles[idx].as_str(), score))
            .collect())
    }
}

impl ContentState {
    fn similarity(&self, a: usize, b: usize) -> Option<f32> {
        let row_a = self.vectors.outer_view(a)?;
        let row_b = self.vectors.outer_view(b)?;
        Some(dot_sparse(&row_a, &row_b))
    }
}

/// One document per catalog movie: genre words followed by its tags
pub fn build_metadata(movies: &[MovieMetadata], tags: &[TagEvent]) -> Vec<String> {
    let mut by_movie: HashMap<MovieId, Vec<String>> = HashMap::new();
    for event in tags {
        by_movie
            .entry(event.movie_id)
            .or_default()
            .push(event.tag.to_lowercase());
    }

    movies
        .iter()
        .map(|movie| {
            let mut document = movie.genre_text();
            if let Some(movie_tags) = by_movie.get(&movie.id) {
                document.push(' ');
                document.push_str(&movie_tags.join(" "));
            }
            document
        })
        .collect()
}
