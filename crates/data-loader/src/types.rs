//! Core domain types for the MovieLens CSV dataset.
//!
//! This module defines the raw records read from disk and the
//! bidirectional label↔index mapping that gives every user and movie a
//! stable row/column in the rating matrix.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

// =============================================================================
// Type Aliases
// =============================================================================

/// External identifier for a user (the `userId` column)
pub type UserId = u32;

/// External identifier for a movie in the raw files (the `movieId` column)
pub type MovieId = u32;

/// Movies are labelled by title inside the Rating Store
pub type MovieTitle = String;

// =============================================================================
// Raw Records
// =============================================================================

/// One row of `rating.csv`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    /// Rating value, 0.5 to 5.0 in half steps
    pub rating: f32,
}

/// One row of `movie.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieMetadata {
    #[serde(rename = "movieId")]
    pub id: MovieId,
    pub title: MovieTitle,
    /// Pipe-separated genre string, e.g. "Adventure|Animation|Children"
    pub genres: String,
}

impl MovieMetadata {
    /// Genre tokens with the pipe separators replaced by spaces
    pub fn genre_text(&self) -> String {
        self.genres.replace('|', " ")
    }
}

/// One row of `tag.csv`: a free-text tag a user attached to a movie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagEvent {
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub tag: String,
}

/// Everything read from a data directory, before filtering
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub ratings: Vec<Rating>,
    pub movies: Vec<MovieMetadata>,
    pub tags: Vec<TagEvent>,
}

// =============================================================================
// LabelIndex - bidirectional label <-> position mapping
// =============================================================================

/// Ordered label array plus its reverse lookup.
///
/// The position of a label in the array is its matrix index. The mapping is
/// built once and rejects duplicates, so `index_of` and `label` are exact
/// inverses of each other.
#[derive(Debug, Clone)]
pub struct LabelIndex<L> {
    labels: Vec<L>,
    positions: HashMap<L, usize>,
}

impl<L> LabelIndex<L>
where
    L: Eq + Hash + Clone + Display,
{
    /// Build the mapping, failing on the first repeated label
    pub fn from_labels(labels: Vec<L>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(labels.len());
        for (idx, label) in labels.iter().enumerate() {
            if positions.insert(label.clone(), idx).is_some() {
                return Err(DataLoadError::DuplicateLabel {
                    label: label.to_string(),
                });
            }
        }
        Ok(Self { labels, positions })
    }

    /// Position of a label, if known
    pub fn index_of(&self, label: &L) -> Option<usize> {
        self.positions.get(label).copied()
    }

    /// Label stored at a position
    pub fn label(&self, idx: usize) -> Option<&L> {
        self.labels.get(idx)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels in index order
    pub fn labels(&self) -> &[L] {
        &self.labels
    }
}

impl LabelIndex<MovieTitle> {
    /// Title lookup by `&str` without allocating a `String`
    pub fn index_of_title(&self, title: &str) -> Option<usize> {
        self.positions.get(title).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_index_round_trip() {
        let index = LabelIndex::from_labels(vec![10u32, 3, 7]).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.index_of(&3), Some(1));
        assert_eq!(index.label(2), Some(&7));
        assert_eq!(index.index_of(&99), None);
        assert_eq!(index.label(3), None);
    }

    #[test]
    fn test_label_index_rejects_duplicates() {
        let result = LabelIndex::from_labels(vec!["Heat".to_string(), "Heat".to_string()]);
        assert!(matches!(result, Err(DataLoadError::DuplicateLabel { .. })));
    }

    #[test]
    fn test_title_lookup_by_str() {
        let index =
            LabelIndex::from_labels(vec!["Alien (1979)".to_string(), "Heat (1995)".to_string()])
                .unwrap();
        assert_eq!(index.index_of_title("Heat (1995)"), Some(1));
        assert_eq!(index.index_of_title("Ran (1985)"), None);
    }

    #[test]
    fn test_genre_text() {
        let movie = MovieMetadata {
            id: 1,
            title: "Toy Story (1995)".to_string(),
            genres: "Adventure|Animation|Children".to_string(),
        };
        assert_eq!(movie.genre_text(), "Adventure Animation Children");
    }
}
