//! # Data Loader Crate
//!
//! This crate owns the Rating Store that every recommender reads from,
//! plus the ingestion of the MovieLens CSV dataset that produces it.
//!
//! ## Main Components
//!
//! - **types**: Raw records (Rating, MovieMetadata, TagEvent) and LabelIndex
//! - **store**: RatingStore, the sparse user×movie matrix with label mappings
//! - **parser**: Parse the .csv files into Rust structs
//! - **index**: Filter the raw data and build the RatingStore
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{build_rating_store, Dataset, StoreConfig};
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_dir(Path::new("data/raw"))?;
//! let store = build_rating_store(&dataset, &StoreConfig::default())?;
//!
//! let row = store.users().index_of(&42).unwrap();
//! println!("User 42 rated {} movies", store.rated_count(row));
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod store;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{build_rating_store, StoreConfig};
pub use store::RatingStore;
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    MovieTitle,
    // Core types
    Rating,
    MovieMetadata,
    TagEvent,
    Dataset,
    LabelIndex,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = RatingStore::new(
            LabelIndex::from_labels(Vec::<UserId>::new()).unwrap(),
            LabelIndex::from_labels(Vec::<MovieTitle>::new()).unwrap(),
            Vec::new(),
        )
        .unwrap();

        assert_eq!(store.n_users(), 0);
        assert_eq!(store.n_movies(), 0);
        assert_eq!(store.nnz(), 0);
    }

    #[test]
    fn test_empty_queries() {
        let store = RatingStore::new(
            LabelIndex::from_labels(vec![1]).unwrap(),
            LabelIndex::from_labels(vec!["Heat (1995)".to_string()]).unwrap(),
            vec![(0, 0, 4.0)],
        )
        .unwrap();

        // Querying non-existent data should return None or empty values
        assert!(store.users().index_of(&999).is_none());
        assert!(store.movies().index_of_title("Missing").is_none());
        assert!(store.user_ratings(5).is_empty());
        assert_eq!(store.rated_count(5), 0);
        assert!(store.tags_for("Heat (1995)").is_empty());
    }
}
