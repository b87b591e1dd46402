//! Recommendation models over the Rating Store.
//!
//! This crate provides:
//! - ClusterRecommender: k-means user groups, neighbour-averaged predictions
//! - FactorizationRecommender: rank-reduced reconstruction of the ratings
//! - ContentRecommender: TF-IDF similarity over genres and tags
//! - RatingPredictor: the seam the evaluator scores models through
//!
//! ## Architecture
//! Each model is built unfitted with builder knobs, fitted once, then
//! queried read-only. Refitting replaces the fitted state wholesale.
//! Querying an unfitted model is `ModelError::NotFitted`; an unknown user
//! or title is an empty list.
//!
//! ## Example Usage
//! ```ignore
//! use recommenders::{ClusterRecommender, FactorizationRecommender};
//!
//! let mut cluster = ClusterRecommender::new(4).with_seed(42);
//! cluster.fit(&store)?;
//! let recs = cluster.recommend(42, &store, 5)?;
//!
//! let mut svd = FactorizationRecommender::new(20);
//! svd.fit(&store)?;
//! let recs = svd.recommend(0, 5)?;
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod similarity;
pub mod cluster;
pub mod factorization;
pub mod stopwords;
pub mod tfidf;
pub mod content;

// Re-export main types
pub use error::{ModelError, Result};
pub use types::{ClusterAssignment, Recommendation};
pub use traits::RatingPredictor;
pub use cluster::ClusterRecommender;
pub use factorization::FactorizationRecommender;
pub use content::ContentRecommender;
pub use tfidf::TfidfVectorizer;
