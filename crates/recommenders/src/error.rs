//! Error types shared by the recommenders.
//!
//! Structural failures (querying before `fit`, impossible parameters) are
//! typed errors. Unknown users or titles are not errors at all: the
//! recommend calls answer them with an empty list.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// A query ran before the model was fitted
    #[error("{model} model is not fitted; call fit() first")]
    NotFitted { model: &'static str },

    /// A configuration value cannot work with the given data
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// There is nothing to fit on
    #[error("Cannot fit on empty input: {0}")]
    EmptyInput(&'static str),

    /// The k-means solver rejected the data
    #[error("K-Means fit failed: {0}")]
    Clustering(String),

    /// The SVD did not produce the requested factors
    #[error("Decomposition failed: {0}")]
    Decomposition(&'static str),
}

pub type Result<T> = std::result::Result<T, ModelError>;
