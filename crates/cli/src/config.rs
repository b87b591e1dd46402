//! Engine configuration, read from an optional JSON file.
//!
//! Every field has a default, so a file only needs the keys it changes:
//!
//! ```json
//! { "n_clusters": 6, "svd_rank": 30 }
//! ```

use anyhow::{Context, Result};
use data_loader::StoreConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// k for the cluster model
    pub n_clusters: usize,
    /// Peers averaged per cluster recommendation
    pub neighbors: usize,
    /// Rank of the factorization
    pub svd_rank: usize,
    /// Vocabulary cap of the content model
    pub max_features: usize,
    pub min_movie_ratings: usize,
    pub min_user_ratings: usize,
    /// User draws per RMSE evaluation
    pub eval_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            n_clusters: 4,
            neighbors: 50,
            svd_rank: 20,
            max_features: 5000,
            min_movie_ratings: 50,
            min_user_ratings: 50,
            eval_samples: 50,
        }
    }
}

impl EngineConfig {
    /// Read the file if one is given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            min_movie_ratings: self.min_movie_ratings,
            min_user_ratings: self.min_user_ratings,
            ..StoreConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "n_clusters": 6 }"#).unwrap();

        assert_eq!(config.n_clusters, 6);
        assert_eq!(config.svd_rank, 20);
        assert_eq!(config.store_config().min_movie_ratings, 50);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result: std::result::Result<EngineConfig, _> = serde_json::from_str(r#"{ "clusters": 6 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_file_means_defaults() {
        assert_eq!(EngineConfig::load(None).unwrap(), EngineConfig::default());
    }
}
