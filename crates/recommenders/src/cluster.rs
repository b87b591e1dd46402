//! Cluster Recommender - k-means user groups plus neighbour averaging
//!
//! Users are partitioned with k-means (linfa) over their dense rating
//! rows, unrated cells counting as 0.0. A user's recommendations come from
//! the most similar members of their own cluster: "people in your group
//! who rate like you also liked these".
//!
//! ## Algorithm
//! 1. Look up the user's cluster (unknown user ⇒ empty result)
//! 2. Rank the other cluster members by cosine similarity to the user
//! 3. Keep the top `neighbors` (default 50)
//! 4. Predict each movie as the mean of the neighbours' actual ratings;
//!    neighbours who did not rate a movie do not count towards its mean
//! 5. Drop movies the user already rated and movies with no signal
//! 6. Return the top `n` by predicted rating

use crate::error::{ModelError, Result};
use crate::similarity::{cosine, dot_sparse_dense, top_n};
use crate::traits::RatingPredictor;
use crate::types::{ClusterAssignment, Recommendation};
use data_loader::{RatingStore, UserId};
use linfa::DatasetBase;
use linfa::dataset::AsTargets;
use linfa::traits::{Fit, Predict};
use linfa_clustering::KMeans;
use ndarray::Array2;
use rand_chacha_linfa::ChaCha8Rng;
use rand_chacha_linfa::rand_core::SeedableRng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::{debug, info, instrument};

const MODEL_NAME: &str = "cluster";
const TOLERANCE: f64 = 1e-4;

/// User-clustering collaborative filter
#[derive(Debug, Clone)]
pub struct ClusterRecommender {
    n_clusters: usize,
    /// Peers averaged per recommendation
    neighbors: usize,
    seed: u64,
    n_init: usize,
    max_iter: usize,

    /// Fitted state; `None` until `fit` succeeds
    state: Option<ClusterState>,
}

#[derive(Debug, Clone)]
struct ClusterState {
    assignments: Vec<ClusterAssignment>,
    by_user: HashMap<UserId, usize>,
    members: Vec<Vec<UserId>>,
    /// One row per cluster, one column per movie
    centroids: Array2<f64>,
    inertia: f64,
}

/// Labels, centroids and inertia of one k-means run
struct KMeansFit {
    labels: Vec<usize>,
    centroids: Array2<f64>,
    inertia: f64,
}

impl ClusterRecommender {
    /// Create an unfitted recommender with `n_clusters` groups
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            neighbors: 50,
            seed: 42,
            n_init: 10,
            max_iter: 300,
            state: None,
        }
    }

    /// Configure the number of neighbours averaged (default: 50)
    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Configure the clustering seed (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Configure the number of k-means restarts (default: 10)
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Configure the k-means iteration cap (default: 300)
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Partition every user row of the store into clusters.
    ///
    /// Replaces any previous assignment.
    #[instrument(skip(self, store), fields(k = self.n_clusters, users = store.n_users()))]
    pub fn fit(&mut self, store: &RatingStore) -> Result<&mut Self> {
        info!("Clustering {} users into {} groups", store.n_users(), self.n_clusters);
        let fit = run_kmeans(store, self.n_clusters, self.n_init, self.max_iter, self.seed)?;

        let mut members = vec![Vec::new(); self.n_clusters];
        let mut by_user = HashMap::with_capacity(store.n_users());
        let mut assignments = Vec::with_capacity(store.n_users());
        for (&user_id, &cluster) in store.users().labels().iter().zip(&fit.labels) {
            members[cluster].push(user_id);
            by_user.insert(user_id, cluster);
            assignments.push(ClusterAssignment { user_id, cluster });
        }

        debug!(
            sizes = ?members.iter().map(Vec::len).collect::<Vec<_>>(),
            inertia = fit.inertia,
            "clusters built"
        );
        self.state = Some(ClusterState {
            assignments,
            by_user,
            members,
            centroids: fit.centroids,
            inertia: fit.inertia,
        });
        Ok(self)
    }

    fn state(&self) -> Result<&ClusterState> {
        self.state
            .as_ref()
            .ok_or(ModelError::NotFitted { model: MODEL_NAME })
    }

    /// Cluster of a user; `Ok(None)` for users outside the training set
    pub fn cluster_of(&self, user_id: UserId) -> Result<Option<usize>> {
        Ok(self.state()?.by_user.get(&user_id).copied())
    }

    /// Users in a cluster; empty for an unknown cluster id
    pub fn members(&self, cluster: usize) -> Result<&[UserId]> {
        Ok(self
            .state()?
            .members
            .get(cluster)
            .map(|m| m.as_slice())
            .unwrap_or(&[]))
    }

    /// The full (user, cluster) table in training order
    pub fn assignments(&self) -> Result<&[ClusterAssignment]> {
        Ok(&self.state()?.assignments)
    }

    /// Within-cluster squared distance of the fit, as reported by linfa
    pub fn inertia(&self) -> Result<f64> {
        Ok(self.state()?.inertia)
    }

    /// Cluster centres, one row per cluster
    pub fn centroids(&self) -> Result<&Array2<f64>> {
        Ok(&self.state()?.centroids)
    }

    /// Nearest cluster for a full rating row (one value per store column,
    /// 0.0 for unrated), e.g. a user who was not in the training set
    pub fn predict_cluster(&self, ratings: &[f32]) -> Result<usize> {
        let centroids = &self.state()?.centroids;
        if ratings.len() != centroids.ncols() {
            return Err(ModelError::InvalidParameter {
                name: "ratings",
                reason: format!("expected {} columns, got {}", centroids.ncols(), ratings.len()),
            });
        }

        let distances = centroids.rows().into_iter().enumerate().map(|(cluster, centre)| {
            let distance: f64 = centre
                .iter()
                .zip(ratings)
                .map(|(&c, &r)| (c - f64::from(r)).powi(2))
                .sum();
            (cluster, distance)
        });
        distances
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(cluster, _)| cluster)
            .ok_or(ModelError::NotFitted { model: MODEL_NAME })
    }

    /// Recommend up to `n` unseen movies for a user
    #[instrument(skip(self, store))]
    pub fn recommend(
        &self,
        user_id: UserId,
        store: &RatingStore,
        n: usize,
    ) -> Result<Vec<Recommendation>> {
        let state = self.state()?;

        let Some(&cluster) = state.by_user.get(&user_id) else {
            debug!("User {} has no cluster", user_id);
            return Ok(Vec::new());
        };
        let Some(target) = store.users().index_of(&user_id) else {
            return Ok(Vec::new());
        };
        let peers = member_rows(store, &state.members[cluster]);
        if !peers.contains(&target) {
            debug!("User {} not found among cluster {} rows", user_id, cluster);
            return Ok(Vec::new());
        }

        let neighbours = self.nearest_peers(store, target, &peers);
        debug!("Averaging {} neighbours from cluster {}", neighbours.len(), cluster);

        let mut predictions = peer_means(store, &neighbours);
        for (movie, _) in store.user_ratings(target) {
            predictions[movie] = 0.0;
        }

        let ranked = top_n(
            predictions.into_iter().enumerate().filter(|&(_, score)| score > 0.0),
            n,
        );
        Ok(ranked
            .into_iter()
            .filter_map(|(movie, score)| {
                store
                    .title(movie)
                    .map(|title| Recommendation::new(movie, title, score))
            })
            .collect())
    }

    /// The `neighbors` peers most cosine-similar to `target`, target excluded
    fn nearest_peers(&self, store: &RatingStore, target: usize, peers: &[usize]) -> Vec<usize> {
        let target_row = store.dense_row(target);
        let target_norm = store.row_norm(target);

        let similarities = peers
            .par_iter()
            .filter(|&&peer| peer != target)
            .map(|&peer| {
                let dot = store
                    .row(peer)
                    .map(|row| dot_sparse_dense(&row, &target_row))
                    .unwrap_or(0.0);
                (peer, cosine(dot, target_norm, store.row_norm(peer)))
            })
            .collect::<Vec<_>>();

        top_n(similarities, self.neighbors)
            .into_iter()
            .map(|(peer, _)| peer)
            .collect()
    }

    /// Compute inertia for each k in a range, for choosing the cluster count
    pub fn elbow_curve(
        store: &RatingStore,
        k_range: RangeInclusive<usize>,
        seed: u64,
    ) -> Result<Vec<(usize, f64)>> {
        k_range
            .map(|k| {
                let fit = run_kmeans(store, k, 10, 300, seed)?;
                info!(k, inertia = fit.inertia, "elbow point");
                Ok((k, fit.inertia))
            })
            .collect()
    }
}

impl RatingPredictor for ClusterRecommender {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    /// Mean rating of the movie among the user's cluster peers.
    ///
    /// The user's own rating is left out of the mean, unlike a plain cluster
    /// average, so a scored pair never sees its own answer.
    fn predict_rating(
        &self,
        store: &RatingStore,
        user_index: usize,
        movie_index: usize,
    ) -> Result<Option<f32>> {
        let state = self.state()?;
        let Some(user_id) = store.users().label(user_index) else {
            return Ok(None);
        };
        let Some(&cluster) = state.by_user.get(user_id) else {
            return Ok(None);
        };

        let ratings: Vec<f32> = member_rows(store, &state.members[cluster])
            .into_iter()
            .filter(|&peer| peer != user_index)
            .filter_map(|peer| store.rating(peer, movie_index))
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        Ok(Some(ratings.iter().sum::<f32>() / ratings.len() as f32))
    }
}

/// Seeded k-means over the dense rating rows
fn run_kmeans(
    store: &RatingStore,
    k: usize,
    n_init: usize,
    max_iter: usize,
    seed: u64,
) -> Result<KMeansFit> {
    let (n_users, n_movies) = (store.n_users(), store.n_movies());
    if n_users == 0 || n_movies == 0 {
        return Err(ModelError::EmptyInput("rating matrix"));
    }
    if k == 0 || k > n_users {
        return Err(ModelError::InvalidParameter {
            name: "n_clusters",
            reason: format!("must be in 1..={} for {} users, got {}", n_users, n_users, k),
        });
    }

    let mut records = Array2::<f64>::zeros((n_users, n_movies));
    for user in 0..n_users {
        for (movie, rating) in store.user_ratings(user) {
            records[[user, movie]] = f64::from(rating);
        }
    }
    let dataset = DatasetBase::from(records);

    let model = KMeans::params_with_rng(k, ChaCha8Rng::seed_from_u64(seed))
        .n_runs(n_init)
        .max_n_iterations(max_iter as u64)
        .tolerance(TOLERANCE)
        .fit(&dataset)
        .map_err(|e| ModelError::Clustering(e.to_string()))?;

    let predictions = model.predict(&dataset);
    let labels: Vec<usize> = predictions.as_targets().iter().copied().collect();
    Ok(KMeansFit {
        labels,
        centroids: model.centroids().clone(),
        inertia: model.inertia(),
    })
}

/// Store rows of cluster members; members missing from the store are skipped
fn member_rows(store: &RatingStore, members: &[UserId]) -> Vec<usize> {
    members
        .iter()
        .filter_map(|user| store.users().index_of(user))
        .collect()
}

/// Per-movie mean over the rows that actually rated it (0.0 when none did)
fn peer_means(store: &RatingStore, rows: &[usize]) -> Vec<f32> {
    let mut sums = vec![0.0f32; store.n_movies()];
    let mut counts = vec![0u32; store.n_movies()];
    for &row in rows {
        for (movie, rating) in store.user_ratings(row) {
            sums[movie] += rating;
            counts[movie] += 1;
        }
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| if count > 0 { sum / count as f32 } else { 0.0 })
        .collect()
}
