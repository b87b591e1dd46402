//! Integration tests for evaluation.
//!
//! These tests fit the real models on small stores and run them through
//! the evaluator and the profile inspector together.

use data_loader::{LabelIndex, RatingStore};
use evaluation::{Evaluator, ProfileInspector, RmseOutcome, TagSummary};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use recommenders::{ClusterRecommender, FactorizationRecommender, RatingPredictor};

/// A rated X=5, Y=4; B rated X=3, Z=5; C rated X=4
fn create_abc_store() -> RatingStore {
    RatingStore::new(
        LabelIndex::from_labels(vec![1, 2, 3]).unwrap(),
        LabelIndex::from_labels(vec!["X".into(), "Y".into(), "Z".into()]).unwrap(),
        vec![(0, 0, 5.0), (0, 1, 4.0), (1, 0, 3.0), (1, 2, 5.0), (2, 0, 4.0)],
    )
    .unwrap()
}

/// Exactly rank one, all cells rated
fn create_rank_one_store() -> RatingStore {
    let mut ratings = Vec::new();
    for u in 0..4 {
        for m in 0..5 {
            ratings.push((u, m, 0.5 * ((u + 1) * (m + 1)) as f32));
        }
    }
    RatingStore::new(
        LabelIndex::from_labels(vec![10, 20, 30, 40]).unwrap(),
        LabelIndex::from_labels((0..5).map(|m| format!("Movie {m}")).collect()).unwrap(),
        ratings,
    )
    .unwrap()
}

#[test]
fn test_zero_samples_is_no_data() {
    let store = create_abc_store();
    let mut model = ClusterRecommender::new(1);
    model.fit(&store).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let outcome = Evaluator::new()
        .with_sample_size(0)
        .evaluate(&model, &store, &mut rng)
        .unwrap();

    assert_eq!(outcome, RmseOutcome::NoData);
    assert_eq!(outcome.value_or_zero(), 0.0);
}

#[test]
fn test_no_user_with_two_ratings_is_no_data() {
    let store = RatingStore::new(
        LabelIndex::from_labels(vec![1, 2]).unwrap(),
        LabelIndex::from_labels(vec!["X".into(), "Y".into()]).unwrap(),
        vec![(0, 0, 4.0), (1, 1, 3.0)],
    )
    .unwrap();
    let mut model = FactorizationRecommender::new(1);
    model.fit(&store).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let outcome = Evaluator::new().evaluate(&model, &store, &mut rng).unwrap();
    assert!(outcome.is_no_data());
}

#[test]
fn test_exact_factorization_scores_near_zero() {
    let store = create_rank_one_store();
    let mut model = FactorizationRecommender::new(1);
    model.fit(&store).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let outcome = Evaluator::new().evaluate(&model, &store, &mut rng).unwrap();
    match outcome {
        RmseOutcome::Score { rmse, pairs } => {
            assert!(rmse < 1e-3);
            assert_eq!(pairs, 50 * 5);
        }
        RmseOutcome::NoData => panic!("expected a score"),
    }
}

#[test]
fn test_cluster_model_through_trait_object() {
    let store = create_abc_store();
    let mut model = ClusterRecommender::new(1);
    model.fit(&store).unwrap();
    let predictor: &dyn RatingPredictor = &model;
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    // Only A and B have two ratings; their X ratings always have peers
    let outcome = Evaluator::new().evaluate(predictor, &store, &mut rng).unwrap();
    assert!(matches!(outcome, RmseOutcome::Score { pairs, .. } if pairs > 0));
}

#[test]
fn test_cluster_model_exact_rmse() {
    let store = create_abc_store();
    let mut model = ClusterRecommender::new(1);
    model.fit(&store).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    // A-X: peers B, C give 3.5 vs 5.0; B-X: peers A, C give 4.5 vs 3.0.
    // A-Y and B-Z have no peer rating and are skipped.
    let outcome = Evaluator::new().evaluate(&model, &store, &mut rng).unwrap();
    match outcome {
        RmseOutcome::Score { rmse, pairs } => {
            assert_eq!(rmse, 1.5);
            assert!(pairs > 0);
        }
        RmseOutcome::NoData => panic!("expected a score"),
    }
}

#[test]
fn test_same_seed_reproduces_evaluation() {
    let store = create_rank_one_store();
    let mut cluster = ClusterRecommender::new(1).with_seed(3);
    cluster.fit(&store).unwrap();
    let evaluator = Evaluator::new().with_sample_size(9).with_movies_per_user(2);

    let first = evaluator
        .evaluate(&cluster, &store, &mut ChaCha8Rng::seed_from_u64(5))
        .unwrap();
    let second = evaluator
        .evaluate(&cluster, &store, &mut ChaCha8Rng::seed_from_u64(5))
        .unwrap();

    assert_eq!(first, second);
    assert!(!first.is_no_data());
}

#[test]
fn test_user_history_for_scenario() {
    let store = create_abc_store();
    let history = ProfileInspector::new().user_history(&store, 0, 3);

    let rows: Vec<(&str, f32)> = history.iter().map(|h| (h.title.as_str(), h.rating)).collect();
    assert_eq!(rows, [("X", 5.0), ("Y", 4.0)]);
    assert!(history.iter().all(|h| h.tags == TagSummary::NoTags));
}
