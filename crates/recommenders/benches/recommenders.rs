//! Benchmarks for model fitting and querying
//!
//! Run with: cargo bench --package recommenders
//!
//! Uses a synthetic store so no dataset files are needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{LabelIndex, MovieMetadata, RatingStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use recommenders::{ClusterRecommender, ContentRecommender, FactorizationRecommender};

const USERS: usize = 500;
const MOVIES: usize = 300;

fn synthetic_store() -> RatingStore {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut ratings = Vec::new();
    for user in 0..USERS {
        for movie in 0..MOVIES {
            if rng.random::<f32>() < 0.1 {
                let stars = rng.random_range(1..=10) as f32 / 2.0;
                ratings.push((user, movie, stars));
            }
        }
    }
    RatingStore::new(
        LabelIndex::from_labels((0..USERS as u32).collect()).expect("unique users"),
        LabelIndex::from_labels((0..MOVIES).map(|m| format!("Movie {m}")).collect())
            .expect("unique titles"),
        ratings,
    )
    .expect("valid store")
}

fn bench_cluster(c: &mut Criterion) {
    let store = synthetic_store();

    c.bench_function("cluster_fit_k4", |b| {
        b.iter(|| {
            let mut model = ClusterRecommender::new(4).with_n_init(1);
            model.fit(black_box(&store)).unwrap();
            black_box(model.inertia().unwrap())
        })
    });

    let mut model = ClusterRecommender::new(4);
    model.fit(&store).unwrap();
    c.bench_function("cluster_recommend", |b| {
        b.iter(|| black_box(model.recommend(black_box(1), &store, 10).unwrap()))
    });
}

fn bench_factorization(c: &mut Criterion) {
    let store = synthetic_store();

    c.bench_function("svd_fit_rank20", |b| {
        b.iter(|| {
            let mut model = FactorizationRecommender::new(20);
            model.fit(black_box(&store)).unwrap();
            black_box(model.singular_values().unwrap()[0])
        })
    });
}

fn bench_content(c: &mut Criterion) {
    let genres = ["Action", "Comedy", "Drama", "Horror", "Sci-Fi", "Thriller"];
    let movies: Vec<MovieMetadata> = (0..MOVIES)
        .map(|m| MovieMetadata {
            id: m as u32,
            title: format!("Movie {m}"),
            genres: format!("{}|{}", genres[m % 6], genres[(m / 6) % 6]),
        })
        .collect();
    let mut model = ContentRecommender::default();
    model.fit(&movies, &[]).unwrap();

    c.bench_function("content_recommend", |b| {
        b.iter(|| black_box(model.recommend(black_box("Movie 42"), 10).unwrap()))
    });
}

criterion_group!(benches, bench_cluster, bench_factorization, bench_content);
criterion_main!(benches);
