use data_loader::{build_rating_store, Dataset, StoreConfig};
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/raw");

    println!("Loading MovieLens CSV dataset...\n");

    let start = Instant::now();
    let dataset = Dataset::load_from_dir(data_dir).expect("Failed to load dataset");
    let parsed = start.elapsed();
    let store = build_rating_store(&dataset, &StoreConfig::default())
        .expect("Failed to build rating store");
    let elapsed = start.elapsed();

    println!("\n=== Load Complete ===");
    println!("Parse time: {:?}", parsed);
    println!("Total time: {:?}", elapsed);
    println!("Users: {}", store.n_users());
    println!("Movies: {}", store.n_movies());
    println!("Ratings kept: {} of {}", store.nnz(), dataset.ratings.len());
    println!("\nPerformance: {:.0} ratings/second",
             dataset.ratings.len() as f64 / elapsed.as_secs_f64());
}
