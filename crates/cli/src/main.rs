mod config;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use config::EngineConfig;
use data_loader::{Dataset, RatingStore, UserId, build_rating_store};
use evaluation::{Evaluator, ProfileInspector};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use recommenders::{ClusterRecommender, ContentRecommender, FactorizationRecommender, Recommendation};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// FlickRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "flick-recs")]
#[command(about = "Movie recommendations from user clusters, matrix factorization and movie metadata", long_about = None)]
struct Cli {
    /// Path to the MovieLens dataset directory
    #[arg(short, long, default_value = "data/raw")]
    data_dir: PathBuf,

    /// Optional JSON file overriding the engine defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for clustering, factorization and sampling
    #[arg(long, default_value = "42")]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,

        /// Which rating model to use
        #[arg(long, value_enum, default_value = "cluster")]
        model: ModelKind,
    },

    /// Find movies similar to a title by genres and tags
    Similar {
        /// Exact movie title, e.g. "Heat (1995)"
        #[arg(long)]
        title: String,

        /// Number of movies to return
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Show a user's favourite movies and their cluster's taste
    Profile {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Estimate the RMSE of both rating models
    Evaluate {
        /// Number of users to sample (defaults to the config value)
        #[arg(long)]
        samples: Option<usize>,
    },

    /// Print the k-means inertia for a range of cluster counts
    Elbow {
        #[arg(long, default_value = "2")]
        min_k: usize,

        #[arg(long, default_value = "9")]
        max_k: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelKind {
    Cluster,
    Svd,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;

    // Load the raw CSVs (this may take a moment)
    println!("Loading MovieLens dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let dataset = load_dataset(&cli.data_dir)?;
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            model,
        } => handle_recommend(&dataset, &config, cli.seed, user_id, limit, model)?,
        Commands::Similar { title, limit } => handle_similar(&dataset, &config, &title, limit)?,
        Commands::Profile { user_id } => handle_profile(&dataset, &config, cli.seed, user_id)?,
        Commands::Evaluate { samples } => {
            let samples = samples.unwrap_or(config.eval_samples);
            handle_evaluate(&dataset, &config, cli.seed, samples)?
        }
        Commands::Elbow { min_k, max_k } => handle_elbow(&dataset, &config, cli.seed, min_k, max_k)?,
    }

    Ok(())
}

fn load_dataset(data_dir: &Path) -> Result<Dataset> {
    Dataset::load_from_dir(data_dir)
        .with_context(|| format!("Failed to load MovieLens dataset from {}", data_dir.display()))
}

fn build_store(dataset: &Dataset, config: &EngineConfig) -> Result<RatingStore> {
    let store = build_rating_store(dataset, &config.store_config())
        .context("Failed to build the rating matrix")?;
    if store.n_users() == 0 || store.n_movies() == 0 {
        bail!("No ratings left after filtering; lower min_movie_ratings / min_user_ratings");
    }
    println!(
        "{} Rating matrix: {} users x {} movies ({} ratings)",
        "✓".green(),
        store.n_users(),
        store.n_movies(),
        store.nnz()
    );
    Ok(store)
}

fn fit_cluster(store: &RatingStore, config: &EngineConfig, seed: u64) -> Result<ClusterRecommender> {
    let mut model = ClusterRecommender::new(config.n_clusters)
        .with_neighbors(config.neighbors)
        .with_seed(seed);
    model.fit(store).context("Failed to cluster users")?;
    Ok(model)
}

fn fit_factorization(
    store: &RatingStore,
    config: &EngineConfig,
    seed: u64,
) -> Result<FactorizationRecommender> {
    let mut model = FactorizationRecommender::new(config.svd_rank).with_seed(seed);
    model.fit(store).context("Failed to factorize the rating matrix")?;
    Ok(model)
}

/// Handle the 'recommend' command
fn handle_recommend(
    dataset: &Dataset,
    config: &EngineConfig,
    seed: u64,
    user_id: UserId,
    limit: usize,
    kind: ModelKind,
) -> Result<()> {
    let store = build_store(dataset, config)?;
    let user_index = store
        .users()
        .index_of(&user_id)
        .ok_or_else(|| anyhow!("User {} is not in the rating matrix", user_id))?;

    let recommendations = match kind {
        ModelKind::Cluster => fit_cluster(&store, config, seed)?.recommend(user_id, &store, limit)?,
        ModelKind::Svd => fit_factorization(&store, config, seed)?.recommend(user_index, limit)?,
    };

    println!("{}", format!("Recommendations for user {}:", user_id).bold().blue());
    print_recommendations(&recommendations, &store);
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(dataset: &Dataset, config: &EngineConfig, title: &str, limit: usize) -> Result<()> {
    let mut model = ContentRecommender::new(config.max_features);
    model
        .fit(&dataset.movies, &dataset.tags)
        .context("Failed to vectorize movie metadata")?;

    let similar = model.recommend(title, limit)?;
    if similar.is_empty() {
        println!("{} No movie titled '{}'", "✗".red(), title);
        return Ok(());
    }

    println!("{}", format!("Movies like '{}':", title).bold().blue());
    for (rank, rec) in similar.iter().enumerate() {
        println!(
            "{}. {} - Similarity: {:.3}",
            (rank + 1).to_string().green(),
            rec.title,
            rec.score
        );
    }
    Ok(())
}

/// Handle the 'profile' command
fn handle_profile(dataset: &Dataset, config: &EngineConfig, seed: u64, user_id: UserId) -> Result<()> {
    let store = build_store(dataset, config)?;
    let user_index = store
        .users()
        .index_of(&user_id)
        .ok_or_else(|| anyhow!("User {} is not in the rating matrix", user_id))?;
    let inspector = ProfileInspector::new();

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    println!("{}Number of ratings: {}", "• ".cyan(), store.rated_count(user_index));
    println!("Favourite movies:");
    for entry in inspector.user_history(&store, user_index, 3) {
        println!("  - {} (Rating: {}) [{}]", entry.title, entry.rating, entry.tags);
    }

    let model = fit_cluster(&store, config, seed)?;
    let Some(cluster) = model.cluster_of(user_id)? else {
        return Ok(());
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let vibe = inspector.cluster_vibe(&model, cluster, &store, 3, &mut rng)?;

    println!(
        "Cluster {} ({} members) vibe:",
        cluster,
        model.members(cluster)?.len()
    );
    for (title, total) in vibe {
        println!("  - {} (summed rating {:.1}) [{}]", title, total, format_tags(store.tags_for(&title)));
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(dataset: &Dataset, config: &EngineConfig, seed: u64, samples: usize) -> Result<()> {
    let store = build_store(dataset, config)?;
    let evaluator = Evaluator::new().with_sample_size(samples);

    let cluster = fit_cluster(&store, config, seed)?;
    let factorization = fit_factorization(&store, config, seed)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cluster_rmse = evaluator.evaluate(&cluster, &store, &mut rng)?;
    let svd_rmse = evaluator.evaluate(&factorization, &store, &mut rng)?;

    println!("{}", format!("RMSE over {} sampled users:", samples).bold().blue());
    println!("{}Cluster model: {}", "• ".cyan(), cluster_rmse);
    println!("{}SVD model (rank {}): {}", "• ".cyan(), config.svd_rank, svd_rmse);
    if let Ok(ratios) = factorization.explained_variance_ratio() {
        println!(
            "{}SVD explained variance: {:.1}%",
            "• ".cyan(),
            ratios.iter().sum::<f32>() * 100.0
        );
    }
    Ok(())
}

/// Handle the 'elbow' command
fn handle_elbow(dataset: &Dataset, config: &EngineConfig, seed: u64, min_k: usize, max_k: usize) -> Result<()> {
    if min_k == 0 || min_k > max_k {
        bail!("Need 1 <= min-k <= max-k, got {}..={}", min_k, max_k);
    }
    let store = build_store(dataset, config)?;
    let curve = ClusterRecommender::elbow_curve(&store, min_k..=max_k, seed)
        .context("Failed to compute the elbow curve")?;

    println!("{}", "Inertia per cluster count:".bold().blue());
    for (k, inertia) in curve {
        println!("  k = {:>2}: {:.1}", k, inertia);
    }
    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[Recommendation], store: &RatingStore) {
    if recommendations.is_empty() {
        println!("  (no recommendations)");
        return;
    }
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}] - Score: {:.2}",
            (rank + 1).to_string().green(),
            rec.title,
            format_tags(store.tags_for(&rec.title)),
            rec.score
        );
    }
}

/// Up to four tags joined for display
fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        return "no tags".to_string();
    }
    tags.iter().take(4).cloned().collect::<Vec<_>>().join(", ")
}
