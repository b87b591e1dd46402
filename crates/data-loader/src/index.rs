//! Rating Store building from the raw dataset.
//!
//! This module turns parsed CSV records into the validated RatingStore:
//! - Join ratings to titles and drop unknown movies
//! - Keep popular movies and active users
//! - Assign sorted labels to rows and columns
//! - Aggregate the most frequent tags per title

use crate::error::Result;
use crate::parser;
use crate::store::RatingStore;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Thresholds applied while building the store
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// A title needs at least this many ratings to get a column
    pub min_movie_ratings: usize,
    /// A user needs at least this many ratings (on kept titles) to get a row
    pub min_user_ratings: usize,
    /// Number of tags kept per title
    pub tags_per_movie: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_movie_ratings: 50,
            min_user_ratings: 50,
            tags_per_movie: 5,
        }
    }
}

impl Dataset {
    /// Load the MovieLens CSV files from a directory
    ///
    /// `rating.csv` and `movie.csv` are required; `tag.csv` is optional.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading MovieLens dataset from {:?}", data_dir);

        let ratings_path = data_dir.join("rating.csv");
        let movies_path = data_dir.join("movie.csv");
        let tags_path = data_dir.join("tag.csv");

        // Ratings dominate load time, so parse them alongside the other two
        let (ratings, (movies, tags)) = rayon::join(
            || parser::parse_ratings(&ratings_path),
            || {
                rayon::join(
                    || parser::parse_movies(&movies_path),
                    || {
                        if tags_path.exists() {
                            parser::parse_tags(&tags_path)
                        } else {
                            warn!("No tag.csv in {:?}, continuing without tags", data_dir);
                            Ok(Vec::new())
                        }
                    },
                )
            },
        );

        let dataset = Self {
            ratings: ratings?,
            movies: movies?,
            tags: tags?,
        };

        info!(
            "Loaded {} ratings, {} movies, {} tags",
            dataset.ratings.len(),
            dataset.movies.len(),
            dataset.tags.len()
        );
        Ok(dataset)
    }
}

/// Build the Rating Store from a raw dataset
///
/// Steps:
/// 1. Join ratings to titles by movieId
/// 2. Keep titles with enough ratings, then users with enough ratings
/// 3. Sort labels so row/column order is reproducible
/// 4. Collapse repeated (user, title) pairs, keeping the last rating
/// 5. Attach the top tags of every kept title
///
/// Two movieIds sharing a title map to one column. A user who rated both
/// keeps a single rating there (the last one read), not the sum of the two.
pub fn build_rating_store(dataset: &Dataset, config: &StoreConfig) -> Result<RatingStore> {
    let titles: HashMap<MovieId, &str> = dataset
        .movies
        .iter()
        .map(|movie| (movie.id, movie.title.as_str()))
        .collect();

    // 1. Join
    let joined: Vec<(UserId, &str, f32)> = dataset
        .ratings
        .iter()
        .filter_map(|r| titles.get(&r.movie_id).map(|&title| (r.user_id, title, r.rating)))
        .collect();

    // 2a. Popular titles
    let mut title_counts: HashMap<&str, usize> = HashMap::new();
    for &(_, title, _) in &joined {
        *title_counts.entry(title).or_insert(0) += 1;
    }
    let popular: Vec<(UserId, &str, f32)> = joined
        .into_iter()
        .filter(|(_, title, _)| title_counts[title] >= config.min_movie_ratings)
        .collect();

    // 2b. Active users, counted on the popular titles only
    let mut user_counts: HashMap<UserId, usize> = HashMap::new();
    for &(user, _, _) in &popular {
        *user_counts.entry(user).or_insert(0) += 1;
    }
    let kept: Vec<(UserId, &str, f32)> = popular
        .into_iter()
        .filter(|(user, _, _)| user_counts[user] >= config.min_user_ratings)
        .collect();

    // 3. Labels
    let mut user_labels: Vec<UserId> = kept.iter().map(|&(u, _, _)| u).collect();
    user_labels.sort_unstable();
    user_labels.dedup();
    let mut movie_labels: Vec<MovieTitle> = kept.iter().map(|&(_, t, _)| t.to_string()).collect();
    movie_labels.sort_unstable();
    movie_labels.dedup();

    let users = LabelIndex::from_labels(user_labels)?;
    let movies = LabelIndex::from_labels(movie_labels)?;

    // 4. Cells; later ratings overwrite earlier ones
    let mut cells: HashMap<(usize, usize), f32> = HashMap::with_capacity(kept.len());
    for &(user, title, rating) in &kept {
        if let (Some(row), Some(col)) = (users.index_of(&user), movies.index_of_title(title)) {
            cells.insert((row, col), rating);
        }
    }
    let triplets = cells.into_iter().map(|((row, col), value)| (row, col, value));

    // 5. Tags
    let tags = top_tags_per_title(dataset, &titles, &movies, config.tags_per_movie);

    let store = RatingStore::new(users, movies, triplets)?.with_tags(tags);
    info!(
        "Rating Store built: {} users x {} movies, {} ratings",
        store.n_users(),
        store.n_movies(),
        store.nnz()
    );
    Ok(store)
}

/// Most frequent lowercased tags per kept title, ties by first appearance
fn top_tags_per_title(
    dataset: &Dataset,
    titles: &HashMap<MovieId, &str>,
    movies: &LabelIndex<MovieTitle>,
    limit: usize,
) -> HashMap<MovieTitle, Vec<String>> {
    // title -> tag -> (count, first position)
    let mut grouped: HashMap<&str, HashMap<String, (usize, usize)>> = HashMap::new();
    for (pos, event) in dataset.tags.iter().enumerate() {
        let Some(&title) = titles.get(&event.movie_id) else {
            continue;
        };
        if movies.index_of_title(title).is_none() {
            continue;
        }
        grouped
            .entry(title)
            .or_default()
            .entry(event.tag.to_lowercase())
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, pos));
    }

    grouped
        .into_par_iter()
        .map(|(title, counts)| {
            let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
            let top = ranked.into_iter().take(limit).map(|(tag, _)| tag).collect();
            (title.to_string(), top)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str) -> MovieMetadata {
        MovieMetadata {
            id,
            title: title.to_string(),
            genres: "Drama".to_string(),
        }
    }

    fn rating(user_id: UserId, movie_id: MovieId, rating: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating,
        }
    }

    fn tag(movie_id: MovieId, tag: &str) -> TagEvent {
        TagEvent {
            movie_id,
            tag: tag.to_string(),
        }
    }

    fn create_test_dataset() -> Dataset {
        Dataset {
            movies: vec![movie(1, "Heat (1995)"), movie(2, "Alien (1979)"), movie(3, "Obscure (2001)")],
            ratings: vec![
                rating(10, 1, 4.0),
                rating(10, 2, 5.0),
                rating(20, 1, 3.0),
                rating(20, 2, 2.5),
                rating(30, 1, 4.5),
                rating(30, 3, 1.0),
                rating(40, 2, 3.5),
                // unknown movie id is dropped
                rating(10, 99, 5.0),
            ],
            tags: vec![
                tag(1, "Heist"),
                tag(1, "pacino"),
                tag(1, "heist"),
                tag(3, "weird"),
                tag(2, "space"),
            ],
        }
    }

    #[test]
    fn test_filters_and_sorted_labels() {
        let config = StoreConfig {
            min_movie_ratings: 2,
            min_user_ratings: 2,
            tags_per_movie: 5,
        };
        let store = build_rating_store(&create_test_dataset(), &config).unwrap();

        // "Obscure" has one rating; user 30 then has one kept rating, user 40 has one
        assert_eq!(store.users().labels(), &[10, 20]);
        assert_eq!(
            store.movies().labels(),
            &["Alien (1979)".to_string(), "Heat (1995)".to_string()]
        );
        assert_eq!(store.rating(0, 0), Some(5.0));
        assert_eq!(store.rating(1, 1), Some(3.0));
        assert_eq!(store.nnz(), 4);
    }

    #[test]
    fn test_top_tags_are_lowercased_and_ranked() {
        let config = StoreConfig {
            min_movie_ratings: 1,
            min_user_ratings: 1,
            tags_per_movie: 1,
        };
        let store = build_rating_store(&create_test_dataset(), &config).unwrap();

        assert_eq!(store.tags_for("Heat (1995)"), ["heist".to_string()]);
        assert_eq!(store.tags_for("Alien (1979)"), ["space".to_string()]);
    }

    #[test]
    fn test_repeated_title_keeps_last_rating() {
        let dataset = Dataset {
            movies: vec![movie(1, "War of the Worlds (2005)"), movie(2, "War of the Worlds (2005)")],
            ratings: vec![rating(7, 1, 2.0), rating(7, 2, 4.5)],
            tags: Vec::new(),
        };
        let config = StoreConfig {
            min_movie_ratings: 1,
            min_user_ratings: 1,
            tags_per_movie: 5,
        };
        let store = build_rating_store(&dataset, &config).unwrap();

        assert_eq!(store.n_movies(), 1);
        assert_eq!(store.rating(0, 0), Some(4.5));
    }

    #[test]
    fn test_load_dataset() {
        // This test requires the actual dataset files in ../../data/raw
        let data_dir = Path::new("../../data/raw");

        if data_dir.exists() {
            let dataset = Dataset::load_from_dir(data_dir).unwrap();
            assert!(!dataset.ratings.is_empty());
            assert!(!dataset.movies.is_empty());
        }
    }
}
