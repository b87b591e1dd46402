//! Parser for the MovieLens CSV files.
//!
//! - rating.csv: userId,movieId,rating,timestamp
//! - movie.csv: movieId,title,genres
//! - tag.csv: userId,movieId,tag,timestamp
//!
//! Columns are matched by header name, so extra columns (timestamps) are
//! ignored and titles containing commas are handled by csv quoting.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Deserialize every record of a headed CSV file into `T`
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(&file_name, e))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record.map_err(|e| csv_error(&file_name, e))?);
    }
    Ok(records)
}

/// Attach file and line context to a csv error
fn csv_error(file: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|pos| pos.line()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(io) => DataLoadError::IoError(io),
        kind => DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: format!("{kind:?}"),
        },
    }
}

/// Parse the rating.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    read_records(path)
}

/// Parse the movie.csv file
///
/// Titles carry the year in parentheses: "Toy Story (1995)"
/// Genres are pipe-separated: "Adventure|Animation|Children"
pub fn parse_movies(path: &Path) -> Result<Vec<MovieMetadata>> {
    read_records(path)
}

/// Parse the tag.csv file
pub fn parse_tags(path: &Path) -> Result<Vec<TagEvent>> {
    read_records(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("data-loader-parser-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_movies_with_quoted_title() {
        let path = write_temp(
            "movie.csv",
            "movieId,title,genres\n1,Toy Story (1995),Adventure|Animation\n2,\"American President, The (1995)\",Comedy|Drama|Romance\n",
        );
        let movies = parse_movies(&path).unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "American President, The (1995)");
        assert_eq!(movies[0].genres, "Adventure|Animation");
    }

    #[test]
    fn test_parse_ratings_ignores_timestamp() {
        let path = write_temp(
            "rating.csv",
            "userId,movieId,rating,timestamp\n1,2,3.5,2005-04-02 23:53:47\n1,29,4.0,2005-04-02 23:31:16\n",
        );
        let ratings = parse_ratings(&path).unwrap();

        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].movie_id, 2);
        assert_eq!(ratings[1].rating, 4.0);
    }

    #[test]
    fn test_bad_rating_reports_line() {
        let path = write_temp("bad_rating.csv", "userId,movieId,rating\n1,2,oops\n");
        let result = parse_ratings(&path);

        assert!(matches!(result, Err(DataLoadError::ParseError { line: 2, .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = parse_tags(Path::new("/definitely/not/here/tag.csv"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }
}
