//! Error types for the data-loader crate.
//!
//! Every way the Rating Store or its inputs can be malformed has its own
//! variant, so callers can tell a missing artifact apart from bad data.

use thiserror::Error;

/// Errors that can occur while loading input files or building the Rating Store
///
/// The `#[derive(Error)]` macro from thiserror implements `std::error::Error`
/// and `Display` from the `#[error(...)]` attributes.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// A required input file is absent
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A CSV record could not be decoded
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The same label appears twice in a label array
    #[error("Duplicate label: {label}")]
    DuplicateLabel { label: String },

    /// A matrix coordinate points outside the label arrays
    #[error("{axis} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    /// Two ratings were supplied for the same (row, col) cell
    #[error("Duplicate rating at row {row}, column {col}")]
    DuplicateRating { row: usize, col: usize },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
