/*!
 * Error types for the subrecut application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The file could not be read or written
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path of the file involved
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// The content is not a valid subtitle script
    #[error("Failed to parse subtitle at line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending line
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// File extension is not a supported subtitle format
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),
}

/// Errors that abort the matching of a single film
#[derive(Error, Debug)]
pub enum MatchError {
    /// A required subtitle file or directory is absent
    #[error("Source subtitles not found: {0}")]
    SourceNotFound(String),

    /// The film is not declared in the configuration
    #[error("Film {0} not found in config")]
    UnknownFilm(String),

    /// A subtitle file failed to load
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),
}

/// Reasons for the shift estimator to reject its samples
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShiftError {
    /// No matched pairs at all
    #[error("No matching events found for shift computation")]
    NoData,

    /// Too few samples survived outlier filtering
    #[error("Not enough data points for reliable shift calculation ({inliers} < {required})")]
    InsufficientData {
        /// Samples kept after filtering
        inliers: usize,
        /// Minimum needed
        required: usize,
    },

    /// First and second half of the track disagree, the shift drifts
    #[error("Shifts are not consistent between the two halves ({first_half:.2} ms vs {second_half:.2} ms)")]
    InconsistentHalves {
        /// Mean of the first half
        first_half: f64,
        /// Mean of the second half
        second_half: f64,
    },

    /// Estimated shift is larger than allowed
    #[error("Average shift {shift:.2} ms exceeds the maximum allowed value ({max} ms)")]
    ExcessiveShift {
        /// Estimated mean shift
        shift: f64,
        /// Configured maximum magnitude
        max: i64,
    },

    /// One file of the pair could not be read
    #[error("Subtitle file could not be loaded: {0}")]
    LoadFailed(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error while matching a film
    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    /// Error from shift estimation
    #[error("Shift error: {0}")]
    Shift(#[from] ShiftError),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
