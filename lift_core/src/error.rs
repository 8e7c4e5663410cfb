//! Error types for the lift_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Transport-level HTTP failure (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A workout record could not be ingested
    #[error("Record error: {0}")]
    Aggregation(#[from] AggregationError),

    /// An AI response could not be turned into nutrition facts
    #[error("Nutrition parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage or deep-link error
    #[error("Credential error: {0}")]
    Credentials(String),

    /// Unknown category or invalid catalog contents
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Workout form failed validation before submission
    #[error("Invalid workout: {0}")]
    Workout(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Numeric or date input in a workout record that cannot be charted.
///
/// Raised while decoding records from the history source so that a bad
/// value never reaches the aggregator as `NaN`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("exercise '{exercise}' on {date}: weight {raw:?} is not a number")]
    InvalidWeight {
        exercise: String,
        date: String,
        raw: String,
    },

    #[error("exercise '{exercise}' on {date}: reps {raw:?} is not a number")]
    InvalidReps {
        exercise: String,
        date: String,
        raw: String,
    },

    #[error("workout date {raw:?} is not a calendar date (expected YYYY-MM-DD)")]
    InvalidDate { raw: String },
}

/// Failure to extract nutrition facts from a completion response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The response contained no ```json fenced block
    #[error("no fenced JSON block found in response")]
    NoJsonBlock,

    /// The fenced block did not match the nutrition schema
    #[error("malformed nutrition JSON: {0}")]
    MalformedJson(String),
}
