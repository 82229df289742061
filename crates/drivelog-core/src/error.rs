//! Error types for the drivelog-core library.

use thiserror::Error;

/// Main error type for the drivelog library.
///
/// Extraction itself never fails; these errors come from loading reference
/// data and configuration before any document is processed.
#[derive(Error, Debug)]
pub enum DriveLogError {
    /// Reference data or pattern library is malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading reference data or pattern libraries.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A pattern failed to compile.
    #[error("invalid {field} pattern `{pattern}`: {source}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A pattern lacks a capture group its field needs.
    #[error("{field} pattern `{pattern}` is missing capture group {group}")]
    MissingCaptureGroup {
        field: &'static str,
        pattern: String,
        group: String,
    },

    /// A correction table has an empty mistake key.
    #[error("{table} corrections contain an empty mistake key")]
    EmptyCorrectionKey { table: &'static str },

    /// A location is listed under more than one category.
    #[error("location `{location}` is listed under both `{first}` and `{second}`")]
    DuplicateCategory {
        location: String,
        first: String,
        second: String,
    },

    /// The reference file could not be parsed.
    #[error("failed to parse reference data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why an entry block did not become a log entry.
///
/// Rendered into `DocumentResult::processing_notes`; never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Neither a driver name nor a date was found.
    #[error("insufficient data (no driver name or date found)")]
    MissingRequired,

    /// Aggregate confidence fell below the acceptance threshold.
    #[error("confidence: {confidence:.2}, minimum {minimum:.2}")]
    LowConfidence { confidence: f32, minimum: f32 },

    /// The block held no usable text.
    #[error("empty block")]
    EmptyBlock,
}

/// Result type for the drivelog library.
pub type Result<T> = std::result::Result<T, DriveLogError>;
