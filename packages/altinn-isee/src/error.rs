//! Error types for the converter.
//!
//! Uses the dual-error pattern: `AltinnError` for library consumers with
//! detailed error context. Structural problems inside a well-formed form are
//! not errors; they are reported as warnings by the flattening engine.

use thiserror::Error;

/// Main error type for the converter library.
#[derive(Debug, Error)]
pub enum AltinnError {
    /// Input is not well-formed XML. Nothing downstream runs.
    #[error("Malformed XML document: {0}")]
    MalformedDocument(String),

    /// One or more required metadata fields are absent or empty.
    ///
    /// Lists every missing field, not just the first one found.
    #[error("Missing required fields in 'InternInfo': {}. No output will be produced", .fields.join(", "))]
    MissingRequiredField { fields: Vec<String> },

    /// `raNummer` does not name an RA or RS form.
    #[error("Invalid form type in raNummer '{0}': expected an RA or RS form")]
    InvalidFormType(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Field mapping file could not be parsed.
    #[error("Failed to read field mapping {path}: {source}")]
    Mapping {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Form metadata file could not be parsed.
    #[error("Failed to read form metadata {path}: {source}")]
    Metadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A delivery timestamp is not RFC 3339.
    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Some files of a batch could not be converted.
    #[error("{failed} of {total} files failed")]
    BatchFailed { failed: usize, total: usize },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

impl From<roxmltree::Error> for AltinnError {
    fn from(err: roxmltree::Error) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

impl From<std::str::Utf8Error> for AltinnError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::MalformedDocument(format!("invalid UTF-8: {err}"))
    }
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, AltinnError>;
