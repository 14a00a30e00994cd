//! Error types for the ingestion core

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Everything that can go wrong while building a registry or ingesting a file
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid filename pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Filename pattern '{0}' is registered more than once")]
    DuplicatePattern(String),

    #[error("Invalid identifier '{0}': expected letters, digits and underscores, not starting with a digit")]
    InvalidIdentifier(String),

    #[error("Column '{column}' of table '{table}' uses a reserved load metadata name")]
    ReservedColumn { table: String, column: String },

    #[error("Column '{column}' is declared twice for table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Failed to read registry file {path}: {source}")]
    RegistryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid registry definition: {0}")]
    RegistryFormat(#[from] toml::de::Error),

    #[error("CSV error at line {line}: {message}")]
    Csv { line: u64, message: String },

    #[error("Line {line} has {found} fields but table '{table}' declares {expected} columns")]
    TooManyFields {
        table: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Invalid integer '{value}' in column '{column}' at line {line}")]
    InvalidInteger {
        column: String,
        line: u64,
        value: String,
    },

    #[error("Invalid timestamp '{value}' in column '{column}' at row {row}")]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Object store error: {0:#}")]
    ObjectStore(#[source] anyhow::Error),

    #[error("Load into {table} failed: {source:#}")]
    Load {
        table: String,
        #[source]
        source: anyhow::Error,
    },
}

impl IngestError {
    /// Build a CSV error from the `csv` crate, keeping the line number when known
    pub fn csv(err: &csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        Self::Csv {
            line,
            message: err.to_string(),
        }
    }
}
