//! Error handling for the analysis pipeline.

use thiserror::Error;

/// Main error type for the analysis pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Data-related errors (e.g. missing or malformed telemetry fields)
    #[error("Data error: {0}")]
    DataError(String),

    /// Chart rendering errors
    #[error("Plot error: {0}")]
    PlotError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV read/write errors
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type for the analysis pipeline
pub type Result<T> = std::result::Result<T, Error>;
