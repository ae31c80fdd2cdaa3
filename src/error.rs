//! Error types for the winter-stream library.
//!
//! This module provides custom error types using `thiserror` so every stage of
//! the pipeline reports failures through one enum. The consumer loop decides
//! per variant whether a failure skips a message or aborts startup.

use thiserror::Error;

/// Errors that can occur anywhere in the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A message parsed but failed validation
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Kafka client errors
    #[cfg(feature = "kafka")]
    #[error("Broker error: {0}")]
    Broker(#[from] rdkafka::error::KafkaError),

    /// Broker support missing or broker unreachable
    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// Tokenizer pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// CSV report errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Chart rendering errors
    #[error("Chart error: {0}")]
    Chart(String),
}

/// A category string that is not one of the known winter activities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);

impl From<UnknownCategory> for PipelineError {
    fn from(err: UnknownCategory) -> Self {
        Self::InvalidMessage(err.to_string())
    }
}

/// Convenience type alias for Result with `PipelineError`
pub type Result<T> = std::result::Result<T, PipelineError>;
