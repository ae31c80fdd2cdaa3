//! Winter Stream - a minimal file/Kafka streaming pipeline
//!
//! A producer writes synthetic winter-activity messages to a live data file
//! and, when a broker is reachable, to a Kafka topic. A consumer tails the
//! file (or subscribes to the topic), scores each message's sentiment and
//! stores one row per message in SQLite. A report step renders the average
//! score per category as a histogram.
//!
//! # Features
//!
//! - `kafka` (default): rdkafka-backed publisher and source

/// Broker publish/subscribe seam
pub mod broker;
/// Configuration management
pub mod config;
/// SQLite storage sink
pub mod db;
/// Error types
pub mod error;
/// Live data file writer
pub mod file_writer;
/// Synthetic message generation
pub mod generator;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Consumer loop: parse, score, store
pub mod pipeline;
/// Producer loop
pub mod producer;
/// Histogram and CSV report
pub mod report;
/// Database schema definitions
pub mod schema;
/// Keyword sentiment scoring
pub mod sentiment;
/// Following the live data file
pub mod tail;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{PipelineError, Result};
pub use models::{Category, CategorySummary, RawMessage, ScoreRecord};
pub use pipeline::{Consumer, ConsumerStats, Pipeline};
pub use sentiment::SentimentAnalyzer;
