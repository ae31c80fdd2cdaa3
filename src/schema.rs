//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.

/// Sentiment scores table schema
pub mod sentiment_scores {
    /// Table name
    pub const TABLE: &str = "sentiment_scores";
    /// Primary key column
    pub const ID: &str = "id";
    /// Author name column
    pub const AUTHOR: &str = "author";
    /// Activity category column
    pub const CATEGORY: &str = "category";
    /// Sentiment score column
    pub const SENTIMENT_SCORE: &str = "sentiment_score";
    /// Message timestamp column
    pub const TIMESTAMP: &str = "timestamp";
}
