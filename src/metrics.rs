//! Pipeline counters on top of the `metrics` facade.
//!
//! Nothing is exported unless the embedding binary installs a recorder, so
//! these calls are free in the default build.

use metrics::{counter, histogram};

use crate::models::Category;

/// Lines appended to the live data file
pub const MESSAGES_WRITTEN: &str = "winter_stream_messages_written_total";
/// Payloads accepted by the broker client
pub const MESSAGES_PUBLISHED: &str = "winter_stream_messages_published_total";
/// Payloads the broker client rejected
pub const PUBLISH_FAILURES: &str = "winter_stream_publish_failures_total";
/// Rows inserted, labelled by category
pub const MESSAGES_STORED: &str = "winter_stream_messages_stored_total";
/// Payloads skipped as malformed
pub const MALFORMED_LINES: &str = "winter_stream_malformed_lines_total";
/// Inserts that failed
pub const STORE_FAILURES: &str = "winter_stream_store_failures_total";
/// Distribution of stored scores
pub const SENTIMENT_SCORE: &str = "winter_stream_sentiment_score";

/// Metrics collection for producer and consumer
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineMetrics;

impl PipelineMetrics {
    /// Record a line appended to the live data file
    pub fn record_written(self) {
        counter!(MESSAGES_WRITTEN).increment(1);
    }

    /// Record a message handed to the broker
    pub fn record_published(self) {
        counter!(MESSAGES_PUBLISHED).increment(1);
    }

    /// Record a payload the broker rejected
    pub fn record_publish_failure(self) {
        counter!(PUBLISH_FAILURES).increment(1);
    }

    /// Record a stored score
    pub fn record_stored(self, category: Category, score: f64) {
        counter!(MESSAGES_STORED, "category" => category.as_str()).increment(1);
        histogram!(SENTIMENT_SCORE).record(score);
    }

    /// Record a skipped payload
    pub fn record_malformed(self) {
        counter!(MALFORMED_LINES).increment(1);
    }

    /// Record a dropped message after a failed insert
    pub fn record_store_failure(self) {
        counter!(STORE_FAILURES).increment(1);
    }
}
