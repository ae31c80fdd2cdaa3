//! Consumer side of the pipeline: parse, score, store.
//!
//! [`Pipeline`] turns one payload into one stored row. [`Consumer`] drives a
//! [`MessageSource`] through it, one message at a time, until it is killed or
//! reaches an optional message limit. Nothing a single message does can stop
//! the loop: malformed payloads are skipped and store failures dropped, each
//! with a log line.

use std::time::Duration;

use chrono::Local;
use tracing::{error, info, warn};

use crate::broker::MessageSource;
use crate::db::Database;
use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::models::{RawMessage, ScoreRecord};
use crate::sentiment::SentimentAnalyzer;
use crate::validation::InputValidator;

/// What happened to one payload
#[derive(Debug)]
pub enum Outcome {
    /// Scored and inserted
    Stored { row_id: i64, record: ScoreRecord },
    /// Not a valid message, skipped
    Malformed(PipelineError),
    /// Valid, but the insert failed; the message is dropped
    StoreFailed(PipelineError),
}

/// Running totals of a consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Payloads taken from the source
    pub received: u64,
    /// Rows inserted
    pub stored: u64,
    /// Payloads skipped as malformed
    pub malformed: u64,
    /// Valid payloads whose insert failed
    pub store_failures: u64,
}

impl ConsumerStats {
    fn record(&mut self, outcome: &Outcome) {
        self.received += 1;
        match outcome {
            Outcome::Stored { .. } => self.stored += 1,
            Outcome::Malformed(_) => self.malformed += 1,
            Outcome::StoreFailed(_) => self.store_failures += 1,
        }
    }
}

/// Processing stage plus storage sink
pub struct Pipeline {
    analyzer: SentimentAnalyzer,
    db: Database,
    metrics: PipelineMetrics,
}

impl Pipeline {
    /// Score with `analyzer` and store into `db`
    #[must_use]
    pub const fn new(analyzer: SentimentAnalyzer, db: Database) -> Self {
        Self {
            analyzer,
            db,
            metrics: PipelineMetrics,
        }
    }

    /// Decode, parse and validate one payload
    pub fn parse(payload: &[u8]) -> Result<RawMessage> {
        let line = std::str::from_utf8(payload)
            .map_err(|e| PipelineError::InvalidMessage(format!("payload is not valid UTF-8: {e}")))?;
        let message = RawMessage::from_json_line(line)?;
        InputValidator::validate_message(&message)?;
        Ok(message)
    }

    /// Run one payload through parse, score and store
    pub fn handle_payload(&self, payload: &[u8]) -> Outcome {
        let message = match Self::parse(payload) {
            Ok(message) => message,
            Err(e) => {
                self.metrics.record_malformed();
                let preview = String::from_utf8_lossy(payload);
                warn!(error = %e, payload = %truncate(&preview, 120), "Skipping malformed message");
                return Outcome::Malformed(e);
            },
        };

        let record = self.analyzer.analyze(&message, Local::now().naive_local());

        match self.db.insert_score(&record) {
            Ok(row_id) => {
                self.metrics.record_stored(record.category, record.sentiment_score);
                info!(
                    row_id,
                    author = %record.author,
                    category = %record.category,
                    score = record.sentiment_score,
                    "Stored sentiment score"
                );
                Outcome::Stored { row_id, record }
            },
            Err(e) => {
                self.metrics.record_store_failure();
                error!(error = %e, author = %record.author, "Failed to store score, dropping message");
                Outcome::StoreFailed(e)
            },
        }
    }

    /// Store this pipeline writes to
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }
}

/// Drives a message source through the pipeline
pub struct Consumer<S: MessageSource> {
    source: S,
    pipeline: Pipeline,
    poll_interval: Duration,
    stats: ConsumerStats,
}

impl<S: MessageSource> Consumer<S> {
    /// Read from `source`, waiting up to `poll_interval` for new data
    #[must_use]
    pub const fn new(source: S, pipeline: Pipeline, poll_interval: Duration) -> Self {
        Self {
            source,
            pipeline,
            poll_interval,
            stats: ConsumerStats {
                received: 0,
                stored: 0,
                malformed: 0,
                store_failures: 0,
            },
        }
    }

    /// Process everything the source has right now without waiting
    ///
    /// Returns how many payloads were handled. Source errors are returned
    /// to the caller.
    pub fn drain(&mut self) -> Result<u64> {
        let before = self.stats.received;
        while let Some(payload) = self.source.next_payload(Duration::ZERO)? {
            self.handle(&payload);
        }
        Ok(self.stats.received - before)
    }

    /// Consume until `max_messages` payloads were handled, or forever
    ///
    /// Source errors (a missing file, a broker hiccup) are logged and retried
    /// after one poll interval.
    pub fn run(&mut self, max_messages: Option<u64>) -> ConsumerStats {
        info!(source = %self.source.describe(), "Consumer started");

        while max_messages.map_or(true, |max| self.stats.received < max) {
            match self.source.next_payload(self.poll_interval) {
                Ok(Some(payload)) => self.handle(&payload),
                Ok(None) => {},
                Err(e) => {
                    warn!(error = %e, source = %self.source.describe(), "Read failed, retrying next poll");
                    std::thread::sleep(self.poll_interval);
                },
            }
        }

        info!(
            received = self.stats.received,
            stored = self.stats.stored,
            malformed = self.stats.malformed,
            store_failures = self.stats.store_failures,
            "Consumer stopped"
        );
        self.stats
    }

    fn handle(&mut self, payload: &[u8]) {
        let outcome = self.pipeline.handle_payload(payload);
        self.stats.record(&outcome);
    }

    /// Totals so far
    #[must_use]
    pub const fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// Source being consumed
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Pipeline payloads go through
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    s.char_indices().nth(max_chars).map_or(s, |(i, _)| &s[..i])
}
