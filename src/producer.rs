use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::broker::Publisher;
use crate::error::Result;
use crate::file_writer::LogWriter;
use crate::metrics::PipelineMetrics;
use crate::models::RawMessage;

/// When and how fast the producer emits
#[derive(Debug, Clone, Default)]
pub struct ProducerOptions {
    /// Pause after each message
    pub interval: Duration,
    /// Stop after this many messages
    pub max_messages: Option<u64>,
    /// Stop once this much time has passed
    pub run_for: Option<Duration>,
}

/// What a producer run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerSummary {
    /// Lines appended to the live data file
    pub written: u64,
    /// Payloads handed to the broker
    pub published: u64,
    /// Payloads the broker rejected
    pub publish_failures: u64,
}

/// Write each message to the live data file and, when connected, publish it
///
/// Runs until a limit in `options` is reached; without limits only process
/// termination stops it. Broker failures are logged and counted, file
/// failures end the run.
pub fn run_producer<I>(
    messages: I,
    writer: &LogWriter,
    publisher: &mut dyn Publisher,
    options: &ProducerOptions,
) -> Result<ProducerSummary>
where
    I: IntoIterator<Item = RawMessage>,
{
    let metrics = PipelineMetrics;
    let started = Instant::now();
    let mut summary = ProducerSummary::default();

    if !publisher.is_connected() {
        info!(path = %writer.path().display(), "Producing to file only");
    }

    for message in messages {
        if options.max_messages.is_some_and(|max| summary.written >= max) {
            break;
        }
        if options.run_for.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }

        let payload = message.to_json_line()?;
        writer.append_line(&payload)?;
        summary.written += 1;
        metrics.record_written();
        debug!(author = %message.author, category = %message.category, "Wrote message to file");

        if publisher.is_connected() {
            match publisher.publish(&payload) {
                Ok(()) => {
                    summary.published += 1;
                    metrics.record_published();
                },
                Err(e) => {
                    summary.publish_failures += 1;
                    metrics.record_publish_failure();
                    warn!(error = %e, "Failed to publish message");
                },
            }
        }

        let done = options.max_messages.is_some_and(|max| summary.written >= max);
        if !done && !options.interval.is_zero() {
            std::thread::sleep(options.interval);
        }
    }

    if let Err(e) = publisher.flush() {
        warn!(error = %e, "Failed to flush broker publisher");
    }

    info!(
        written = summary.written,
        published = summary.published,
        publish_failures = summary.publish_failures,
        "Producer finished"
    );
    Ok(summary)
}
