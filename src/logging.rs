use anyhow::Result;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Initialize structured logging system
///
/// `level_override` wins over the configured level; `RUST_LOG` wins over both.
/// The returned guard must be held until exit so the file writer flushes.
pub fn init_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<Option<WorkerGuard>> {
    // Set up environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = level_override.unwrap_or(&config.level);
            EnvFilter::try_new(level)
        })
        .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?;

    let json = config.format == "json";

    // Console layer, text or JSON
    let console_text = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
    });
    let console_json = json.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
    });

    // Add file layer if log file is specified
    let (file_layer, guard) = match config.file_path.as_deref() {
        Some(log_path) => {
            let log_path = Path::new(log_path);
            let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = log_path
                .file_name()
                .map_or_else(|| "winter-stream.log".into(), |n| n.to_string_lossy().into_owned());
            let file_appender = rolling::daily(directory, file_name);
            let (non_blocking_appender, guard) = non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_target(true)
                .json();
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(console_text)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
}

impl OperationTimer {
    /// Start timing `operation`
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    /// Log the elapsed milliseconds and return them
    pub fn finish(self) -> u128 {
        let duration = self.start.elapsed().as_millis();
        tracing::info!(
            operation = %self.operation,
            duration_ms = duration,
            "Operation completed"
        );
        duration
    }
}
