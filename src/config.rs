use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};

use crate::validation::InputValidator;

/// Prefix of environment variables that override configuration,
/// e.g. `WINTER_STREAM_KAFKA__TOPIC`
pub const ENV_PREFIX: &str = "WINTER_STREAM";

/// Application configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// File locations
    pub paths: PathsConfig,
    /// Broker connection
    pub kafka: KafkaConfig,
    /// Producer pacing
    pub producer: ProducerConfig,
    /// Consumer polling
    pub consumer: ConsumerConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Where data lives on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Live JSON-lines file written by the producer
    pub live_data: PathBuf,
    /// SQLite store
    pub sqlite: PathBuf,
    /// Default chart output
    pub report: PathBuf,
}

/// Kafka settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Try the broker at all
    pub enabled: bool,
    /// `host:port` of a bootstrap broker
    pub broker_address: String,
    /// Topic messages are published to and read from
    pub topic: String,
    /// Consumer group of `consume-kafka`
    pub consumer_group_id: String,
    /// Timeout for reachability and metadata checks
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Seconds between messages
    pub interval_secs: u64,
    /// Delete the live data file before producing
    pub reset_on_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Wait between polls that found nothing
    pub poll_interval_ms: u64,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level
    pub level: String,
    /// Daily-rolled JSON log file, if any
    pub file_path: Option<String>,
    /// Console format, `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                live_data: PathBuf::from("data/live_winter.jsonl"),
                sqlite: PathBuf::from("data/winter_sentiment.sqlite"),
                report: PathBuf::from("data/sentiment_by_category.svg"),
            },
            kafka: KafkaConfig {
                enabled: true,
                broker_address: "localhost:9092".to_string(),
                topic: "winter_activities".to_string(),
                consumer_group_id: "winter_stream_group".to_string(),
                connect_timeout_secs: 5,
            },
            producer: ProducerConfig {
                interval_secs: 3,
                reset_on_start: true,
            },
            consumer: ConsumerConfig { poll_interval_ms: 1000 },
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config files and the process environment
    pub fn load(extra_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(extra_file, None)
    }

    /// Load configuration with precedence: defaults, `config/default`,
    /// `config/local`, `extra_file`, then environment variables.
    ///
    /// `env` replaces the process environment when given.
    pub fn load_with_env(extra_file: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("paths.live_data", &self.paths.live_data),
            ("paths.sqlite", &self.paths.sqlite),
            ("paths.report", &self.paths.report),
        ] {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("{name} cannot be empty"));
            }
        }

        InputValidator::validate_broker_address(&self.kafka.broker_address)?;
        InputValidator::validate_topic(&self.kafka.topic)?;
        if self.kafka.consumer_group_id.trim().is_empty() {
            return Err(anyhow!("kafka.consumer_group_id cannot be empty"));
        }
        if self.kafka.connect_timeout_secs == 0 {
            return Err(anyhow!("kafka.connect_timeout_secs must be greater than 0"));
        }

        if self.consumer.poll_interval_ms == 0 {
            return Err(anyhow!("consumer.poll_interval_ms must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Delay between generated messages
    #[must_use]
    pub const fn producer_interval(&self) -> Duration {
        Duration::from_secs(self.producer.interval_secs)
    }

    /// How long the consumer waits for new data before polling again
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.consumer.poll_interval_ms)
    }
}

impl KafkaConfig {
    /// Timeout for broker reachability checks
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.kafka.topic, "winter_activities");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.consumer.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.kafka.broker_address = "localhost".to_string();
        assert!(config.validate().is_err());
    }
}
