//! Layered configuration loading

use std::path::PathBuf;
use std::time::Duration;

use winter_stream::config::AppConfig;

fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

#[test]
fn test_defaults_load_without_overrides() {
    let config = AppConfig::load_with_env(None, Some(env(&[]))).unwrap();

    assert_eq!(config.paths.live_data, PathBuf::from("data/live_winter.jsonl"));
    assert_eq!(config.paths.sqlite, PathBuf::from("data/winter_sentiment.sqlite"));
    assert_eq!(config.kafka.broker_address, "localhost:9092");
    assert_eq!(config.kafka.topic, "winter_activities");
    assert_eq!(config.kafka.consumer_group_id, "winter_stream_group");
    assert_eq!(config.producer_interval(), Duration::from_secs(3));
    assert!(config.producer.reset_on_start);
}

#[test]
fn test_environment_overrides() {
    let config = AppConfig::load_with_env(
        None,
        Some(env(&[
            ("WINTER_STREAM_KAFKA__TOPIC", "ski_reports"),
            ("WINTER_STREAM_KAFKA__ENABLED", "false"),
            ("WINTER_STREAM_CONSUMER__POLL_INTERVAL_MS", "250"),
            ("WINTER_STREAM_PATHS__LIVE_DATA", "/tmp/winter/live.jsonl"),
        ])),
    )
    .unwrap();

    assert_eq!(config.kafka.topic, "ski_reports");
    assert!(!config.kafka.enabled);
    assert_eq!(config.poll_interval(), Duration::from_millis(250));
    assert_eq!(config.paths.live_data, PathBuf::from("/tmp/winter/live.jsonl"));
}

#[test]
fn test_config_file_then_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("winter.toml");
    std::fs::write(
        &path,
        "[kafka]\ntopic = \"from_file\"\nbroker_address = \"kafka:29092\"\n\n[producer]\ninterval_secs = 1\n",
    )
    .unwrap();

    let config = AppConfig::load_with_env(Some(&path), Some(env(&[("WINTER_STREAM_KAFKA__TOPIC", "from_env")]))).unwrap();

    assert_eq!(config.kafka.topic, "from_env");
    assert_eq!(config.kafka.broker_address, "kafka:29092");
    assert_eq!(config.producer.interval_secs, 1);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(AppConfig::load_with_env(Some(&missing), Some(env(&[]))).is_err());
}

#[test]
fn test_invalid_values_are_rejected() {
    for (key, value) in [
        ("WINTER_STREAM_KAFKA__BROKER_ADDRESS", "no-port"),
        ("WINTER_STREAM_KAFKA__TOPIC", "bad topic"),
        ("WINTER_STREAM_CONSUMER__POLL_INTERVAL_MS", "0"),
        ("WINTER_STREAM_LOGGING__LEVEL", "loud"),
        ("WINTER_STREAM_LOGGING__FORMAT", "xml"),
    ] {
        let result = AppConfig::load_with_env(None, Some(env(&[(key, value)])));
        assert!(result.is_err(), "{key}={value} should be rejected");
    }
}
