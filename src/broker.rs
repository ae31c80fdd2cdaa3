//! Broker seam of the pipeline.
//!
//! The producer talks to a [`Publisher`] and the consumer reads from a
//! [`MessageSource`], so neither cares whether Kafka is reachable. The Kafka
//! implementations live behind the `kafka` cargo feature; [`NoopPublisher`]
//! is the file-only fallback.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{info, warn};

use crate::config::KafkaConfig;
use crate::error::{PipelineError, Result};

/// Outgoing side of the broker
#[cfg_attr(test, mockall::automock)]
pub trait Publisher {
    /// Send one payload to the topic
    fn publish(&mut self, payload: &str) -> Result<()>;

    /// Whether payloads actually leave the process
    fn is_connected(&self) -> bool;

    /// Wait for queued payloads to be delivered
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Incoming side of the broker, also implemented by the file tail
pub trait MessageSource {
    /// Next raw payload, or `None` when nothing arrived within `wait`
    fn next_payload(&mut self, wait: Duration) -> Result<Option<Vec<u8>>>;

    /// Human-readable origin for log lines
    fn describe(&self) -> String;
}

/// File-only mode: accepts every payload and drops it
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&mut self, _payload: &str) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Open a TCP connection to `address` to see whether anything listens there
pub fn check_broker_reachable(address: &str, timeout: Duration) -> Result<()> {
    let addrs = address
        .to_socket_addrs()
        .map_err(|e| PipelineError::BrokerUnavailable(format!("cannot resolve {address}: {e}")))?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return Ok(()),
            Err(e) => last_error = Some(e),
        }
    }

    Err(PipelineError::BrokerUnavailable(match last_error {
        Some(e) => format!("{address}: {e}"),
        None => format!("{address} resolved to no addresses"),
    }))
}

/// What the broker's metadata says about one topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicStatus {
    /// Number of partitions the broker reported
    pub partitions: usize,
    /// Broker-side error for the topic, if any
    pub error: Option<String>,
}

/// Fail unless `status` shows a usable `topic`
///
/// `None` means the topic was absent from the metadata response.
pub fn ensure_topic_available(topic: &str, status: Option<&TopicStatus>) -> Result<()> {
    match status {
        None => Err(PipelineError::BrokerUnavailable(format!("topic {topic:?} does not exist"))),
        Some(TopicStatus { error: Some(e), .. }) => {
            Err(PipelineError::BrokerUnavailable(format!("topic {topic:?} is unavailable: {e}")))
        },
        Some(TopicStatus { partitions: 0, .. }) => {
            Err(PipelineError::BrokerUnavailable(format!("topic {topic:?} has no partitions")))
        },
        Some(_) => Ok(()),
    }
}

/// Connect to Kafka if enabled and reachable, otherwise fall back to file-only mode
#[must_use]
pub fn connect_publisher(settings: &KafkaConfig) -> Box<dyn Publisher> {
    if !settings.enabled {
        info!("Kafka disabled, running in file-only mode");
        return Box::new(NoopPublisher);
    }

    match connect_kafka_publisher(settings) {
        Ok(publisher) => publisher,
        Err(e) => {
            warn!(error = %e, broker = %settings.broker_address, "Kafka connection failed, continuing in file-only mode");
            Box::new(NoopPublisher)
        },
    }
}

#[cfg(feature = "kafka")]
fn connect_kafka_publisher(settings: &KafkaConfig) -> Result<Box<dyn Publisher>> {
    Ok(Box::new(kafka::KafkaPublisher::connect(settings)?))
}

#[cfg(not(feature = "kafka"))]
fn connect_kafka_publisher(_settings: &KafkaConfig) -> Result<Box<dyn Publisher>> {
    Err(PipelineError::BrokerUnavailable("built without the `kafka` feature".to_string()))
}

/// Subscribe to the configured topic once it is known to exist
#[cfg(feature = "kafka")]
pub fn subscribe(settings: &KafkaConfig) -> Result<Box<dyn MessageSource>> {
    Ok(Box::new(kafka::KafkaSource::subscribe(settings)?))
}

/// Subscribe to the configured topic
#[cfg(not(feature = "kafka"))]
pub fn subscribe(_settings: &KafkaConfig) -> Result<Box<dyn MessageSource>> {
    Err(PipelineError::BrokerUnavailable("built without the `kafka` feature".to_string()))
}

impl<S: MessageSource + ?Sized> MessageSource for Box<S> {
    fn next_payload(&mut self, wait: Duration) -> Result<Option<Vec<u8>>> {
        (**self).next_payload(wait)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(feature = "kafka")]
pub mod kafka {
    //! rdkafka-backed publisher and source.

    use std::time::Duration;

    use rdkafka::config::ClientConfig;
    use rdkafka::consumer::{BaseConsumer, Consumer};
    use rdkafka::error::RDKafkaErrorCode;
    use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
    use rdkafka::Message;
    use tracing::{debug, info};

    use super::{check_broker_reachable, ensure_topic_available, MessageSource, Publisher, TopicStatus};
    use crate::config::KafkaConfig;
    use crate::error::Result;

    /// Publishes payloads to one topic
    pub struct KafkaPublisher {
        producer: BaseProducer,
        topic: String,
        flush_timeout: Duration,
    }

    impl KafkaPublisher {
        /// Verify the broker answers, then create the producer
        pub fn connect(settings: &KafkaConfig) -> Result<Self> {
            check_broker_reachable(&settings.broker_address, settings.connect_timeout())?;

            let producer: BaseProducer = ClientConfig::new()
                .set("bootstrap.servers", &settings.broker_address)
                .set("message.timeout.ms", "5000")
                .create()?;

            // Fails fast when the broker is up but not speaking Kafka
            producer
                .client()
                .fetch_metadata(Some(settings.topic.as_str()), settings.connect_timeout())?;

            info!(broker = %settings.broker_address, topic = %settings.topic, "Kafka producer connected");
            Ok(Self {
                producer,
                topic: settings.topic.clone(),
                flush_timeout: settings.connect_timeout(),
            })
        }
    }

    impl Publisher for KafkaPublisher {
        fn publish(&mut self, payload: &str) -> Result<()> {
            self.producer
                .send(BaseRecord::<(), str>::to(&self.topic).payload(payload))
                .map_err(|(e, _)| e)?;
            // Serve delivery callbacks
            self.producer.poll(Duration::ZERO);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn flush(&mut self) -> Result<()> {
            self.producer.flush(self.flush_timeout)?;
            Ok(())
        }
    }

    /// Reads payloads from the subscribed topic in delivery order
    pub struct KafkaSource {
        consumer: BaseConsumer,
        topic: String,
    }

    impl KafkaSource {
        /// Join the consumer group and check that the topic exists
        pub fn subscribe(settings: &KafkaConfig) -> Result<Self> {
            check_broker_reachable(&settings.broker_address, settings.connect_timeout())?;

            let consumer: BaseConsumer = ClientConfig::new()
                .set("bootstrap.servers", &settings.broker_address)
                .set("group.id", &settings.consumer_group_id)
                .set("enable.partition.eof", "false")
                .set("enable.auto.commit", "true")
                .set("session.timeout.ms", "6000")
                .set("auto.offset.reset", "earliest")
                .create()?;

            consumer.subscribe(&[settings.topic.as_str()])?;

            let metadata = consumer.fetch_metadata(Some(settings.topic.as_str()), settings.connect_timeout())?;
            let status = metadata
                .topics()
                .iter()
                .find(|t| t.name() == settings.topic)
                .map(|t| TopicStatus {
                    partitions: t.partitions().len(),
                    error: t.error().map(|e| RDKafkaErrorCode::from(e).to_string()),
                });
            ensure_topic_available(&settings.topic, status.as_ref())?;

            info!(topic = %settings.topic, group = %settings.consumer_group_id, "Subscribed to Kafka topic");

            Ok(Self {
                consumer,
                topic: settings.topic.clone(),
            })
        }
    }

    impl MessageSource for KafkaSource {
        fn next_payload(&mut self, wait: Duration) -> Result<Option<Vec<u8>>> {
            match self.consumer.poll(wait) {
                None => Ok(None),
                Some(Err(e)) => Err(e.into()),
                Some(Ok(message)) => {
                    debug!(partition = message.partition(), offset = message.offset(), "Received message");
                    Ok(Some(message.payload().map(<[u8]>::to_vec).unwrap_or_default()))
                },
            }
        }

        fn describe(&self) -> String {
            format!("kafka topic {}", self.topic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_noop_publisher_accepts_everything() {
        let mut publisher = NoopPublisher;
        assert!(publisher.publish("{}").is_ok());
        assert!(!publisher.is_connected());
        assert!(publisher.flush().is_ok());
    }

    #[test]
    fn test_reachability_check() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let open = listener.local_addr().unwrap().to_string();
        assert!(check_broker_reachable(&open, Duration::from_secs(1)).is_ok());

        drop(listener);
        assert!(check_broker_reachable("127.0.0.1:1", Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_disabled_kafka_falls_back() {
        let mut settings = crate::config::AppConfig::default().kafka;
        settings.enabled = false;
        assert!(!connect_publisher(&settings).is_connected());
    }

    #[test]
    fn test_unreachable_broker_falls_back() {
        let mut settings = crate::config::AppConfig::default().kafka;
        settings.broker_address = "127.0.0.1:1".to_string();
        settings.connect_timeout_secs = 1;
        assert!(!connect_publisher(&settings).is_connected());
    }

    #[test]
    fn test_topic_availability() {
        let healthy = TopicStatus { partitions: 3, error: None };
        assert!(ensure_topic_available("winter_activities", Some(&healthy)).is_ok());

        assert!(matches!(
            ensure_topic_available("winter_activities", None),
            Err(PipelineError::BrokerUnavailable(_))
        ));

        let failed = TopicStatus {
            partitions: 0,
            error: Some("Broker: Unknown topic or partition".to_string()),
        };
        assert!(ensure_topic_available("winter_activities", Some(&failed)).is_err());

        let empty = TopicStatus { partitions: 0, error: None };
        assert!(ensure_topic_available("winter_activities", Some(&empty)).is_err());
    }

    #[test]
    fn test_subscribe_to_unreachable_broker_fails() {
        let mut settings = crate::config::AppConfig::default().kafka;
        settings.broker_address = "127.0.0.1:1".to_string();
        settings.connect_timeout_secs = 1;
        assert!(subscribe(&settings).is_err());
    }
}
