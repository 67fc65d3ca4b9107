//! Dead-letter topic publisher.
//!
//! When every adapter of every required channel has failed and
//! `retry.on_exhausted = kafka`, the original record payload is published to
//! the dead-letter topic byte-for-byte, keyed by the original record key, so
//! downstream tooling sees exactly what the gateway consumed.

use std::time::Duration;

use notification_gateway_config::KafkaConfig;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use crate::error::{GatewayError, Result};

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DlqPublisher {
    producer: FutureProducer,
    topic: String,
}

impl DlqPublisher {
    pub fn new(kafka: &KafkaConfig, topic: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &kafka.bootstrap_servers)
            .set("client.id", format!("{}-dlq", kafka.group_id))
            .set("acks", "all")
            .create()?;

        info!(topic, "dead-letter producer ready");
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish one undeliverable record.
    pub async fn publish(&self, key: Option<&[u8]>, payload: &[u8]) -> Result<()> {
        let mut record: FutureRecord<'_, [u8], [u8]> =
            FutureRecord::to(&self.topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, Timeout::After(PUBLISH_TIMEOUT))
            .await
            .map_err(|(e, _)| GatewayError::DeadLetter(e.to_string()))?;

        debug!(topic = %self.topic, bytes = payload.len(), "published record to dead-letter topic");
        Ok(())
    }
}
