//! Error types for gateway startup and runtime faults.
//!
//! Per-record faults (malformed JSON, unresolved customers, provider errors)
//! never surface here; they are absorbed inside the consume loop and the
//! retry executor. This enum covers the failures that are allowed to end the
//! process: configuration problems, bus-client faults and wiring errors.

use notification_gateway_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("kafka client error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("offset commit failed: {0}")]
    Commit(rdkafka::error::KafkaError),

    #[error("dead-letter publish failed: {0}")]
    DeadLetter(String),

    #[error("no channel adapters are configured")]
    NoAdapters,

    #[error("health server error: {0}")]
    Health(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
