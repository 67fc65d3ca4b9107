//! Main Kafka consumer loop for the notification gateway.
//!
//! Subscribes to the configured notification topics, decodes each record,
//! resolves the customer profile and delegates to the dispatcher for channel
//! routing.
//!
//! Offsets are committed synchronously *after* the full polled batch has
//! been dispatched (at-least-once delivery). If the process dies between
//! dispatch and commit the batch is re-processed on the next start, so
//! adapters must be idempotent with respect to the notification id, or the
//! downstream must deduplicate.
//!
//! No error raised while handling a single record ever exits the loop: a
//! malformed record, a failed lookup or a provider fault affects only that
//! record. The loop ends only on the shutdown signal or a fatal bus error.

use std::sync::Arc;
use std::time::Duration;

use notification_gateway_config::{ExhaustedAction, KafkaConfig};
use notification_gateway_types::{DeliveryResult, NotificationEvent};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::BorrowedMessage;
use rdkafka::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::NotificationDispatcher;
use crate::dlq::DlqPublisher;
use crate::error::{GatewayError, Result};
use crate::lifecycle::ReadinessGate;
use crate::resolver::CustomerResolver;

const POLL_TIMEOUT: Duration = Duration::from_millis(500);
/// How long to wait for further records once the first of a batch arrived.
const BATCH_DRAIN_TIMEOUT: Duration = Duration::from_millis(10);

/// Processing counters, single-writer on the consumer task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: u64,
    pub delivered: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// One polled record, detached from the consumer so processing cannot hold
/// borrows across await points.
struct BusRecord {
    topic: String,
    partition: i32,
    offset: i64,
    key: Option<Vec<u8>>,
    payload: Vec<u8>,
}

impl BusRecord {
    fn from_message(message: &BorrowedMessage<'_>) -> Self {
        Self {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(|k| k.to_vec()),
            payload: message.payload().map(|p| p.to_vec()).unwrap_or_default(),
        }
    }
}

pub struct NotificationConsumer {
    consumer: StreamConsumer,
    dispatcher: NotificationDispatcher,
    resolver: Arc<dyn CustomerResolver>,
    dlq: Option<DlqPublisher>,
    on_exhausted: ExhaustedAction,
    topics: Vec<String>,
    max_poll_records: usize,
    shutdown: CancellationToken,
    gate: ReadinessGate,
    stats: ConsumerStats,
}

impl NotificationConsumer {
    pub fn new(
        kafka: &KafkaConfig,
        dispatcher: NotificationDispatcher,
        resolver: Arc<dyn CustomerResolver>,
        dlq: Option<DlqPublisher>,
        on_exhausted: ExhaustedAction,
        shutdown: CancellationToken,
        gate: ReadinessGate,
    ) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &kafka.bootstrap_servers)
            .set("group.id", &kafka.group_id)
            .set("auto.offset.reset", &kafka.auto_offset_reset)
            .set("session.timeout.ms", kafka.session_timeout_ms.to_string())
            .set(
                "heartbeat.interval.ms",
                kafka.heartbeat_interval_ms.to_string(),
            )
            // Offsets are committed manually, after dispatch, never before
            .set("enable.auto.commit", "false")
            .create()?;

        Ok(Self {
            consumer,
            dispatcher,
            resolver,
            dlq,
            on_exhausted,
            topics: kafka.topics.clone(),
            max_poll_records: kafka.max_poll_records,
            shutdown,
            gate,
            stats: ConsumerStats::default(),
        })
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// Run the consume-commit loop until shutdown or a fatal bus error.
    pub async fn run(mut self) -> Result<()> {
        let topic_refs: Vec<&str> = self.topics.iter().map(String::as_str).collect();
        self.consumer.subscribe(&topic_refs)?;
        info!(
            topic_count = self.topics.len(),
            topics = ?self.topics,
            "notification gateway started, subscribed to topics"
        );

        self.gate.mark_ready();

        let result = self.run_loop().await;

        self.gate.mark_not_ready();
        info!(
            received = self.stats.received,
            delivered = self.stats.delivered,
            skipped = self.stats.skipped,
            failed = self.stats.failed,
            "consumer stopped"
        );

        result
    }

    async fn run_loop(&mut self) -> Result<()> {
        while !self.shutdown.is_cancelled() {
            let batch = self.poll_batch().await?;

            for record in &batch {
                self.process_record(record).await;
            }

            // Commit after processing the whole batch (at-least-once)
            if !batch.is_empty() {
                self.consumer
                    .commit_consumer_state(CommitMode::Sync)
                    .map_err(GatewayError::Commit)?;
                debug!(records = batch.len(), "committed offsets");
            }
        }

        debug!("consumer woken up for shutdown");
        Ok(())
    }

    /// Poll one batch: wait up to the poll timeout for a first record, then
    /// drain whatever is already buffered, bounded by `max_poll_records`.
    async fn poll_batch(&mut self) -> Result<Vec<BusRecord>> {
        let mut batch = Vec::new();

        let first = tokio::select! {
            _ = self.shutdown.cancelled() => return Ok(batch),
            polled = tokio::time::timeout(POLL_TIMEOUT, self.consumer.recv()) => polled,
        };

        match first {
            Err(_) => return Ok(batch), // poll timeout, empty batch
            Ok(Err(e)) => {
                self.handle_poll_error(e)?;
                return Ok(batch);
            }
            Ok(Ok(message)) => batch.push(BusRecord::from_message(&message)),
        }

        while batch.len() < self.max_poll_records {
            match tokio::time::timeout(BATCH_DRAIN_TIMEOUT, self.consumer.recv()).await {
                Ok(Ok(message)) => batch.push(BusRecord::from_message(&message)),
                Ok(Err(e)) => {
                    self.handle_poll_error(e)?;
                    break;
                }
                Err(_) => break,
            }
        }

        Ok(batch)
    }

    /// Transient bus errors are logged and absorbed; fatal ones end the loop.
    fn handle_poll_error(&self, e: KafkaError) -> Result<()> {
        if matches!(e, KafkaError::MessageConsumption(RDKafkaErrorCode::Fatal)) {
            error!(error = %e, "fatal error in consumer loop");
            return Err(GatewayError::Kafka(e));
        }
        warn!(error = %e, "transient bus error while polling");
        Ok(())
    }

    async fn process_record(&mut self, record: &BusRecord) {
        self.stats.received += 1;

        // 1. Decode
        let event = match NotificationEvent::from_slice(&record.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "malformed notification record, skipping"
                );
                self.stats.failed += 1;
                return;
            }
        };

        info!(
            notification_id = %event.notification_id,
            notification_type = ?event.notification_type,
            severity = ?event.severity,
            account_id = event.account_id,
            topic = %record.topic,
            "processing notification"
        );

        // 2. Resolve customer profile
        let profile = match self.resolver.resolve(event.account_id).await {
            Some(profile) => profile,
            None => {
                warn!(
                    account_id = event.account_id,
                    notification_id = %event.notification_id,
                    "customer not found, skipping notification"
                );
                self.stats.skipped += 1;
                return;
            }
        };

        // 3. Dispatch
        let results = self.dispatcher.dispatch(&event, &profile).await;

        // 4. Audit log and counters
        let mut any_success = false;
        for result in &results {
            log_delivery_result(&event, result);
            if result.is_success() {
                any_success = true;
            }
        }

        if any_success {
            self.stats.delivered += 1;
        } else {
            self.stats.failed += 1;
            self.handle_exhausted_delivery(&event, record).await;
        }
    }

    async fn handle_exhausted_delivery(&self, event: &NotificationEvent, record: &BusRecord) {
        match (self.on_exhausted, &self.dlq) {
            (ExhaustedAction::Kafka, Some(dlq)) => {
                match dlq.publish(record.key.as_deref(), &record.payload).await {
                    Ok(()) => info!(
                        notification_id = %event.notification_id,
                        topic = dlq.topic(),
                        "undeliverable notification published to dead-letter topic"
                    ),
                    // The record is not re-processed: a poison pill must not
                    // wedge the partition behind it.
                    Err(e) => error!(
                        notification_id = %event.notification_id,
                        error = %e,
                        "dead-letter publish failed, event dropped"
                    ),
                }
            }
            _ => {
                error!(
                    notification_id = %event.notification_id,
                    notification_type = ?event.notification_type,
                    account_id = event.account_id,
                    "notification undelivered after all retries"
                );
            }
        }
    }
}

fn log_delivery_result(event: &NotificationEvent, result: &DeliveryResult) {
    info!(
        notification_id = %event.notification_id,
        provider = %result.provider,
        channel = %result.channel,
        status = ?result.status,
        message_id = result.provider_message_id.as_deref().unwrap_or(""),
        error = result.error_message.as_deref().unwrap_or(""),
        "delivery result"
    );
}
