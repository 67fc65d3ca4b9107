//! Shared test doubles for the dispatcher and retry tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use notification_gateway::channel::{ChannelAdapter, ChannelKind};
use notification_gateway::{NotificationDispatcher, RetryExecutor, RetryPolicy};
use notification_gateway_types::{
    Channel, CustomerProfile, DeliveryResult, NotificationEvent, NotificationType, Severity,
};
use tokio_util::sync::CancellationToken;

/// Outcome script for one adapter: call `n` uses the `n`-th entry, repeating
/// the last entry once the script is exhausted.
#[derive(Debug, Clone, Copy)]
pub enum MockOutcome {
    Success,
    Failure,
    Skipped,
}

pub struct MockAdapter {
    provider: &'static str,
    kind: ChannelKind,
    outcomes: Vec<MockOutcome>,
    calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new(provider: &'static str, kind: ChannelKind, outcomes: Vec<MockOutcome>) -> Arc<Self> {
        assert!(!outcomes.is_empty(), "mock adapter needs at least one outcome");
        Arc::new(Self {
            provider,
            kind,
            outcomes,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn email(provider: &'static str, outcomes: Vec<MockOutcome>) -> Arc<Self> {
        Self::new(provider, ChannelKind::Email, outcomes)
    }

    pub fn sms(provider: &'static str, outcomes: Vec<MockOutcome>) -> Arc<Self> {
        Self::new(provider, ChannelKind::Sms, outcomes)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelAdapter for MockAdapter {
    fn provider_name(&self) -> &str {
        self.provider
    }

    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, _event: &NotificationEvent, _profile: &CustomerProfile) -> DeliveryResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcomes
            .get(n)
            .or_else(|| self.outcomes.last())
            .copied()
            .unwrap_or(MockOutcome::Failure);

        match outcome {
            MockOutcome::Success => DeliveryResult::success(
                self.provider,
                self.kind.as_str(),
                format!("msg-{}", n + 1),
                202,
            ),
            MockOutcome::Failure => {
                DeliveryResult::failure(self.provider, self.kind.as_str(), "simulated failure", 500)
            }
            MockOutcome::Skipped => {
                DeliveryResult::skipped(self.provider, self.kind.as_str(), "no contact on record")
            }
        }
    }

    async fn close(&self) {}
}

/// Retry executor with millisecond back-off so tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryExecutor {
    RetryExecutor::new(
        RetryPolicy {
            max_attempts,
            initial_delay_ms: 1,
            backoff_factor: 2.0,
            max_delay_ms: 5,
        },
        CancellationToken::new(),
    )
}

/// Dispatcher with the production default force-both set (HIGH, CRITICAL).
pub fn dispatcher(
    email_adapters: Vec<Arc<dyn ChannelAdapter>>,
    sms_adapters: Vec<Arc<dyn ChannelAdapter>>,
    max_attempts: u32,
) -> NotificationDispatcher {
    NotificationDispatcher::new(
        email_adapters,
        sms_adapters,
        fast_retry(max_attempts),
        vec![Severity::High, Severity::Critical],
    )
}

pub fn event(channel: Option<Channel>, severity: Option<Severity>) -> NotificationEvent {
    NotificationEvent {
        notification_id: format!("test-{}", uuid::Uuid::new_v4()),
        notification_type: Some(NotificationType::HighValueAlert),
        severity,
        channel,
        account_id: 100001,
        customer_id: Some(1001),
        account_number: Some("0123456789".to_string()),
        subject: "Test Notification".to_string(),
        body: "Test body text.".to_string(),
        event_time: None,
        generated_at: None,
        metadata: None,
    }
}

pub fn profile() -> CustomerProfile {
    CustomerProfile::new(
        1001,
        100001,
        "Adaeze",
        "Okafor",
        "adaeze@test.com",
        "+2348031001001",
    )
}
