//! Routes a notification event to the appropriate channel adapters.
//!
//! Routing:
//! 1. Determine required channels: if the event severity is in the
//!    force-both set, both EMAIL and SMS are required regardless of the
//!    event's channel hint; otherwise the hint decides.
//! 2. For each required channel, walk the ordered adapter list. The first
//!    adapter returning `Success` wins and later adapters are not called.
//!    A `Skipped` result also ends the walk: the profile lacks this contact
//!    type, and another provider cannot fix that.
//! 3. Every adapter call goes through the retry executor; no adapter is
//!    invoked outside it.
//!
//! EMAIL is attempted strictly before SMS. There is no concurrency between
//! channels or within a channel.

use std::sync::Arc;

use notification_gateway_types::{
    Channel, CustomerProfile, DeliveryResult, DeliveryStatus, NotificationEvent, Severity,
};
use tracing::{error, warn};

use crate::channel::{ChannelAdapter, ChannelKind};
use crate::retry::RetryExecutor;

pub struct NotificationDispatcher {
    email_adapters: Vec<Arc<dyn ChannelAdapter>>,
    sms_adapters: Vec<Arc<dyn ChannelAdapter>>,
    retry: RetryExecutor,
    force_both: Vec<Severity>,
}

impl NotificationDispatcher {
    pub fn new(
        email_adapters: Vec<Arc<dyn ChannelAdapter>>,
        sms_adapters: Vec<Arc<dyn ChannelAdapter>>,
        retry: RetryExecutor,
        force_both: Vec<Severity>,
    ) -> Self {
        Self {
            email_adapters,
            sms_adapters,
            retry,
            force_both,
        }
    }

    /// Dispatch `event` to all required channels, returning one result per
    /// channel attempted.
    pub async fn dispatch(
        &self,
        event: &NotificationEvent,
        profile: &CustomerProfile,
    ) -> Vec<DeliveryResult> {
        let send_email = self.should_send_email(event);
        let send_sms = self.should_send_sms(event);

        let mut results = Vec::new();

        if send_email {
            results.push(
                self.dispatch_to_channel(event, profile, &self.email_adapters, ChannelKind::Email)
                    .await,
            );
        }
        if send_sms {
            results.push(
                self.dispatch_to_channel(event, profile, &self.sms_adapters, ChannelKind::Sms)
                    .await,
            );
        }

        if !send_email && !send_sms {
            warn!(
                notification_id = %event.notification_id,
                channel = ?event.channel,
                severity = ?event.severity,
                "no channel selected for event"
            );
        }

        results
    }

    async fn dispatch_to_channel(
        &self,
        event: &NotificationEvent,
        profile: &CustomerProfile,
        adapters: &[Arc<dyn ChannelAdapter>],
        kind: ChannelKind,
    ) -> DeliveryResult {
        if adapters.is_empty() {
            warn!(
                channel = %kind,
                notification_id = %event.notification_id,
                "no adapters configured, skipping channel"
            );
            return DeliveryResult::skipped(
                "none",
                kind.as_str(),
                format!("No {kind} adapters configured"),
            );
        }

        let mut last_result = None;

        for adapter in adapters {
            let description = format!(
                "{}/{} notification_id={}",
                adapter.provider_name(),
                adapter.kind(),
                event.notification_id
            );

            let result = self
                .retry
                .execute(
                    || {
                        let adapter = Arc::clone(adapter);
                        async move { Ok(adapter.send(event, profile).await) }
                    },
                    &description,
                )
                .await;

            // First success wins, remaining adapters are not called
            if result.is_success() {
                return result;
            }

            // Skipped is permanent (no phone/email), no point trying the next adapter
            if result.status == DeliveryStatus::Skipped {
                return result;
            }

            warn!(
                provider = adapter.provider_name(),
                notification_id = %event.notification_id,
                "adapter failed after retries, trying next adapter"
            );
            last_result = Some(result);
        }

        error!(
            channel = %kind,
            notification_id = %event.notification_id,
            "all adapters failed"
        );
        last_result.unwrap_or_else(|| {
            DeliveryResult::failure("none", kind.as_str(), "no adapter produced a result", 0)
        })
    }

    fn should_send_email(&self, event: &NotificationEvent) -> bool {
        self.is_force_both(event)
            || matches!(event.channel, Some(Channel::Email) | Some(Channel::Both))
    }

    fn should_send_sms(&self, event: &NotificationEvent) -> bool {
        self.is_force_both(event)
            || matches!(event.channel, Some(Channel::Sms) | Some(Channel::Both))
    }

    fn is_force_both(&self, event: &NotificationEvent) -> bool {
        match event.severity {
            Some(severity) => self.force_both.contains(&severity),
            None => false,
        }
    }
}
