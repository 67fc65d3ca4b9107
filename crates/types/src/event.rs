//! Canonical notification event consumed from the bank's notification topics.
//!
//! The event is a read-only mirror of the model produced by the upstream
//! streams job. Record values are UTF-8 JSON; unknown fields are ignored so
//! the producer can evolve its schema without breaking the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    FraudAlert,
    HighValueAlert,
    BalanceUpdate,
    DormancyAlert,
    DailySpendSummary,
}

/// Event severity. Absent severity never forces additional channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Channel hint carried on the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Email,
    Sms,
    Both,
}

/// Errors raised while decoding a bus record into a [`NotificationEvent`].
#[derive(Error, Debug)]
pub enum EventDecodeError {
    #[error("invalid notification JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("notification is missing a notificationId")]
    MissingNotificationId,
}

/// A single notification event. Immutable after decode.
///
/// `customer_id`, `account_number`, the timestamps and `metadata` are opaque
/// to the gateway and passed through to the channel adapters unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub notification_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<NotificationType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,

    pub account_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl NotificationEvent {
    /// Decode a raw record value.
    ///
    /// A decoded event always carries a non-empty `notification_id`; a blank
    /// or absent id is a decode failure, not a deliverable event.
    pub fn from_slice(payload: &[u8]) -> Result<Self, EventDecodeError> {
        let event: Self = serde_json::from_slice(payload)?;
        if event.notification_id.trim().is_empty() {
            return Err(EventDecodeError::MissingNotificationId);
        }
        Ok(event)
    }

    /// Re-encode the event as JSON, e.g. for test fixtures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "notificationId": "ntf-001",
            "notificationType": "FRAUD_ALERT",
            "severity": "CRITICAL",
            "channel": "BOTH",
            "accountId": 100001,
            "customerId": 1001,
            "accountNumber": "0123456789",
            "subject": "Suspicious transaction",
            "body": "A transaction of NGN 250,000 was flagged.",
            "eventTime": "2024-05-01T09:30:00Z",
            "generatedAt": "2024-05-01T09:30:01Z",
            "metadata": {"rule": "velocity-check"}
        }"#
    }

    #[test]
    fn decodes_full_event() {
        let event = NotificationEvent::from_slice(sample_json().as_bytes()).unwrap();
        assert_eq!(event.notification_id, "ntf-001");
        assert_eq!(event.notification_type, Some(NotificationType::FraudAlert));
        assert_eq!(event.severity, Some(Severity::Critical));
        assert_eq!(event.channel, Some(Channel::Both));
        assert_eq!(event.account_id, 100001);
        assert_eq!(event.subject, "Suspicious transaction");
    }

    #[test]
    fn ignores_unknown_fields() {
        let json = r#"{
            "notificationId": "ntf-002",
            "accountId": 42,
            "channel": "EMAIL",
            "someFutureField": {"nested": true}
        }"#;
        let event = NotificationEvent::from_slice(json.as_bytes()).unwrap();
        assert_eq!(event.notification_id, "ntf-002");
        assert_eq!(event.channel, Some(Channel::Email));
        assert!(event.severity.is_none());
    }

    #[test]
    fn missing_notification_id_is_a_decode_error() {
        let json = r#"{"accountId": 42}"#;
        let err = NotificationEvent::from_slice(json.as_bytes());
        assert!(err.is_err());

        let json = r#"{"notificationId": "  ", "accountId": 42}"#;
        let err = NotificationEvent::from_slice(json.as_bytes()).unwrap_err();
        assert!(matches!(err, EventDecodeError::MissingNotificationId));
    }

    #[test]
    fn subject_and_body_default_to_empty() {
        let json = r#"{"notificationId": "ntf-003", "accountId": 7}"#;
        let event = NotificationEvent::from_slice(json.as_bytes()).unwrap();
        assert_eq!(event.subject, "");
        assert_eq!(event.body, "");
    }

    #[test]
    fn round_trip_preserves_specified_fields() {
        let event = NotificationEvent::from_slice(sample_json().as_bytes()).unwrap();
        let encoded = event.to_json().unwrap();
        let decoded = NotificationEvent::from_slice(encoded.as_bytes()).unwrap();

        assert_eq!(decoded.notification_id, event.notification_id);
        assert_eq!(decoded.notification_type, event.notification_type);
        assert_eq!(decoded.severity, event.severity);
        assert_eq!(decoded.channel, event.channel);
        assert_eq!(decoded.account_id, event.account_id);
        assert_eq!(decoded.customer_id, event.customer_id);
        assert_eq!(decoded.account_number, event.account_number);
        assert_eq!(decoded.subject, event.subject);
        assert_eq!(decoded.body, event.body);
        assert_eq!(decoded.event_time, event.event_time);
        assert_eq!(decoded.generated_at, event.generated_at);
        assert_eq!(decoded.metadata, event.metadata);
    }

    #[test]
    fn enum_wire_names_match_the_producer() {
        assert_eq!(
            serde_json::to_string(&NotificationType::DailySpendSummary).unwrap(),
            "\"DAILY_SPEND_SUMMARY\""
        );
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        assert_eq!(serde_json::to_string(&Channel::Sms).unwrap(), "\"SMS\"");
    }
}
