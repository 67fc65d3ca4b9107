//! Immutable result of a single notification dispatch attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome classification of one provider attempt.
///
/// `Failure` is a transient or unknown error and is retryable. `Skipped` is a
/// permanent condition (no contact of this channel type on the profile, or no
/// adapter configured) and is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Success,
    Failure,
    Skipped,
}

/// Result of one channel adapter call.
///
/// Returned by every adapter and included in audit logs. The
/// `provider_message_id` is the external reference returned by the provider
/// (e.g. a SendGrid message id or Twilio SID).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub status: DeliveryStatus,
    pub provider: String,
    /// "EMAIL" or "SMS".
    pub channel: String,
    /// Set on success only.
    pub provider_message_id: Option<String>,
    /// Set on failure and skip.
    pub error_message: Option<String>,
    /// Transport status when available, 0 otherwise.
    pub http_status: u16,
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryResult {
    pub fn success(
        provider: impl Into<String>,
        channel: impl Into<String>,
        message_id: impl Into<String>,
        http_status: u16,
    ) -> Self {
        Self {
            status: DeliveryStatus::Success,
            provider: provider.into(),
            channel: channel.into(),
            provider_message_id: Some(message_id.into()),
            error_message: None,
            http_status,
            delivered_at: Utc::now(),
        }
    }

    pub fn failure(
        provider: impl Into<String>,
        channel: impl Into<String>,
        error: impl Into<String>,
        http_status: u16,
    ) -> Self {
        Self {
            status: DeliveryStatus::Failure,
            provider: provider.into(),
            channel: channel.into(),
            provider_message_id: None,
            error_message: Some(error.into()),
            http_status,
            delivered_at: Utc::now(),
        }
    }

    pub fn skipped(
        provider: impl Into<String>,
        channel: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: DeliveryStatus::Skipped,
            provider: provider.into(),
            channel: channel.into(),
            provider_message_id: None,
            error_message: Some(reason.into()),
            http_status: 0,
            delivered_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}
