//! Email adapter backed by Postmark.
//!
//! Postmark specialises in transactional email with strong inbox placement,
//! which suits banking alerts where deliverability directly impacts customer
//! trust. Success is `200 OK` with the id in the `MessageID` body field.
//!
//! Required credential: `POSTMARK_SERVER_TOKEN`. The sender address must have
//! a verified Sender Signature in Postmark.

use std::time::Duration;

use async_trait::async_trait;
use notification_gateway_types::{CustomerProfile, DeliveryResult, NotificationEvent};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::{type_name, ChannelAdapter, ChannelKind};

const ENDPOINT: &str = "https://api.postmarkapp.com/email";

pub struct PostmarkEmailAdapter {
    server_token: String,
    from_address: String,
    message_stream: String,
    endpoint: String,
    http: reqwest::Client,
}

impl PostmarkEmailAdapter {
    pub fn new(server_token: String, from_address: String, message_stream: Option<String>) -> Self {
        Self::with_endpoint(server_token, from_address, message_stream, ENDPOINT.to_string())
    }

    pub fn with_endpoint(
        server_token: String,
        from_address: String,
        message_stream: Option<String>,
        endpoint: String,
    ) -> Self {
        Self {
            server_token,
            from_address,
            message_stream: message_stream.unwrap_or_else(|| "outbound".to_string()),
            endpoint,
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn build_payload(
        &self,
        event: &NotificationEvent,
        profile: &CustomerProfile,
    ) -> serde_json::Value {
        // Tag groups messages in Postmark analytics
        let tag = match event.notification_type {
            Some(_) => type_name(event).to_lowercase().replace('_', "-"),
            None => "alert".to_string(),
        };

        json!({
            "From": format!("AB Bank <{}>", self.from_address),
            "To": format!("{} <{}>", profile.full_name(), profile.email),
            "Subject": event.subject,
            "TextBody": event.body,
            "MessageStream": self.message_stream,
            "Tag": tag,
            // Metadata shows in the Postmark activity feed
            "Metadata": {
                "notificationId": event.notification_id,
                "accountId": event.account_id.to_string(),
                "notificationType": type_name(event),
            },
        })
    }
}

#[async_trait]
impl ChannelAdapter for PostmarkEmailAdapter {
    fn provider_name(&self) -> &str {
        "postmark"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn is_configured(&self) -> bool {
        !self.server_token.trim().is_empty()
    }

    async fn send(&self, event: &NotificationEvent, profile: &CustomerProfile) -> DeliveryResult {
        if !profile.has_email() {
            return DeliveryResult::skipped(
                self.provider_name(),
                self.kind().as_str(),
                format!("Customer {} has no email address", profile.customer_id),
            );
        }

        let payload = self.build_payload(event, profile);
        let response = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("X-Postmark-Server-Token", &self.server_token)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(response) => {
                let code = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();

                if code == 200 {
                    let message_id = extract_field(&body, "MessageID");
                    info!(
                        notification_id = %event.notification_id,
                        message_id = %message_id,
                        "postmark email sent"
                    );
                    DeliveryResult::success(self.provider_name(), self.kind().as_str(), message_id, code)
                } else {
                    warn!(http = code, body = %body, "postmark rejected email");
                    DeliveryResult::failure(
                        self.provider_name(),
                        self.kind().as_str(),
                        format!("HTTP {code}: {body}"),
                        code,
                    )
                }
            }
            Err(e) => {
                error!(
                    notification_id = %event.notification_id,
                    error = %e,
                    "postmark transport error"
                );
                DeliveryResult::failure(self.provider_name(), self.kind().as_str(), e.to_string(), 0)
            }
        }
    }

    async fn close(&self) {
        debug!("postmark adapter closed");
    }
}

fn extract_field(body: &str, field: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get(field).and_then(|f| f.as_str()).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notification_gateway_types::NotificationType;

    fn event() -> NotificationEvent {
        NotificationEvent {
            notification_id: "ntf-pm-1".to_string(),
            notification_type: Some(NotificationType::DailySpendSummary),
            severity: None,
            channel: None,
            account_id: 100002,
            customer_id: Some(1002),
            account_number: None,
            subject: "Daily summary".to_string(),
            body: "You spent NGN 15,400 today.".to_string(),
            event_time: None,
            generated_at: None,
            metadata: None,
        }
    }

    #[test]
    fn payload_formats_addresses_and_tag() {
        let adapter = PostmarkEmailAdapter::new(
            "pm-token".to_string(),
            "alerts@abbank.example".to_string(),
            None,
        );
        let profile = CustomerProfile::new(1002, 100002, "Emeka", "Nwosu", "emeka@test.com", "");
        let payload = adapter.build_payload(&event(), &profile);

        assert_eq!(payload["From"], "AB Bank <alerts@abbank.example>");
        assert_eq!(payload["To"], "Emeka Nwosu <emeka@test.com>");
        assert_eq!(payload["MessageStream"], "outbound");
        assert_eq!(payload["Tag"], "daily-spend-summary");
        assert_eq!(payload["Metadata"]["notificationId"], "ntf-pm-1");
    }

    #[test]
    fn message_id_extraction_tolerates_garbage() {
        assert_eq!(
            extract_field(r#"{"MessageID": "pm-123"}"#, "MessageID"),
            "pm-123"
        );
        assert_eq!(extract_field("not json", "MessageID"), "unknown");
        assert_eq!(extract_field("{}", "MessageID"), "unknown");
    }

    #[tokio::test]
    async fn skips_profile_without_email() {
        let adapter =
            PostmarkEmailAdapter::new("pm-token".to_string(), "a@b.c".to_string(), None);
        let profile = CustomerProfile::new(1002, 100002, "Emeka", "Nwosu", "  ", "");
        let result = adapter.send(&event(), &profile).await;
        assert_eq!(
            result.status,
            notification_gateway_types::DeliveryStatus::Skipped
        );
    }
}
