//! SMS adapter backed by Termii.
//!
//! Termii is a Lagos-headquartered CPaaS provider with native integrations
//! with the four major Nigerian mobile networks, NCC-approved DND bypass for
//! transactional banking messages, and naira billing. Success is `200 OK`
//! with the id in the `message_id` body field.
//!
//! Required credential: `TERMII_API_KEY` (carried in the request payload).

use std::time::Duration;

use async_trait::async_trait;
use notification_gateway_types::profile::mask_phone;
use notification_gateway_types::{CustomerProfile, DeliveryResult, NotificationEvent};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::{sms_text, ChannelAdapter, ChannelKind};

const ENDPOINT: &str = "https://v3.api.termii.com/api/sms/send";

pub struct TermiiSmsAdapter {
    api_key: String,
    sender_id: String,
    /// Termii route: "generic" (DND bypass), "dnd" or "WhatsApp".
    channel: String,
    endpoint: String,
    http: reqwest::Client,
}

impl TermiiSmsAdapter {
    pub fn new(api_key: String, sender_id: String, channel: Option<String>) -> Self {
        Self::with_endpoint(api_key, sender_id, channel, ENDPOINT.to_string())
    }

    pub fn with_endpoint(
        api_key: String,
        sender_id: String,
        channel: Option<String>,
        endpoint: String,
    ) -> Self {
        Self {
            api_key,
            sender_id,
            channel: channel.unwrap_or_else(|| "generic".to_string()),
            endpoint,
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn build_payload(
        &self,
        event: &NotificationEvent,
        profile: &CustomerProfile,
    ) -> serde_json::Value {
        json!({
            "api_key": self.api_key,
            "to": profile.phone,
            "from": self.sender_id,
            "sms": sms_text(event),
            "type": "plain",
            "channel": self.channel,
        })
    }
}

#[async_trait]
impl ChannelAdapter for TermiiSmsAdapter {
    fn provider_name(&self) -> &str {
        "termii"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn send(&self, event: &NotificationEvent, profile: &CustomerProfile) -> DeliveryResult {
        if !profile.has_phone() {
            return DeliveryResult::skipped(
                self.provider_name(),
                self.kind().as_str(),
                format!("Customer {} has no phone number", profile.customer_id),
            );
        }

        let payload = self.build_payload(event, profile);
        let response = self.http.post(&self.endpoint).json(&payload).send().await;

        match response {
            Ok(response) => {
                let code = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();

                if code == 200 {
                    let message_id = extract_field(&body, "message_id");
                    let status = extract_field(&body, "message");
                    info!(
                        notification_id = %event.notification_id,
                        to = %mask_phone(&profile.phone),
                        message_id = %message_id,
                        status = %status,
                        "termii sms sent"
                    );
                    DeliveryResult::success(self.provider_name(), self.kind().as_str(), message_id, code)
                } else {
                    warn!(http = code, body = %body, "termii rejected sms");
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
                    "termii transport error"
                );
                DeliveryResult::failure(self.provider_name(), self.kind().as_str(), e.to_string(), 0)
            }
        }
    }

    async fn close(&self) {
        debug!("termii adapter closed");
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

    fn event() -> NotificationEvent {
        NotificationEvent {
            notification_id: "ntf-tm-1".to_string(),
            notification_type: None,
            severity: None,
            channel: None,
            account_id: 100004,
            customer_id: Some(1004),
            account_number: None,
            subject: "Dormancy notice".to_string(),
            body: "Your account has been inactive for 90 days.".to_string(),
            event_time: None,
            generated_at: None,
            metadata: None,
        }
    }

    #[test]
    fn channel_defaults_to_generic_route() {
        let adapter = TermiiSmsAdapter::new("key".to_string(), "ABBank".to_string(), None);
        let profile =
            CustomerProfile::new(1004, 100004, "Tunde", "Adeyemi", "", "+2348031004004");
        let payload = adapter.build_payload(&event(), &profile);

        assert_eq!(payload["channel"], "generic");
        assert_eq!(payload["from"], "ABBank");
        assert_eq!(payload["to"], "+2348031004004");
        assert_eq!(payload["type"], "plain");
        assert!(payload["sms"].as_str().unwrap().starts_with("AB Bank: "));
    }

    #[tokio::test]
    async fn skips_profile_without_phone() {
        let adapter = TermiiSmsAdapter::new("key".to_string(), "ABBank".to_string(), None);
        let profile = CustomerProfile::new(1004, 100004, "Tunde", "Adeyemi", "t@test.com", "");
        let result = adapter.send(&event(), &profile).await;
        assert_eq!(
            result.status,
            notification_gateway_types::DeliveryStatus::Skipped
        );
    }
}
