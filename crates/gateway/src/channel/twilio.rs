//! SMS adapter backed by Twilio Programmable SMS.
//!
//! Twilio provides global SMS coverage including Nigeria; recommended as the
//! fallback SMS provider behind a local route, or as the primary provider
//! for international customers. Success is `201 Created` with the message
//! SID in the response body. Auth is HTTP Basic with `AccountSid:AuthToken`.
//!
//! Required credentials: `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`,
//! `TWILIO_FROM_NUMBER` (E.164 or a registered alphanumeric sender id).

use std::time::Duration;

use async_trait::async_trait;
use notification_gateway_types::profile::mask_phone;
use notification_gateway_types::{CustomerProfile, DeliveryResult, NotificationEvent};
use tracing::{debug, error, info, warn};

use super::{sms_text, ChannelAdapter, ChannelKind};

pub struct TwilioSmsAdapter {
    account_sid: String,
    auth_token: String,
    from_number: String,
    endpoint_base: String,
    http: reqwest::Client,
}

impl TwilioSmsAdapter {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self::with_endpoint_base(
            account_sid,
            auth_token,
            from_number,
            "https://api.twilio.com".to_string(),
        )
    }

    pub fn with_endpoint_base(
        account_sid: String,
        auth_token: String,
        from_number: String,
        endpoint_base: String,
    ) -> Self {
        Self {
            account_sid,
            auth_token,
            from_number,
            endpoint_base,
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.endpoint_base, self.account_sid
        )
    }
}

#[async_trait]
impl ChannelAdapter for TwilioSmsAdapter {
    fn provider_name(&self) -> &str {
        "twilio"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    fn is_configured(&self) -> bool {
        !self.account_sid.trim().is_empty()
            && !self.auth_token.trim().is_empty()
            && !self.from_number.trim().is_empty()
    }

    async fn send(&self, event: &NotificationEvent, profile: &CustomerProfile) -> DeliveryResult {
        if !profile.has_phone() {
            return DeliveryResult::skipped(
                self.provider_name(),
                self.kind().as_str(),
                format!("Customer {} has no phone number", profile.customer_id),
            );
        }

        let body_text = sms_text(event);
        let form = [
            ("To", profile.phone.as_str()),
            ("From", self.from_number.as_str()),
            ("Body", body_text.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await;

        match response {
            Ok(response) => {
                let code = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();

                if code == 201 {
                    let sid = extract_sid(&body);
                    info!(
                        notification_id = %event.notification_id,
                        to = %mask_phone(&profile.phone),
                        sid = %sid,
                        "twilio sms sent"
                    );
                    DeliveryResult::success(self.provider_name(), self.kind().as_str(), sid, code)
                } else {
                    warn!(http = code, body = %body, "twilio rejected sms");
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
                    "twilio transport error"
                );
                DeliveryResult::failure(self.provider_name(), self.kind().as_str(), e.to_string(), 0)
            }
        }
    }

    async fn close(&self) {
        debug!("twilio adapter closed");
    }
}

fn extract_sid(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("sid").and_then(|s| s.as_str()).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TwilioSmsAdapter {
        TwilioSmsAdapter::new(
            "ACxxxxxxxx".to_string(),
            "token".to_string(),
            "+12025551234".to_string(),
        )
    }

    #[test]
    fn configured_requires_all_three_credentials() {
        assert!(adapter().is_configured());
        let missing =
            TwilioSmsAdapter::new("ACxxxxxxxx".to_string(), "".to_string(), "+1".to_string());
        assert!(!missing.is_configured());
    }

    #[test]
    fn endpoint_embeds_the_account_sid() {
        assert_eq!(
            adapter().endpoint(),
            "https://api.twilio.com/2010-04-01/Accounts/ACxxxxxxxx/Messages.json"
        );
    }

    #[test]
    fn sid_extraction_tolerates_garbage() {
        assert_eq!(extract_sid(r#"{"sid": "SM123"}"#), "SM123");
        assert_eq!(extract_sid(""), "unknown");
    }

    #[tokio::test]
    async fn skips_profile_without_phone() {
        let profile = CustomerProfile::new(1003, 100003, "Ngozi", "Eze", "ngozi@test.com", "");
        let event = NotificationEvent {
            notification_id: "ntf-tw-1".to_string(),
            notification_type: None,
            severity: None,
            channel: None,
            account_id: 100003,
            customer_id: Some(1003),
            account_number: None,
            subject: "Alert".to_string(),
            body: "Body".to_string(),
            event_time: None,
            generated_at: None,
            metadata: None,
        };
        let result = adapter().send(&event, &profile).await;
        assert_eq!(
            result.status,
            notification_gateway_types::DeliveryStatus::Skipped
        );
        assert!(result.error_message.unwrap().contains("no phone number"));
    }
}
