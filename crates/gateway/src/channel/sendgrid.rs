//! Email adapter backed by the SendGrid v3 Mail Send API.
//!
//! SendGrid returns `202 Accepted` on success with the message id in the
//! `X-Message-Id` response header.
//!
//! Required credential: `SENDGRID_API_KEY` with "Mail Send" permission.

use std::time::Duration;

use async_trait::async_trait;
use notification_gateway_types::profile::mask_email;
use notification_gateway_types::{CustomerProfile, DeliveryResult, NotificationEvent};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::{email_html, type_name, ChannelAdapter, ChannelKind};

const DEFAULT_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

pub struct SendGridEmailAdapter {
    api_key: String,
    from_address: String,
    reply_to: Option<String>,
    endpoint: String,
    http: reqwest::Client,
}

impl SendGridEmailAdapter {
    pub fn new(api_key: String, from_address: String, reply_to: Option<String>) -> Self {
        Self::with_endpoint(api_key, from_address, reply_to, DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint(
        api_key: String,
        from_address: String,
        reply_to: Option<String>,
        endpoint: String,
    ) -> Self {
        Self {
            api_key,
            from_address,
            reply_to,
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
        let mut root = json!({
            "personalizations": [{
                "to": [{
                    "email": profile.email,
                    "name": profile.full_name(),
                }],
            }],
            "from": {
                "email": self.from_address,
                "name": "AB Bank",
            },
            "subject": event.subject,
            "content": [
                {
                    "type": "text/plain",
                    "value": event.body,
                },
                {
                    "type": "text/html",
                    "value": email_html(event, profile),
                },
            ],
            // Custom args for the audit trail
            "custom_args": {
                "notificationId": event.notification_id,
                "notificationType": type_name(event),
                "accountId": event.account_id.to_string(),
            },
        });

        if let Some(reply_to) = self.reply_to.as_deref().filter(|r| !r.trim().is_empty()) {
            root["reply_to"] = json!({ "email": reply_to });
        }

        root
    }
}

#[async_trait]
impl ChannelAdapter for SendGridEmailAdapter {
    fn provider_name(&self) -> &str {
        "sendgrid"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
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
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(response) => {
                let code = response.status().as_u16();
                if code == 202 {
                    // Message id is in the X-Message-Id response header
                    let message_id = response
                        .headers()
                        .get("x-message-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown")
                        .to_string();
                    info!(
                        notification_id = %event.notification_id,
                        to = %mask_email(&profile.email),
                        message_id = %message_id,
                        subject = %event.subject,
                        "sendgrid email sent"
                    );
                    DeliveryResult::success(self.provider_name(), self.kind().as_str(), message_id, code)
                } else {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "(empty)".to_string());
                    warn!(
                        notification_id = %event.notification_id,
                        http = code,
                        body = %body,
                        "sendgrid rejected email"
                    );
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
                    "sendgrid transport error"
                );
                DeliveryResult::failure(self.provider_name(), self.kind().as_str(), e.to_string(), 0)
            }
        }
    }

    async fn close(&self) {
        debug!("sendgrid adapter closed");
    }
}
