//! Pluggable notification channel adapters.
//!
//! Each adapter wraps a single external provider and translates a
//! [`NotificationEvent`] into that provider's wire format. Adapters are
//! shared, stateless with respect to per-event data, and must never return
//! an error from `send`: every outcome is captured in a [`DeliveryResult`].
//! The retry policy is applied by the retry executor above this layer.

use std::fmt;

use async_trait::async_trait;
use notification_gateway_types::{CustomerProfile, DeliveryResult, NotificationEvent, Severity};

mod factory;
mod postmark;
mod sendgrid;
mod termii;
mod twilio;

pub use factory::{build_email_adapters, build_sms_adapters};
pub use postmark::PostmarkEmailAdapter;
pub use sendgrid::SendGridEmailAdapter;
pub use termii::TermiiSmsAdapter;
pub use twilio::TwilioSmsAdapter;

/// The transport category an adapter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "EMAIL",
            ChannelKind::Sms => "SMS",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability contract for one provider integration.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Stable provider identifier used in logs and results (e.g. "sendgrid").
    fn provider_name(&self) -> &str;

    fn kind(&self) -> ChannelKind;

    /// Whether this adapter has the credentials required to operate.
    /// Checked once at startup to fail fast.
    fn is_configured(&self) -> bool;

    /// Send one notification. Must return a result, never an error; transport
    /// faults become `Failure`, missing contact details become `Skipped`.
    async fn send(&self, event: &NotificationEvent, profile: &CustomerProfile) -> DeliveryResult;

    /// Release held resources. Idempotent.
    async fn close(&self);
}

/// Single-line SMS text: subject and body joined, truncated to one segment.
pub(crate) fn sms_text(event: &NotificationEvent) -> String {
    let sms = format!("AB Bank: {}. {}", event.subject, event.body);
    if sms.chars().count() <= 160 {
        sms
    } else {
        let truncated: String = sms.chars().take(157).collect();
        format!("{truncated}...")
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn severity_color(severity: Option<Severity>) -> &'static str {
    match severity {
        Some(Severity::Critical) => "#922b21",
        Some(Severity::High) => "#c0392b",
        Some(Severity::Medium) => "#d97706",
        Some(Severity::Low) | None => "#1a5276",
    }
}

/// Branded HTML body shared by the email adapters.
pub(crate) fn email_html(event: &NotificationEvent, profile: &CustomerProfile) -> String {
    let color = severity_color(event.severity);
    format!(
        "<html><body style=\"font-family:Arial,sans-serif;max-width:600px;margin:0 auto;\">\
         <div style=\"background:{color};color:white;padding:16px;border-radius:4px 4px 0 0;\">\
         <h2 style=\"margin:0;\">{subject}</h2>\
         </div>\
         <div style=\"padding:24px;background:#f9f9f9;\">\
         <p>Dear {first_name},</p>\
         <p style=\"white-space:pre-line;\">{body}</p>\
         </div>\
         <div style=\"padding:12px 24px;font-size:12px;color:#666;\">\
         <p>This is an automated message from AB Bank. Please do not reply to this email.</p>\
         <p>If you did not initiate this activity, contact us immediately at \
         <a href=\"tel:+2341234567890\">+234 123 456 7890</a>.</p>\
         </div>\
         </body></html>",
        color = color,
        subject = escape_html(&event.subject),
        first_name = escape_html(&profile.first_name),
        body = escape_html(&event.body),
    )
}

/// Wire name of the notification type, "UNKNOWN" when absent.
pub(crate) fn type_name(event: &NotificationEvent) -> &'static str {
    use notification_gateway_types::NotificationType::*;
    match event.notification_type {
        Some(FraudAlert) => "FRAUD_ALERT",
        Some(HighValueAlert) => "HIGH_VALUE_ALERT",
        Some(BalanceUpdate) => "BALANCE_UPDATE",
        Some(DormancyAlert) => "DORMANCY_ALERT",
        Some(DailySpendSummary) => "DAILY_SPEND_SUMMARY",
        None => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notification_gateway_types::NotificationType;

    fn event(subject: &str, body: &str) -> NotificationEvent {
        NotificationEvent {
            notification_id: "ntf-1".to_string(),
            notification_type: Some(NotificationType::FraudAlert),
            severity: Some(Severity::High),
            channel: None,
            account_id: 100001,
            customer_id: None,
            account_number: None,
            subject: subject.to_string(),
            body: body.to_string(),
            event_time: None,
            generated_at: None,
            metadata: None,
        }
    }

    #[test]
    fn sms_text_fits_in_one_segment() {
        let short = sms_text(&event("Alert", "Card blocked."));
        assert_eq!(short, "AB Bank: Alert. Card blocked.");

        let long = sms_text(&event("Alert", &"x".repeat(300)));
        assert_eq!(long.chars().count(), 160);
        assert!(long.ends_with("..."));
    }

    #[test]
    fn html_escapes_markup_in_subject_and_body() {
        let profile = CustomerProfile::new(1, 1, "Ada<script>", "Okafor", "a@b.com", "");
        let html = email_html(&event("<b>Alert</b>", "1 < 2 & 3 > 2"), &profile);
        assert!(html.contains("&lt;b&gt;Alert&lt;/b&gt;"));
        assert!(html.contains("1 &lt; 2 &amp; 3 &gt; 2"));
        assert!(html.contains("Ada&lt;script&gt;"));
    }

    #[test]
    fn severity_maps_to_banner_color() {
        assert_eq!(severity_color(Some(Severity::Critical)), "#922b21");
        assert_eq!(severity_color(None), "#1a5276");
    }

    #[test]
    fn channel_kind_renders_wire_names() {
        assert_eq!(ChannelKind::Email.to_string(), "EMAIL");
        assert_eq!(ChannelKind::Sms.as_str(), "SMS");
    }
}
