//! Builds and validates channel adapters from the application config.
//!
//! Multiple providers of the same channel are returned in config priority
//! order; the dispatcher walks this list to implement automatic fallback.
//! Providers that are enabled but missing credentials are skipped with a
//! warning rather than failing startup; an unknown provider name is logged
//! and skipped the same way so one typo cannot take down all channels.

use std::sync::Arc;

use notification_gateway_config::{ChannelProviders, ProviderConfig};
use tracing::{error, info, warn};

use super::{
    ChannelAdapter, PostmarkEmailAdapter, SendGridEmailAdapter, TermiiSmsAdapter, TwilioSmsAdapter,
};

/// Build all enabled email adapters in config priority order.
pub fn build_email_adapters(config: &ChannelProviders) -> Vec<Arc<dyn ChannelAdapter>> {
    let adapters = build_adapters(config, build_email_adapter);
    if adapters.is_empty() {
        warn!("no email adapters are configured and operational; email notifications will be skipped");
    }
    adapters
}

/// Build all enabled SMS adapters in config priority order.
pub fn build_sms_adapters(config: &ChannelProviders) -> Vec<Arc<dyn ChannelAdapter>> {
    let adapters = build_adapters(config, build_sms_adapter);
    if adapters.is_empty() {
        warn!("no SMS adapters are configured and operational; SMS notifications will be skipped");
    }
    adapters
}

fn build_adapters(
    config: &ChannelProviders,
    build: fn(&ProviderConfig) -> Option<Arc<dyn ChannelAdapter>>,
) -> Vec<Arc<dyn ChannelAdapter>> {
    let mut adapters: Vec<Arc<dyn ChannelAdapter>> = Vec::new();

    for provider in config.providers.iter().filter(|p| p.enabled) {
        let Some(adapter) = build(provider) else {
            error!(provider = %provider.name, "unknown provider name, skipping");
            continue;
        };

        if adapter.is_configured() {
            info!(provider = %provider.name, channel = %adapter.kind(), "adapter ready");
            adapters.push(adapter);
        } else {
            warn!(
                provider = %provider.name,
                "provider enabled in config but missing credentials, skipping"
            );
        }
    }

    adapters
}

fn build_email_adapter(provider: &ProviderConfig) -> Option<Arc<dyn ChannelAdapter>> {
    match provider.name.to_lowercase().as_str() {
        "sendgrid" => Some(Arc::new(SendGridEmailAdapter::new(
            credential(&provider.api_key, "SENDGRID_API_KEY"),
            provider.from.clone().unwrap_or_default(),
            provider.reply_to.clone(),
        ))),
        "postmark" => Some(Arc::new(PostmarkEmailAdapter::new(
            credential(&provider.server_token, "POSTMARK_SERVER_TOKEN"),
            provider.from.clone().unwrap_or_default(),
            provider.message_stream.clone(),
        ))),
        _ => None,
    }
}

fn build_sms_adapter(provider: &ProviderConfig) -> Option<Arc<dyn ChannelAdapter>> {
    match provider.name.to_lowercase().as_str() {
        "twilio" => Some(Arc::new(TwilioSmsAdapter::new(
            credential(&provider.account_sid, "TWILIO_ACCOUNT_SID"),
            credential(&provider.auth_token, "TWILIO_AUTH_TOKEN"),
            credential(&provider.from_number, "TWILIO_FROM_NUMBER"),
        ))),
        "termii" => Some(Arc::new(TermiiSmsAdapter::new(
            credential(&provider.api_key, "TERMII_API_KEY"),
            provider.sender_id.clone().unwrap_or_default(),
            provider.channel.clone(),
        ))),
        _ => None,
    }
}

/// Config value if present and non-blank, else the conventional env variable.
fn credential(configured: &Option<String>, env_key: &str) -> String {
    configured
        .clone()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| std::env::var(env_key).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, enabled: bool) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            enabled,
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn disabled_providers_are_not_built() {
        let config = ChannelProviders {
            providers: vec![ProviderConfig {
                api_key: Some("sg-key".to_string()),
                from: Some("a@b.c".to_string()),
                ..provider("sendgrid", false)
            }],
        };
        assert!(build_email_adapters(&config).is_empty());
    }

    #[test]
    fn enabled_but_unconfigured_providers_are_skipped() {
        // Enabled, but no api_key anywhere: is_configured() is false
        let config = ChannelProviders {
            providers: vec![provider("sendgrid", true)],
        };
        assert!(build_email_adapters(&config).is_empty());
    }

    #[test]
    fn unknown_provider_names_are_skipped_not_fatal() {
        let config = ChannelProviders {
            providers: vec![
                provider("carrier-pigeon", true),
                ProviderConfig {
                    api_key: Some("tm-key".to_string()),
                    sender_id: Some("ABBank".to_string()),
                    ..provider("termii", true)
                },
            ],
        };
        let adapters = build_sms_adapters(&config);
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].provider_name(), "termii");
    }

    #[test]
    fn adapters_preserve_config_priority_order() {
        let config = ChannelProviders {
            providers: vec![
                ProviderConfig {
                    api_key: Some("sg-key".to_string()),
                    from: Some("alerts@abbank.example".to_string()),
                    ..provider("sendgrid", true)
                },
                ProviderConfig {
                    server_token: Some("pm-token".to_string()),
                    from: Some("alerts@abbank.example".to_string()),
                    ..provider("postmark", true)
                },
            ],
        };
        let adapters = build_email_adapters(&config);
        assert_eq!(adapters.len(), 2);
        assert_eq!(adapters[0].provider_name(), "sendgrid");
        assert_eq!(adapters[1].provider_name(), "postmark");
    }
}
