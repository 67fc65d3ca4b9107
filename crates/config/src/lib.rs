//! Configuration for the notification gateway.
//!
//! Configuration is loaded from an optional YAML file merged with
//! `GATEWAY_`-prefixed environment variables (`__` as the section separator,
//! e.g. `GATEWAY_KAFKA__GROUP_ID`). Secrets are normally supplied through the
//! provider-specific environment variables read by the adapter factory; this
//! crate only checks their presence, never logs their values.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use notification_gateway_types::Severity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub kafka: KafkaConfig,

    #[serde(default)]
    pub channels: ChannelsConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

impl GatewayConfig {
    /// Load configuration from an optional YAML file and the environment.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed("GATEWAY_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Validate cross-field constraints. Called once at startup; the process
    /// refuses to start on any violation.
    pub fn validate(&self) -> Result<()> {
        if self.kafka.bootstrap_servers.is_empty() {
            return Err(ConfigError::Validation(
                "kafka.bootstrap_servers is required".to_string(),
            ));
        }

        if self.kafka.group_id.is_empty() {
            return Err(ConfigError::Validation(
                "kafka.group_id is required".to_string(),
            ));
        }

        if self.kafka.topics.is_empty() {
            return Err(ConfigError::Validation(
                "kafka.topics must name at least one topic".to_string(),
            ));
        }

        if !["earliest", "latest", "none"].contains(&self.kafka.auto_offset_reset.as_str()) {
            return Err(ConfigError::Validation(format!(
                "kafka.auto_offset_reset must be 'earliest', 'latest' or 'none', got '{}'",
                self.kafka.auto_offset_reset
            )));
        }

        if self.kafka.max_poll_records == 0 {
            return Err(ConfigError::Validation(
                "kafka.max_poll_records must be at least 1".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::Validation(format!(
                "retry.backoff_factor must be >= 1.0, got {}",
                self.retry.backoff_factor
            )));
        }

        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(ConfigError::Validation(format!(
                "retry.max_delay_ms ({}) must be >= retry.initial_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.initial_delay_ms
            )));
        }

        // The dead-letter producer is wired from this topic; an empty topic
        // with on_exhausted=kafka would silently drop undeliverable events.
        if self.retry.on_exhausted == ExhaustedAction::Kafka && self.retry.dlq_topic.is_empty() {
            return Err(ConfigError::Validation(
                "retry.dlq_topic is required when retry.on_exhausted is 'kafka'".to_string(),
            ));
        }

        if self.health.port == 0 {
            return Err(ConfigError::Validation(
                "health.port must be a non-zero TCP port".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kafka: KafkaConfig::default(),
            channels: ChannelsConfig::default(),
            routing: RoutingConfig::default(),
            resolver: ResolverConfig::default(),
            retry: RetryConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

/// Bus consumer settings, forwarded to the Kafka client unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Broker addresses, comma-separated.
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// "earliest", "latest" or "none".
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,

    /// Upper bound on the records drained per poll batch.
    #[serde(default = "default_max_poll_records")]
    pub max_poll_records: usize,

    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Topics to subscribe to.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
            group_id: default_group_id(),
            auto_offset_reset: default_auto_offset_reset(),
            max_poll_records: default_max_poll_records(),
            session_timeout_ms: default_session_timeout_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            topics: default_topics(),
        }
    }
}

/// Channel provider lists, one per channel, in fallback priority order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub email: ChannelProviders,

    #[serde(default)]
    pub sms: ChannelProviders,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelProviders {
    /// Ordered provider list; the leftmost enabled provider is primary.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// One provider entry. Only `name` and `enabled` are universal; the remaining
/// fields are read by the matching adapter and ignored by the others.
/// Credentials may be left unset here and supplied via the provider's
/// conventional environment variable instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,

    #[serde(default)]
    pub enabled: bool,

    // Email providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_stream: Option<String>,

    // SMS providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_number: Option<String>,
}

/// Routing rules applied by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Severities that force delivery on both channels regardless of the
    /// event's channel hint.
    #[serde(default = "default_force_both")]
    pub force_both_on_severity: Vec<Severity>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            force_both_on_severity: default_force_both(),
        }
    }
}

/// Customer resolver selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(rename = "type", default)]
    pub kind: ResolverKind,

    #[serde(default)]
    pub http: HttpResolverConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            kind: ResolverKind::default(),
            http: HttpResolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    #[default]
    Mock,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResolverConfig {
    #[serde(default = "default_resolver_base_url")]
    pub base_url: String,

    #[serde(default = "default_resolver_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HttpResolverConfig {
    fn default() -> Self {
        Self {
            base_url: default_resolver_base_url(),
            timeout_ms: default_resolver_timeout_ms(),
        }
    }
}

/// Retry executor settings plus the exhausted-delivery policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default)]
    pub on_exhausted: ExhaustedAction,

    #[serde(default = "default_dlq_topic")]
    pub dlq_topic: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
            on_exhausted: ExhaustedAction::default(),
            dlq_topic: default_dlq_topic(),
        }
    }
}

/// What to do when every adapter of every required channel has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedAction {
    /// Emit a single ERROR log line.
    #[default]
    Log,
    /// Additionally publish the original record to the dead-letter topic.
    Kafka,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            port: default_health_port(),
        }
    }
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

fn default_group_id() -> String {
    "notification-gateway".to_string()
}

fn default_auto_offset_reset() -> String {
    "earliest".to_string()
}

fn default_max_poll_records() -> usize {
    500
}

fn default_session_timeout_ms() -> u64 {
    30_000
}

fn default_heartbeat_interval_ms() -> u64 {
    3_000
}

fn default_topics() -> Vec<String> {
    vec![
        "abbank.notifications.fraud-alert".to_string(),
        "abbank.notifications.high-value-alert".to_string(),
        "abbank.notifications.balance-update".to_string(),
        "abbank.notifications.dormancy-alert".to_string(),
        "abbank.notifications.daily-spend-summary".to_string(),
    ]
}

fn default_force_both() -> Vec<Severity> {
    vec![Severity::High, Severity::Critical]
}

fn default_resolver_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_resolver_timeout_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_dlq_topic() -> String {
    "abbank.notifications.dlq".to_string()
}

fn default_health_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.kafka.topics.len(), 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(
            config.routing.force_both_on_severity,
            vec![Severity::High, Severity::Critical]
        );
    }

    #[test]
    fn rejects_zero_max_attempts() {
        let mut config = GatewayConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_backoff_factor_below_one() {
        let mut config = GatewayConfig::default();
        config.retry.backoff_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_max_delay_below_initial_delay() {
        let mut config = GatewayConfig::default();
        config.retry.initial_delay_ms = 5_000;
        config.retry.max_delay_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_kafka_exhausted_action_without_dlq_topic() {
        let mut config = GatewayConfig::default();
        config.retry.on_exhausted = ExhaustedAction::Kafka;
        config.retry.dlq_topic = String::new();
        assert!(config.validate().is_err());

        config.retry.dlq_topic = "notifications.dlq".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_offset_reset() {
        let mut config = GatewayConfig::default();
        config.kafka.auto_offset_reset = "sometime".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_topics() {
        let mut config = GatewayConfig::default();
        config.kafka.topics.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_yaml_fragment() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "gateway.yaml",
                r#"
kafka:
  bootstrap_servers: "broker-1:9092,broker-2:9092"
  group_id: "gateway-test"
  topics:
    - "notifications.test"
retry:
  max_attempts: 5
  on_exhausted: kafka
  dlq_topic: "notifications.test.dlq"
channels:
  email:
    providers:
      - name: sendgrid
        enabled: true
        from: "alerts@abbank.example"
"#,
            )?;

            let config = GatewayConfig::load(Some("gateway.yaml".into()))
                .map_err(|e| figment::Error::from(e.to_string()))?;

            assert_eq!(config.kafka.bootstrap_servers, "broker-1:9092,broker-2:9092");
            assert_eq!(config.kafka.topics, vec!["notifications.test"]);
            assert_eq!(config.retry.max_attempts, 5);
            assert_eq!(config.retry.on_exhausted, ExhaustedAction::Kafka);
            assert_eq!(config.channels.email.providers.len(), 1);
            assert!(config.channels.email.providers[0].enabled);
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("gateway.yaml", "kafka:\n  group_id: from-file\n")?;
            jail.set_env("GATEWAY_KAFKA__GROUP_ID", "from-env");

            let config = GatewayConfig::load(Some("gateway.yaml".into()))
                .map_err(|e| figment::Error::from(e.to_string()))?;

            assert_eq!(config.kafka.group_id, "from-env");
            Ok(())
        });
    }
}
