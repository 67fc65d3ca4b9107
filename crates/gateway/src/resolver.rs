//! Customer profile resolution.
//!
//! Resolving an account to contact details is a pure lookup at this
//! boundary: "not found" is a permanent skip for the event, and any
//! transport error is surfaced as "not found". The gateway does not retry
//! resolution.

use std::time::Duration;

use async_trait::async_trait;
use notification_gateway_config::HttpResolverConfig;
use notification_gateway_types::CustomerProfile;
use serde::Deserialize;
use tracing::{debug, error, warn};

#[async_trait]
pub trait CustomerResolver: Send + Sync {
    async fn resolve(&self, account_id: i64) -> Option<CustomerProfile>;
}

/// Deterministic resolver for local development and testing.
///
/// Generates predictable contact details from the account id so tests are
/// repeatable without a live customer service. Phone numbers are E.164 with
/// the +234 country code.
pub struct MockCustomerResolver;

const FIRST_NAMES: [&str; 15] = [
    "Amaka", "Chidi", "Fatima", "Ibrahim", "Kemi", "Lanre", "Mercy", "Nnamdi", "Ola", "Peace",
    "Raheem", "Sade", "Tobi", "Uche", "Wale",
];

const LAST_NAMES: [&str; 15] = [
    "Adebayo", "Adekunle", "Afolabi", "Agbo", "Ajayi", "Akindele", "Bello", "Dike", "Eze",
    "Fasanya", "Hassan", "Ihejirika", "Jibrin", "Lawal", "Nwachukwu",
];

fn fixtures() -> [CustomerProfile; 5] {
    [
        CustomerProfile::new(1001, 100001, "Adaeze", "Okafor", "adaeze.okafor@email.com", "+2348031001001"),
        CustomerProfile::new(1002, 100002, "Emeka", "Nwosu", "emeka.nwosu@email.com", "+2348031002002"),
        CustomerProfile::new(1003, 100003, "Ngozi", "Eze", "ngozi.eze@email.com", "+2348031003003"),
        CustomerProfile::new(1004, 100004, "Tunde", "Adeyemi", "tunde.adeyemi@email.com", "+2348031004004"),
        CustomerProfile::new(1005, 100005, "Chisom", "Obi", "chisom.obi@email.com", "+2348031005005"),
    ]
}

#[async_trait]
impl CustomerResolver for MockCustomerResolver {
    async fn resolve(&self, account_id: i64) -> Option<CustomerProfile> {
        if let Some(fixture) = fixtures().into_iter().find(|f| f.account_id == account_id) {
            debug!(account_id, "mock resolver: found fixture");
            return Some(fixture);
        }

        let customer_id = account_id.saturating_add(900_000);
        let suffix = account_id.rem_euclid(10_000);
        let first_name = FIRST_NAMES[account_id.rem_euclid(FIRST_NAMES.len() as i64) as usize];
        let last_name = LAST_NAMES[(account_id / 10).rem_euclid(LAST_NAMES.len() as i64) as usize];
        let email = format!("{first_name}.{last_name}{suffix}@abbank-demo.com").to_lowercase();
        let phone = format!("+2348{:09}", account_id.rem_euclid(1_000_000_000));

        debug!(account_id, customer_id, "mock resolver: generated profile");
        Some(CustomerProfile::new(
            customer_id,
            account_id,
            first_name,
            last_name,
            email,
            phone,
        ))
    }
}

/// Production resolver that calls an HTTP customer profile service.
///
/// Expected endpoint: `GET {base_url}/customers/by-account/{account_id}`
/// returning `{customerId, accountId, firstName, lastName, email, phoneNumber}`.
pub struct HttpCustomerResolver {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDto {
    #[serde(default)]
    customer_id: i64,
    #[serde(default)]
    account_id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_number: String,
}

impl HttpCustomerResolver {
    pub fn new(config: &HttpResolverConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .connect_timeout(timeout)
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl CustomerResolver for HttpCustomerResolver {
    async fn resolve(&self, account_id: i64) -> Option<CustomerProfile> {
        let url = format!("{}/customers/by-account/{}", self.base_url, account_id);

        let response = match self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(account_id, error = %e, "failed to reach customer service");
                return None;
            }
        };

        let status = response.status();
        if status.as_u16() == 404 {
            warn!(account_id, "customer not found");
            return None;
        }
        if !status.is_success() {
            error!(account_id, http = status.as_u16(), "customer service error");
            return None;
        }

        match response.json::<ProfileDto>().await {
            Ok(dto) => Some(CustomerProfile::new(
                dto.customer_id,
                dto.account_id,
                dto.first_name,
                dto.last_name,
                dto.email,
                dto.phone_number,
            )),
            Err(e) => {
                error!(account_id, error = %e, "malformed customer profile response");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_resolver_returns_fixture_accounts() {
        let profile = MockCustomerResolver.resolve(100001).await.unwrap();
        assert_eq!(profile.customer_id, 1001);
        assert_eq!(profile.first_name, "Adaeze");
        assert!(profile.has_email());
        assert!(profile.has_phone());
    }

    #[tokio::test]
    async fn mock_resolver_generates_deterministic_profiles() {
        let first = MockCustomerResolver.resolve(424242).await.unwrap();
        let second = MockCustomerResolver.resolve(424242).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.account_id, 424242);
        assert_eq!(first.customer_id, 424242 + 900_000);
        assert!(first.email.ends_with("@abbank-demo.com"));
        assert!(first.phone.starts_with("+2348"));
        assert_eq!(first.phone.len(), 14);
    }

    #[tokio::test]
    async fn mock_resolver_handles_unusual_account_ids() {
        // Must not panic on ids outside the fixture range
        assert!(MockCustomerResolver.resolve(0).await.is_some());
        assert!(MockCustomerResolver.resolve(i64::MAX).await.is_some());
    }
}
