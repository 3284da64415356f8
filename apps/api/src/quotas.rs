//! Caller-owned quota configuration for protected functions.
//!
//! The admission core never owns limits; this registry is the api's own
//! configuration, validated once at startup and handed into every check.

use std::collections::HashMap;

use gatewell_application::QuotaConfig;
use gatewell_core::AppResult;

/// Per-function admission quotas with a fallback for unregistered functions.
#[derive(Clone)]
pub struct QuotaRegistry {
    quotas: HashMap<String, QuotaConfig>,
    default_quota: QuotaConfig,
}

impl QuotaRegistry {
    pub fn new(default_quota: QuotaConfig) -> Self {
        Self {
            quotas: HashMap::new(),
            default_quota,
        }
    }

    pub fn with_quota(mut self, function_name: &str, quota: QuotaConfig) -> Self {
        self.quotas.insert(function_name.to_owned(), quota);
        self
    }

    pub fn quota_for(&self, function_name: &str) -> QuotaConfig {
        self.quotas
            .get(function_name)
            .copied()
            .unwrap_or(self.default_quota)
    }
}

/// Builds the quota table for the portal's protected functions.
///
/// Email and provisioning functions are tight; read-style functions are
/// looser. Unregistered functions fall back to `default_quota`.
pub fn portal_quotas(default_quota: QuotaConfig) -> AppResult<QuotaRegistry> {
    Ok(QuotaRegistry::new(default_quota)
        .with_quota("send_contact_email", QuotaConfig::new(3, 10)?)
        .with_quota("send_welcome_email", QuotaConfig::new(5, 20)?)
        .with_quota("notify_account_change", QuotaConfig::new(10, 60)?)
        .with_quota("provision_product", QuotaConfig::new(5, 30)?)
        .with_quota("export_account", QuotaConfig::new(2, 6)?)
        .with_quota("delete_account", QuotaConfig::new(2, 5)?)
        .with_quota("session_api", QuotaConfig::new(60, 600)?)
        .with_quota("manage_sessions", QuotaConfig::new(30, 300)?))
}

#[cfg(test)]
mod tests {
    use gatewell_application::QuotaConfig;

    use super::portal_quotas;

    fn quota(per_minute: i64, per_hour: i64) -> QuotaConfig {
        match QuotaConfig::new(per_minute, per_hour) {
            Ok(quota) => quota,
            Err(error) => panic!("invalid test quota: {error}"),
        }
    }

    #[test]
    fn registered_functions_use_their_own_quota() {
        let Ok(registry) = portal_quotas(quota(30, 300)) else {
            panic!("portal quota table failed validation");
        };

        let email = registry.quota_for("send_contact_email");
        assert_eq!(email.requests_per_minute(), 3);
        assert_eq!(email.requests_per_hour(), 10);
    }

    #[test]
    fn unregistered_functions_fall_back_to_the_default() {
        let Ok(registry) = portal_quotas(quota(7, 70)) else {
            panic!("portal quota table failed validation");
        };

        let fallback = registry.quota_for("generate_campaign_copy");
        assert_eq!(fallback.requests_per_minute(), 7);
        assert_eq!(fallback.requests_per_hour(), 70);
    }
}
