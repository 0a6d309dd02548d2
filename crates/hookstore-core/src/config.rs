//! Configuration types for hookstore
//!
//! These structures are plain data and can be deserialized from any serde
//! format. Wiring that needs trait objects (listeners, fetchers) lives in
//! [`crate::poller::PollerConfig`] instead.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{ConfigViolation, Error, Result};

/// Default bucket registrations are stored under
pub const DEFAULT_BUCKET: &str = "webhooks";

/// Default interval between polls
pub const DEFAULT_PULL_INTERVAL: Duration = Duration::from_secs(5);

/// Default name of the poll outcome counter
pub const DEFAULT_POLL_COUNTER_NAME: &str = "hookstore_polls_total";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookstoreConfig {
    /// Remote store settings
    pub store: StoreConfig,

    /// Poller settings
    #[serde(default)]
    pub listener: ListenerConfig,
}

impl HookstoreConfig {
    /// Create a configuration for the given store address with defaults
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            store: StoreConfig::new(address),
            listener: ListenerConfig::default(),
        }
    }

    /// Validate the configuration, reporting every violation at once
    pub fn validate(&self) -> Result<()> {
        let mut violations = self.store.violations();
        violations.extend(self.listener.violations());

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(violations))
        }
    }
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base address of the store (e.g. "https://store.example.com")
    pub address: String,

    /// Bucket the items live in
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Create a store configuration with the default bucket and timeout
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            bucket: default_bucket(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Per-request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the store configuration
    pub fn validate(&self) -> Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(violations))
        }
    }

    fn violations(&self) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();

        if self.address.is_empty() {
            violations.push(ConfigViolation::EmptyAddress);
        } else if !is_http_base_url(&self.address) {
            violations.push(ConfigViolation::InvalidAddress(self.address.clone()));
        }

        if self.bucket.is_empty() {
            violations.push(ConfigViolation::EmptyBucket);
        }

        if self.timeout_secs == 0 {
            violations.push(ConfigViolation::ZeroTimeout);
        }

        violations
    }
}

/// Poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Interval between polls (in milliseconds)
    ///
    /// Zero is replaced by the default of five seconds.
    #[serde(default = "default_pull_interval_ms")]
    pub pull_interval_ms: u64,

    /// Name of the counter that records poll outcomes
    #[serde(default = "default_poll_counter_name")]
    pub poll_counter_name: String,
}

impl ListenerConfig {
    /// Effective pull interval, substituting the default for zero
    pub fn pull_interval(&self) -> Duration {
        effective_interval(Duration::from_millis(self.pull_interval_ms))
    }

    fn violations(&self) -> Vec<ConfigViolation> {
        if self.poll_counter_name.is_empty() {
            vec![ConfigViolation::EmptyMetricName]
        } else {
            Vec::new()
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            pull_interval_ms: default_pull_interval_ms(),
            poll_counter_name: default_poll_counter_name(),
        }
    }
}

/// Substitute the default interval for a zero one
pub fn effective_interval(interval: Duration) -> Duration {
    if interval.is_zero() {
        DEFAULT_PULL_INTERVAL
    } else {
        interval
    }
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_pull_interval_ms() -> u64 {
    DEFAULT_PULL_INTERVAL.as_millis() as u64
}

/// True if `address` parses as an http(s) URL with a host that paths can be
/// appended to
fn is_http_base_url(address: &str) -> bool {
    match Url::parse(address) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.has_host()
                && !url.cannot_be_a_base()
        }
        Err(_) => false,
    }
}

fn default_poll_counter_name() -> String {
    DEFAULT_POLL_COUNTER_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let config: HookstoreConfig =
            serde_json::from_str(r#"{"store":{"address":"http://localhost:6600"}}"#).unwrap();

        assert_eq!(config.store.bucket, "webhooks");
        assert_eq!(config.store.timeout(), Duration::from_secs(30));
        assert_eq!(config.listener.pull_interval(), Duration::from_secs(5));
        assert_eq!(config.listener.poll_counter_name, "hookstore_polls_total");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_uses_default() {
        let config = ListenerConfig {
            pull_interval_ms: 0,
            ..ListenerConfig::default()
        };
        assert_eq!(config.pull_interval(), DEFAULT_PULL_INTERVAL);

        let config = ListenerConfig {
            pull_interval_ms: 50,
            ..ListenerConfig::default()
        };
        assert_eq!(config.pull_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_validation_aggregates_violations() {
        let mut config = HookstoreConfig::new("");
        config.store.bucket = String::new();
        config.store.timeout_secs = 0;
        config.listener.poll_counter_name = String::new();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.violations(),
            &[
                ConfigViolation::EmptyAddress,
                ConfigViolation::EmptyBucket,
                ConfigViolation::ZeroTimeout,
                ConfigViolation::EmptyMetricName,
            ]
        );
    }

    #[test]
    fn test_address_scheme_is_checked() {
        let err = StoreConfig::new("store.example.com").validate().unwrap_err();
        assert_eq!(
            err.violations(),
            &[ConfigViolation::InvalidAddress("store.example.com".to_string())]
        );

        assert!(StoreConfig::new("https://store.example.com").validate().is_ok());
    }

    #[test]
    fn test_unparseable_address_rejected() {
        for address in ["http://exa mple", "https://", "http://[::1", "ftp://store.example.com"] {
            let err = StoreConfig::new(address).validate().unwrap_err();
            assert_eq!(
                err.violations(),
                &[ConfigViolation::InvalidAddress(address.to_string())],
                "address {address:?}"
            );
        }

        assert!(StoreConfig::new("http://127.0.0.1:6600").validate().is_ok());
        assert!(StoreConfig::new("https://gw.example.com/argus/").validate().is_ok());
    }
}
