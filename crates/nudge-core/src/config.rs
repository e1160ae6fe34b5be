use std::time::Duration;

use serde::{Deserialize, Serialize};

const PACKAGE_PLACEHOLDER: &str = "{package}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub endpoint: String,

    /// POST the current properties instead of a plain GET.
    #[serde(default)]
    pub post_properties: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Overall request timeout in milliseconds. Unset or zero leaves the
    /// transport defaults in place.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    #[serde(default = "default_store_uri_template")]
    pub store_uri_template: String,

    #[serde(default = "default_store_web_template")]
    pub store_web_template: String,
}

fn default_user_agent() -> String {
    concat!("nudge/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_store_uri_template() -> String {
    "market://details?id={package}".to_string()
}

fn default_store_web_template() -> String {
    "https://play.google.com/store/apps/details?id={package}".to_string()
}

impl CheckerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            post_properties: false,
            user_agent: default_user_agent(),
            request_timeout_ms: None,
            store_uri_template: default_store_uri_template(),
            store_web_template: default_store_web_template(),
        }
    }

    #[must_use]
    pub fn with_post_properties(mut self, post_properties: bool) -> Self {
        self.post_properties = post_properties;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sub-millisecond remainders round up so a short timeout never becomes
    /// zero.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|timeout| {
            u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
        });
        self
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    #[must_use]
    pub fn store_uri(&self, package_name: &str) -> String {
        self.store_uri_template
            .replace(PACKAGE_PLACEHOLDER, package_name)
    }

    #[must_use]
    pub fn store_web_url(&self, package_name: &str) -> String {
        self.store_web_template
            .replace(PACKAGE_PLACEHOLDER, package_name)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::CheckerConfig;

    #[test]
    fn deserialize_fills_defaults() {
        let config: CheckerConfig =
            serde_json::from_str(r#"{"endpoint":"https://example.com/versions.json"}"#)
                .expect("minimal config should deserialize");

        assert_eq!(config, CheckerConfig::new("https://example.com/versions.json"));
        assert!(!config.post_properties);
        assert!(config.request_timeout().is_none());
        assert!(config.user_agent.starts_with("nudge/"));
    }

    #[test]
    fn store_templates_substitute_package() {
        let config = CheckerConfig::new("https://example.com/versions.json");

        assert_eq!(
            config.store_uri("com.example.app"),
            "market://details?id=com.example.app"
        );
        assert_eq!(
            config.store_web_url("com.example.app"),
            "https://play.google.com/store/apps/details?id=com.example.app"
        );
    }

    #[test]
    fn builder_sets_timeout_in_seconds() {
        let config = CheckerConfig::new("https://example.com")
            .with_post_properties(true)
            .with_request_timeout(Some(Duration::from_secs(15)));

        assert!(config.post_properties);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn sub_second_timeout_is_kept() {
        let config = CheckerConfig::new("https://example.com")
            .with_request_timeout(Some(Duration::from_millis(500)));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(500)));

        let config = CheckerConfig::new("https://example.com")
            .with_request_timeout(Some(Duration::from_micros(1500)));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(2)));
    }

    #[test]
    fn zero_timeout_means_transport_default() {
        let config = CheckerConfig::new("https://example.com")
            .with_request_timeout(Some(Duration::ZERO));
        assert_eq!(config.request_timeout(), None);

        let config: CheckerConfig = serde_json::from_str(
            r#"{"endpoint":"https://example.com","request_timeout_ms":0}"#,
        )
        .expect("config with zero timeout should deserialize");
        assert_eq!(config.request_timeout(), None);
    }
}
