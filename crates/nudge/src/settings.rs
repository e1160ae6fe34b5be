use std::path::Path;

use nudge_core::{CheckerConfig, CurrentProperties};
use nudge_platform::DeviceInfo;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Settings of the sample host application, stored as JSON in its config
/// directory. Command line flags override them for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub post_properties: bool,

    #[serde(default = "default_package_name")]
    pub package_name: String,

    #[serde(default = "default_version_code")]
    pub version_code: i64,

    #[serde(default)]
    pub version_name: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_package_name() -> String {
    "io.nudge.sample".to_string()
}

fn default_version_code() -> i64 {
    1
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            post_properties: false,
            package_name: default_package_name(),
            version_code: default_version_code(),
            version_name: None,
            language: None,
            user_agent: None,
            request_timeout_secs: None,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl Settings {
    /// Missing or unreadable files yield the defaults.
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring invalid settings at {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(endpoint) = &cli.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if cli.post {
            self.post_properties = true;
        }
        if let Some(package) = &cli.package {
            self.package_name.clone_from(package);
        }
        if let Some(version_code) = cli.version_code {
            self.version_code = version_code;
        }
        if let Some(version_name) = &cli.version_name {
            self.version_name = Some(version_name.clone());
        }
        if let Some(language) = &cli.language {
            self.language = Some(language.clone());
        }
        if cli.debug {
            self.debug_logging = true;
        }
    }

    /// `None` when no endpoint is configured.
    pub fn checker_config(&self) -> Option<CheckerConfig> {
        let endpoint = self.endpoint.as_ref()?;
        let mut config = CheckerConfig::new(endpoint.clone())
            .with_post_properties(self.post_properties)
            .with_request_timeout(
                self.request_timeout_secs
                    .map(std::time::Duration::from_secs),
            );
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        Some(config)
    }

    pub fn current_properties(&self, device: &DeviceInfo) -> CurrentProperties {
        let mut properties =
            CurrentProperties::new(self.package_name.clone(), self.version_code).with_device(device);
        if let Some(version_name) = &self.version_name {
            properties = properties.with_version_name(version_name.clone());
        }
        if let Some(language) = &self.language {
            properties = properties.with_language(language.clone());
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use nudge_platform::DeviceInfo;

    use super::Settings;
    use crate::cli::Cli;

    #[test]
    fn load_from_path_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let missing = Settings::load_from_path(&temp_dir.path().join("missing.json"));
        assert_eq!(missing.package_name, "io.nudge.sample");

        let invalid_path = temp_dir.path().join("settings.json");
        std::fs::write(&invalid_path, "{not-json").expect("settings file should be written");
        let invalid = Settings::load_from_path(&invalid_path);
        assert_eq!(invalid.version_code, 1);
        assert!(invalid.endpoint.is_none());
    }

    #[test]
    fn partial_settings_keep_defaults_for_missing_fields() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "endpoint": "https://example.com/versions.json",
            "version_code": 12,
        }))
        .expect("partial settings should deserialize");

        assert_eq!(settings.version_code, 12);
        assert_eq!(settings.package_name, "io.nudge.sample");
        assert_eq!(settings.max_log_size_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn cli_flags_override_settings() {
        let cli = Cli::parse_from([
            "nudge",
            "--endpoint",
            "https://example.com/v.json",
            "--post",
            "--package",
            "com.example.app",
            "--version-code",
            "7",
            "--language",
            "tr-TR",
            "check",
        ]);
        let mut settings = Settings::default();
        settings.apply_overrides(&cli);

        let config = settings.checker_config().expect("endpoint is configured");
        assert_eq!(config.endpoint, "https://example.com/v.json");
        assert!(config.post_properties);

        let properties = settings.current_properties(&DeviceInfo {
            os_name: "linux".to_string(),
            language: Some("en-US".to_string()),
            ..DeviceInfo::default()
        });
        assert_eq!(properties.app_package_name, "com.example.app");
        assert_eq!(properties.app_version_code, 7);
        assert_eq!(properties.device_language.as_deref(), Some("tr-TR"));
        assert_eq!(properties.device_os_name.as_deref(), Some("linux"));
    }

    #[test]
    fn checker_config_requires_endpoint() {
        assert!(Settings::default().checker_config().is_none());
    }
}
