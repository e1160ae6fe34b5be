use serde::{Deserialize, Serialize};

const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Snapshot of the device the host application runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub os_name: String,
    pub os_version: Option<String>,
    pub language: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

impl DeviceInfo {
    #[must_use]
    pub fn detect() -> Self {
        let info = Self {
            os_name: std::env::consts::OS.to_string(),
            os_version: detect_os_version(),
            language: detect_language(|key| std::env::var(key).ok()),
            manufacturer: detect_manufacturer(),
            model: detect_model(),
        };
        log::debug!("Detected device: {info:?}");
        info
    }
}

fn detect_language(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    LOCALE_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .find_map(|value| normalize_locale(&value))
}

/// Turns a POSIX locale such as `tr_TR.UTF-8@euro` into a language tag
/// (`tr-TR`). The `C` and `POSIX` locales carry no language.
#[must_use]
pub fn normalize_locale(raw: &str) -> Option<String> {
    let without_modifier = raw.split('@').next().unwrap_or(raw);
    let tag = without_modifier
        .split('.')
        .next()
        .unwrap_or(without_modifier)
        .trim();

    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }

    Some(tag.replace('_', "-"))
}

#[cfg(target_os = "linux")]
fn detect_os_version() -> Option<String> {
    let content = std::fs::read_to_string("/etc/os-release").ok()?;
    parse_os_release_version(&content)
}

#[cfg(not(target_os = "linux"))]
fn detect_os_version() -> Option<String> {
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_os_release_version(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("VERSION_ID=")?;
        let value = value.trim_matches('"').trim_matches('\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(target_os = "linux")]
fn detect_manufacturer() -> Option<String> {
    read_dmi_field("sys_vendor")
}

#[cfg(target_os = "linux")]
fn detect_model() -> Option<String> {
    read_dmi_field("product_name")
}

#[cfg(target_os = "linux")]
fn read_dmi_field(name: &str) -> Option<String> {
    let value = std::fs::read_to_string(format!("/sys/class/dmi/id/{name}")).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(not(target_os = "linux"))]
fn detect_manufacturer() -> Option<String> {
    None
}

#[cfg(not(target_os = "linux"))]
fn detect_model() -> Option<String> {
    None
}
