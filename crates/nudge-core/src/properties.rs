use std::borrow::Cow;
use std::collections::BTreeMap;

use nudge_platform::DeviceInfo;
use serde::{Deserialize, Serialize};

pub const KEY_APP_PACKAGE_NAME: &str = "appPackageName";
pub const KEY_APP_VERSION_CODE: &str = "appVersionCode";
pub const KEY_APP_VERSION_NAME: &str = "appVersionName";
pub const KEY_DEVICE_OS_NAME: &str = "deviceOsName";
pub const KEY_DEVICE_OS_VERSION: &str = "deviceOsVersion";
pub const KEY_DEVICE_LANGUAGE: &str = "deviceLanguage";
pub const KEY_DEVICE_MANUFACTURER: &str = "deviceManufacturer";
pub const KEY_DEVICE_MODEL: &str = "deviceModel";

/// Properties of the installed application and the device, captured once per
/// check. Descriptor filters refer to these by their serialized key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentProperties {
    pub app_package_name: String,
    pub app_version_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_os_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
}

impl CurrentProperties {
    pub fn new(app_package_name: impl Into<String>, app_version_code: i64) -> Self {
        Self {
            app_package_name: app_package_name.into(),
            app_version_code,
            app_version_name: None,
            device_os_name: None,
            device_os_version: None,
            device_language: None,
            device_manufacturer: None,
            device_model: None,
        }
    }

    #[must_use]
    pub fn with_version_name(mut self, version_name: impl Into<String>) -> Self {
        self.app_version_name = Some(version_name.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.device_language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_os(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.device_os_name = Some(name.into());
        self.device_os_version = version;
        self
    }

    /// Fills the device fields from a detected [`DeviceInfo`].
    #[must_use]
    pub fn with_device(mut self, device: &DeviceInfo) -> Self {
        self.device_os_name = Some(device.os_name.clone());
        self.device_os_version.clone_from(&device.os_version);
        self.device_language.clone_from(&device.language);
        self.device_manufacturer.clone_from(&device.manufacturer);
        self.device_model.clone_from(&device.model);
        self
    }

    /// Looks a property up by its serialized key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        let value = match key {
            KEY_APP_PACKAGE_NAME => return Some(Cow::Borrowed(self.app_package_name.as_str())),
            KEY_APP_VERSION_CODE => return Some(Cow::Owned(self.app_version_code.to_string())),
            KEY_APP_VERSION_NAME => &self.app_version_name,
            KEY_DEVICE_OS_NAME => &self.device_os_name,
            KEY_DEVICE_OS_VERSION => &self.device_os_version,
            KEY_DEVICE_LANGUAGE => &self.device_language,
            KEY_DEVICE_MANUFACTURER => &self.device_manufacturer,
            KEY_DEVICE_MODEL => &self.device_model,
            _ => return None,
        };
        value.as_deref().map(Cow::Borrowed)
    }

    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, String> {
        [
            KEY_APP_PACKAGE_NAME,
            KEY_APP_VERSION_CODE,
            KEY_APP_VERSION_NAME,
            KEY_DEVICE_OS_NAME,
            KEY_DEVICE_OS_VERSION,
            KEY_DEVICE_LANGUAGE,
            KEY_DEVICE_MANUFACTURER,
            KEY_DEVICE_MODEL,
        ]
        .into_iter()
        .filter_map(|key| self.get(key).map(|value| (key, value.into_owned())))
        .collect()
    }

    /// JSON body posted to the descriptor endpoint.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
