use std::fmt;

use crate::descriptor::{MessageEntry, UpdateEntry};
use crate::error::CheckError;
use crate::properties::CurrentProperties;

const UPDATE_RECORD_PREFIX: &str = "update:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    Store { package_name: String },
    Website { url: String },
}

/// A newer version the user should be offered, with text in the device
/// language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub target_version_code: Option<i64>,
    /// The user must not be able to dismiss the update and keep using the app.
    pub forced: bool,
    /// The installed build is retired; the app should exit after showing this.
    pub force_exit: bool,
    pub target: Option<UpdateTarget>,
    pub message: Option<String>,
    pub warnings: Option<String>,
    pub what_is_new: Option<String>,
}

impl Update {
    pub(crate) fn from_entry(entry: &UpdateEntry, properties: &CurrentProperties) -> Self {
        let text = entry.text_for(properties.device_language.as_deref());
        let target = if entry.target_store {
            Some(UpdateTarget::Store {
                package_name: entry
                    .target_package_name
                    .clone()
                    .unwrap_or_else(|| properties.app_package_name.clone()),
            })
        } else {
            entry
                .target_website_url
                .clone()
                .map(|url| UpdateTarget::Website { url })
        };

        Self {
            target_version_code: entry.target_version_code,
            forced: entry.force_update || entry.force_exit,
            force_exit: entry.force_exit,
            target,
            message: text.message,
            warnings: text.warnings,
            what_is_new: text.what_is_new,
        }
    }

    /// Display-record identifier for an update the user may dismiss. Forced
    /// updates and entries without a version code are never recorded.
    #[must_use]
    pub fn record_identifier(&self) -> Option<String> {
        if self.forced {
            return None;
        }
        self.target_version_code
            .map(|code| format!("{UPDATE_RECORD_PREFIX}{code}"))
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.force_exit {
            write!(f, "forced exit")?;
        } else if self.forced {
            write!(f, "forced update")?;
        } else {
            write!(f, "optional update")?;
        }
        if let Some(code) = self.target_version_code {
            write!(f, " to version code {code}")?;
        }
        match &self.target {
            Some(UpdateTarget::Store { package_name }) => write!(f, " via store ({package_name})"),
            Some(UpdateTarget::Website { url }) => write!(f, " via {url}"),
            None => Ok(()),
        }
    }
}

/// A server message to show once (or every time when `display_once` is off).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub display_once: bool,
    pub title: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub redirection_url: Option<String>,
}

impl Message {
    pub(crate) fn from_entry(entry: &MessageEntry, properties: &CurrentProperties) -> Self {
        let text = entry.text_for(properties.device_language.as_deref());
        Self {
            id: entry.id.clone(),
            display_once: entry.display_once,
            title: text.title,
            body: text.message,
            image_url: text.image_url,
            redirection_url: text.redirection_url,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message {}", self.id)?;
        if let Some(title) = &self.title {
            write!(f, " ({title})")?;
        }
        Ok(())
    }
}

/// Terminal result of one update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    UpdateFound(Update),
    MessageFound(Message),
    NoChange,
    Failed(CheckError),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateFound(update) => write!(f, "Update found: {update}"),
            Self::MessageFound(message) => write!(f, "Message found: {message}"),
            Self::NoChange => write!(f, "No update or message found"),
            Self::Failed(error) => write!(f, "Update check failed: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, Update, UpdateTarget};
    use crate::descriptor::parse_descriptor;
    use crate::properties::CurrentProperties;

    fn update_for(entry: serde_json::Value, properties: &CurrentProperties) -> Update {
        let body = serde_json::json!({
            "packageName": properties.app_package_name,
            "updates": [entry],
        })
        .to_string();
        let descriptor =
            parse_descriptor(&body, &properties.app_package_name).expect("descriptor is valid");
        Update::from_entry(&descriptor.updates[0], properties)
    }

    #[test]
    fn store_target_defaults_to_own_package() {
        let properties = CurrentProperties::new("com.example.app", 1);
        let update = update_for(
            serde_json::json!({ "targetVersionCode": 2, "targetGooglePlay": true }),
            &properties,
        );

        assert_eq!(
            update.target,
            Some(UpdateTarget::Store {
                package_name: "com.example.app".to_string()
            })
        );
    }

    #[test]
    fn forced_exit_is_always_forced_and_localized() {
        let properties = CurrentProperties::new("com.example.app", 1).with_language("tr-TR");
        let update = update_for(
            serde_json::json!({
                "forceExit": true,
                "languages": {
                    "en": { "message": "This version is retired" },
                    "tr": { "message": "Bu sürüm artık desteklenmiyor" },
                },
            }),
            &properties,
        );

        assert!(update.forced);
        assert!(update.force_exit);
        assert!(update.target.is_none());
        assert_eq!(
            update.message.as_deref(),
            Some("Bu sürüm artık desteklenmiyor")
        );
        assert_eq!(update.to_string(), "forced exit");
    }

    #[test]
    fn outcome_display_describes_update() {
        let properties = CurrentProperties::new("com.example.app", 1);
        let update = update_for(
            serde_json::json!({
                "targetVersionCode": 4,
                "targetWebsiteUrl": "https://example.com/download",
            }),
            &properties,
        );

        assert_eq!(
            Outcome::UpdateFound(update).to_string(),
            "Update found: optional update to version code 4 via https://example.com/download"
        );
    }
}
