//! Version descriptor documents served by the update endpoint.
//!
//! ```json
//! {
//!   "packageName": "com.example.app",
//!   "updates": [{
//!     "targetVersionCode": 5,
//!     "forceUpdate": true,
//!     "targetGooglePlay": true,
//!     "filters": { "deviceOsName": "android", "appVersionCode": "<5" },
//!     "languages": { "en": { "message": "A new version is available" } }
//!   }],
//!   "messages": [{
//!     "id": 12,
//!     "displayBeforeDate": "2026-12-31T00:00:00Z",
//!     "languages": { "en": { "title": "Maintenance", "message": "..." } }
//!   }]
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer};

use crate::error::CheckError;
use crate::filter::FilterSet;
use crate::properties::CurrentProperties;

const FALLBACK_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub package_name: String,
    #[serde(default)]
    pub updates: Vec<UpdateEntry>,
    #[serde(default)]
    pub messages: Vec<MessageEntry>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntry {
    #[serde(default)]
    pub target_version_code: Option<i64>,
    #[serde(default)]
    pub force_update: bool,
    #[serde(default)]
    pub force_exit: bool,
    #[serde(default, rename = "targetGooglePlay")]
    pub target_store: bool,
    #[serde(default)]
    pub target_package_name: Option<String>,
    #[serde(default)]
    pub target_website_url: Option<String>,
    #[serde(default)]
    pub languages: BTreeMap<String, UpdateText>,
    #[serde(default)]
    pub filters: FilterSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateText {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub warnings: Option<String>,
    #[serde(default)]
    pub what_is_new: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntry {
    #[serde(deserialize_with = "deserialize_scalar_id")]
    pub id: String,
    #[serde(default = "default_true")]
    pub display_once: bool,
    #[serde(default, rename = "displayAfterDate")]
    pub display_after: Option<DateTime<Utc>>,
    #[serde(default, rename = "displayBeforeDate")]
    pub display_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub languages: BTreeMap<String, MessageText>,
    #[serde(default)]
    pub filters: FilterSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageText {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub redirection_url: Option<String>,
}

fn default_true() -> bool {
    true
}

fn deserialize_scalar_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScalarId {
        Text(String),
        Number(i64),
    }

    Ok(match ScalarId::deserialize(deserializer)? {
        ScalarId::Text(text) => text,
        ScalarId::Number(number) => number.to_string(),
    })
}

impl UpdateEntry {
    fn validate(&self, index: usize) -> Result<(), CheckError> {
        if self.force_exit {
            return Ok(());
        }
        if self.target_version_code.is_none() {
            return Err(CheckError::parse(format!(
                "update entry {index} has no targetVersionCode"
            )));
        }
        if !self.target_store && self.target_website_url.is_none() {
            return Err(CheckError::parse(format!(
                "update entry {index} has neither targetGooglePlay nor targetWebsiteUrl"
            )));
        }
        if let Some(url) = &self.target_website_url {
            reqwest::Url::parse(url).map_err(|error| {
                CheckError::parse(format!(
                    "update entry {index} has invalid targetWebsiteUrl: {error}"
                ))
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn text_for(&self, language: Option<&str>) -> UpdateText {
        select_language(&self.languages, language)
            .cloned()
            .unwrap_or_default()
    }
}

impl MessageEntry {
    /// Whether `now` falls inside the optional display window.
    #[must_use]
    pub fn is_displayable_at(&self, now: DateTime<Utc>) -> bool {
        self.display_after.is_none_or(|after| now >= after)
            && self.display_before.is_none_or(|before| now < before)
    }

    #[must_use]
    pub fn text_for(&self, language: Option<&str>) -> MessageText {
        select_language(&self.languages, language)
            .cloned()
            .unwrap_or_default()
    }
}

impl VersionDescriptor {
    /// The update entry that applies to this installation: among entries whose
    /// filters match, the highest target version code, earliest entry on ties.
    /// Forced-exit entries are not candidates.
    #[must_use]
    pub fn best_update(&self, properties: &CurrentProperties) -> Option<&UpdateEntry> {
        let mut best: Option<(&UpdateEntry, i64)> = None;
        for entry in &self.updates {
            if entry.force_exit || !entry.filters.matches(properties) {
                continue;
            }
            let Some(code) = entry.target_version_code else {
                continue;
            };
            if best.is_none_or(|(_, best_code)| code > best_code) {
                best = Some((entry, code));
            }
        }
        best.map(|(entry, _)| entry)
    }

    #[must_use]
    pub fn forced_exit(&self, properties: &CurrentProperties) -> Option<&UpdateEntry> {
        self.updates
            .iter()
            .find(|entry| entry.force_exit && entry.filters.matches(properties))
    }
}

/// Decodes a descriptor and checks that it belongs to `package_name`.
///
/// # Errors
/// Returns [`CheckError::Parse`] for malformed documents and
/// [`CheckError::Validation`] when the package name is missing or differs.
pub fn parse_descriptor(body: &str, package_name: &str) -> Result<VersionDescriptor, CheckError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(CheckError::parse_from)?;
    if !value.is_object() {
        return Err(CheckError::parse("version descriptor must be a JSON object"));
    }

    let found = value
        .get("packageName")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);
    if found.as_deref() != Some(package_name) {
        return Err(CheckError::Validation {
            expected: package_name.to_string(),
            found,
        });
    }

    let descriptor: VersionDescriptor =
        serde_json::from_value(value).map_err(CheckError::parse_from)?;
    for (index, entry) in descriptor.updates.iter().enumerate() {
        entry.validate(index)?;
    }

    if let Some(remote_error) = &descriptor.error_message {
        warn!("Remote error: {remote_error}");
    }

    Ok(descriptor)
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn find_language<'a, T>(languages: &'a BTreeMap<String, T>, wanted: &str) -> Option<&'a T> {
    languages
        .iter()
        .find(|(tag, _)| normalize_tag(tag) == wanted)
        .map(|(_, text)| text)
}

/// Exact tag, then primary subtag, then English, then the first tag.
fn select_language<'a, T>(
    languages: &'a BTreeMap<String, T>,
    language: Option<&str>,
) -> Option<&'a T> {
    if let Some(language) = language {
        let wanted = normalize_tag(language);
        if let Some(text) = find_language(languages, &wanted) {
            return Some(text);
        }
        if let Some((primary, _)) = wanted.split_once('-')
            && let Some(text) = find_language(languages, primary)
        {
            return Some(text);
        }
    }

    find_language(languages, FALLBACK_LANGUAGE).or_else(|| languages.values().next())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::{parse_descriptor, select_language};
    use crate::error::CheckError;
    use crate::properties::CurrentProperties;

    const PACKAGE: &str = "com.example.app";

    fn descriptor_json(updates: serde_json::Value) -> String {
        serde_json::json!({ "packageName": PACKAGE, "updates": updates }).to_string()
    }

    #[test]
    fn parses_minimal_descriptor() {
        let descriptor =
            parse_descriptor(r#"{"packageName":"com.example.app"}"#, PACKAGE).expect("valid");

        assert!(descriptor.updates.is_empty());
        assert!(descriptor.messages.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        for body in ["", "{", "not json", "[1, 2]", "\"text\""] {
            let result = parse_descriptor(body, PACKAGE);
            assert!(
                matches!(result, Err(CheckError::Parse(_))),
                "{body:?} should fail to parse, got {result:?}"
            );
        }
    }

    #[test]
    fn package_mismatch_is_a_validation_error() {
        let result = parse_descriptor(r#"{"packageName":"com.other.app"}"#, PACKAGE);
        assert_eq!(
            result.expect_err("mismatch must be rejected"),
            CheckError::Validation {
                expected: PACKAGE.to_string(),
                found: Some("com.other.app".to_string()),
            }
        );

        let missing = parse_descriptor(r#"{"updates":[]}"#, PACKAGE);
        assert!(matches!(
            missing,
            Err(CheckError::Validation { found: None, .. })
        ));
    }

    #[test]
    fn schema_errors_never_produce_partial_descriptors() {
        let wrong_type = descriptor_json(serde_json::json!([{ "targetVersionCode": "five" }]));
        assert!(matches!(
            parse_descriptor(&wrong_type, PACKAGE),
            Err(CheckError::Parse(_))
        ));

        let no_target = descriptor_json(serde_json::json!([{ "targetVersionCode": 5 }]));
        assert!(matches!(
            parse_descriptor(&no_target, PACKAGE),
            Err(CheckError::Parse(message)) if message.contains("update entry 0")
        ));

        let bad_url = descriptor_json(serde_json::json!([{
            "targetVersionCode": 5,
            "targetWebsiteUrl": "not a url",
        }]));
        assert!(matches!(
            parse_descriptor(&bad_url, PACKAGE),
            Err(CheckError::Parse(_))
        ));
    }

    #[test]
    fn forced_exit_entries_need_no_target() {
        let body = descriptor_json(serde_json::json!([{ "forceExit": true }]));
        let descriptor = parse_descriptor(&body, PACKAGE).expect("forced exit is valid");

        let properties = CurrentProperties::new(PACKAGE, 1);
        assert!(descriptor.forced_exit(&properties).is_some());
        assert!(descriptor.best_update(&properties).is_none());
    }

    #[test]
    fn message_ids_accept_numbers_and_strings() {
        let body = serde_json::json!({
            "packageName": PACKAGE,
            "messages": [{ "id": 7 }, { "id": "welcome", "displayOnce": false }],
        })
        .to_string();
        let descriptor = parse_descriptor(&body, PACKAGE).expect("valid messages");

        assert_eq!(descriptor.messages[0].id, "7");
        assert!(descriptor.messages[0].display_once);
        assert_eq!(descriptor.messages[1].id, "welcome");
        assert!(!descriptor.messages[1].display_once);
    }

    #[test]
    fn best_update_prefers_highest_matching_code() {
        let body = descriptor_json(serde_json::json!([
            { "targetVersionCode": 9, "targetGooglePlay": true, "filters": { "deviceOsName": "ios" } },
            { "targetVersionCode": 6, "targetGooglePlay": true },
            { "targetVersionCode": 8, "targetGooglePlay": true, "forceUpdate": true },
            { "targetVersionCode": 8, "targetGooglePlay": true },
        ]));
        let descriptor = parse_descriptor(&body, PACKAGE).expect("valid");
        let properties = CurrentProperties::new(PACKAGE, 3).with_os("android", None);

        let best = descriptor.best_update(&properties).expect("an entry applies");
        assert_eq!(best.target_version_code, Some(8));
        assert!(best.force_update);
    }

    #[test]
    fn display_window_is_half_open() {
        let body = serde_json::json!({
            "packageName": PACKAGE,
            "messages": [{
                "id": 1,
                "displayAfterDate": "2026-01-01T00:00:00Z",
                "displayBeforeDate": "2026-02-01T00:00:00Z",
            }],
        })
        .to_string();
        let descriptor = parse_descriptor(&body, PACKAGE).expect("valid");
        let message = &descriptor.messages[0];

        let at = |month, day| {
            Utc.with_ymd_and_hms(2026, month, day, 0, 0, 0)
                .single()
                .expect("timestamp should be valid")
        };
        assert!(!message.is_displayable_at(at(1, 1) - TimeDelta::seconds(1)));
        assert!(message.is_displayable_at(at(1, 1)));
        assert!(message.is_displayable_at(at(1, 31)));
        assert!(!message.is_displayable_at(at(2, 1)));
    }

    #[test]
    fn invalid_display_date_is_a_parse_error() {
        let body = serde_json::json!({
            "packageName": PACKAGE,
            "messages": [{ "id": 1, "displayBeforeDate": "next tuesday" }],
        })
        .to_string();

        assert!(matches!(
            parse_descriptor(&body, PACKAGE),
            Err(CheckError::Parse(_))
        ));
    }

    #[test]
    fn language_selection_falls_back_in_order() {
        let languages = std::collections::BTreeMap::from([
            ("de".to_string(), "de"),
            ("en".to_string(), "en"),
            ("tr_TR".to_string(), "tr-TR"),
        ]);

        assert_eq!(select_language(&languages, Some("tr-TR")), Some(&"tr-TR"));
        assert_eq!(select_language(&languages, Some("de-AT")), Some(&"de"));
        assert_eq!(select_language(&languages, Some("fr")), Some(&"en"));
        assert_eq!(select_language(&languages, None), Some(&"en"));

        let no_english = std::collections::BTreeMap::from([
            ("fr".to_string(), "fr"),
            ("de".to_string(), "de"),
        ]);
        assert_eq!(select_language(&no_english, Some("tr")), Some(&"de"));
    }
}
