use chrono::{DateTime, Utc};
use log::debug;

use crate::descriptor::VersionDescriptor;
use crate::error::CheckError;
use crate::outcome::{Message, Outcome, Update};
use crate::properties::CurrentProperties;
use crate::records::RecordStore;

/// Decides what a parsed descriptor means for this installation.
///
/// Updates win over messages. A matching forced-exit entry is reported
/// regardless of version codes; otherwise the best matching update entry is
/// reported when its target version code is above the installed one, unless it
/// is optional and already recorded as shown. Failing that, the first matching
/// message that is inside its display window and not yet recorded as shown
/// (unless it may repeat) is reported.
///
/// # Errors
/// Returns an error only when the display records cannot be read.
pub fn evaluate(
    descriptor: &VersionDescriptor,
    properties: &CurrentProperties,
    records: &dyn RecordStore,
    now: DateTime<Utc>,
) -> Result<Outcome, CheckError> {
    if let Some(entry) = descriptor.forced_exit(properties) {
        return Ok(Outcome::UpdateFound(Update::from_entry(entry, properties)));
    }

    if let Some(entry) = descriptor.best_update(properties)
        && entry
            .target_version_code
            .is_some_and(|code| code > properties.app_version_code)
    {
        let update = Update::from_entry(entry, properties);
        let suppressed = match update.record_identifier() {
            Some(identifier) => records.contains(&identifier)?,
            None => false,
        };
        if !suppressed {
            return Ok(Outcome::UpdateFound(update));
        }
        debug!(
            "Optional update to version code {} was already displayed",
            entry.target_version_code.unwrap_or_default()
        );
    }

    for entry in &descriptor.messages {
        if !entry.filters.matches(properties) {
            continue;
        }
        if !entry.is_displayable_at(now) {
            debug!("Message {} is outside its display window", entry.id);
            continue;
        }
        if entry.display_once && records.contains(&entry.id)? {
            debug!("Message {} was already displayed", entry.id);
            continue;
        }
        return Ok(Outcome::MessageFound(Message::from_entry(entry, properties)));
    }

    Ok(Outcome::NoChange)
}
