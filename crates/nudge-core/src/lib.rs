//! Remote version checks for applications.
//!
//! A check fetches a version descriptor from a configured endpoint, validates
//! that it belongs to the running application, and reduces it to a single
//! [`Outcome`]:
//! - a newer version is available (optionally forced, or retiring the
//!   installed build),
//! - a server message should be shown,
//! - nothing changed,
//! - the check failed.
//!
//! Presentation is left to the host. Messages the host has shown are recorded
//! through a [`RecordStore`] so display-once messages are not surfaced again.

mod checker;
mod config;
mod descriptor;
mod error;
mod evaluate;
mod filter;
mod navigate;
mod outcome;
mod properties;
mod records;
mod transport;
mod version;

/// Check orchestration and in-flight tracking.
pub use checker::UpdateChecker;
/// Endpoint and navigation configuration.
pub use config::CheckerConfig;
/// Descriptor document model and parser.
pub use descriptor::{
    MessageEntry, MessageText, UpdateEntry, UpdateText, VersionDescriptor, parse_descriptor,
};
pub use error::{CheckError, NavigationError, NetworkStage, RecordStoreError};
pub use evaluate::evaluate;
pub use filter::{Comparison, FilterSet, Pattern};
/// External URI handling for update targets and message links.
pub use navigate::{Navigator, SystemNavigator, apply_update, open_message_link};
pub use outcome::{Message, Outcome, Update, UpdateTarget};
pub use properties::{
    CurrentProperties, KEY_APP_PACKAGE_NAME, KEY_APP_VERSION_CODE, KEY_APP_VERSION_NAME,
    KEY_DEVICE_LANGUAGE, KEY_DEVICE_MANUFACTURER, KEY_DEVICE_MODEL, KEY_DEVICE_OS_NAME,
    KEY_DEVICE_OS_VERSION,
};
/// Display-record persistence.
pub use records::{DisplayRecord, JsonFileRecordStore, MemoryRecordStore, RecordStore};
pub use transport::{
    DescriptorRequest, EXPECTED_CONTENT_TYPE, HttpMethod, ReqwestTransport, Transport,
};
pub use version::compare_version_names;
