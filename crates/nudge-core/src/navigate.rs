use log::{error, info, warn};

use crate::config::CheckerConfig;
use crate::error::NavigationError;
use crate::outcome::{Message, Update, UpdateTarget};

/// Opens external URIs (store pages, web pages) on behalf of the user.
pub trait Navigator: Send + Sync {
    /// # Errors
    /// Returns an error when no handler accepts the URI.
    fn open(&self, uri: &str) -> Result<(), NavigationError>;
}

/// Hands URIs to the desktop's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
    fn open(&self, uri: &str) -> Result<(), NavigationError> {
        open::that(uri).map_err(|error| NavigationError::NoHandler {
            uri: uri.to_string(),
            details: error.to_string(),
        })
    }
}

/// Sends the user to wherever the update can be installed from and returns
/// the URI that was opened. Store targets fall back to the store's web page
/// when the store URI has no handler.
///
/// # Errors
/// Returns an error when the update has no target or nothing could be opened.
pub fn apply_update(
    navigator: &dyn Navigator,
    update: &Update,
    config: &CheckerConfig,
) -> Result<String, NavigationError> {
    let result = match &update.target {
        None => Err(NavigationError::MissingTarget),
        Some(UpdateTarget::Store { package_name }) => {
            open_store_page(navigator, package_name, config)
        }
        Some(UpdateTarget::Website { url }) => navigator.open(url).map(|()| url.clone()),
    };

    match &result {
        Ok(uri) => info!("Opened update target {uri}"),
        Err(error) => error!("Opening update target failed: {error}"),
    }
    result
}

/// Opens a message's redirection link, if it has one.
///
/// # Errors
/// Returns an error when the link could not be opened.
pub fn open_message_link(
    navigator: &dyn Navigator,
    message: &Message,
) -> Result<Option<String>, NavigationError> {
    let Some(url) = &message.redirection_url else {
        return Ok(None);
    };
    navigator.open(url).map(|()| Some(url.clone())).inspect_err(|error| {
        error!("Opening message link failed: {error}");
    })
}

fn open_store_page(
    navigator: &dyn Navigator,
    package_name: &str,
    config: &CheckerConfig,
) -> Result<String, NavigationError> {
    let store_uri = config.store_uri(package_name);
    match navigator.open(&store_uri) {
        Ok(()) => Ok(store_uri),
        Err(store_error) => {
            warn!("{store_error}; falling back to store web page");
            let web_url = config.store_web_url(package_name);
            navigator.open(&web_url).map(|()| web_url)
        }
    }
}
