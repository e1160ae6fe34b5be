use std::fmt::Write as _;

use nudge_core::{Message, Outcome, Update};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILED: u8 = 1;
/// The host must not continue: a forced update or a retired build.
pub const EXIT_BLOCKED: u8 = 2;

#[must_use]
pub fn exit_status(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::UpdateFound(update) if update.forced => EXIT_BLOCKED,
        Outcome::Failed(_) => EXIT_FAILED,
        _ => EXIT_OK,
    }
}

/// Terminal rendition of an outcome.
#[must_use]
pub fn render(outcome: &Outcome) -> String {
    match outcome {
        Outcome::UpdateFound(update) => render_update(update),
        Outcome::MessageFound(message) => render_message(message),
        Outcome::NoChange => "You are using the latest version.\n".to_string(),
        Outcome::Failed(error) => format!("Update check failed: {error}\n"),
    }
}

fn render_update(update: &Update) -> String {
    let mut out = String::new();
    let heading = if update.force_exit {
        "This version is no longer supported."
    } else if update.forced {
        "A required update is available."
    } else {
        "An update is available."
    };
    let _ = writeln!(out, "{heading}");
    for text in [&update.message, &update.warnings].into_iter().flatten() {
        let _ = writeln!(out, "{text}");
    }
    if let Some(what_is_new) = &update.what_is_new {
        let _ = writeln!(out, "What's new:\n{what_is_new}");
    }
    if !update.force_exit {
        let _ = writeln!(out, "Run `nudge apply` to install it.");
    }
    out
}

fn render_message(message: &Message) -> String {
    let mut out = String::new();
    if let Some(title) = &message.title {
        let _ = writeln!(out, "{title}");
    }
    if let Some(body) = &message.body {
        let _ = writeln!(out, "{body}");
    }
    if let Some(image_url) = &message.image_url {
        let _ = writeln!(out, "Image: {image_url}");
    }
    if let Some(url) = &message.redirection_url {
        let _ = writeln!(out, "More: {url}");
    }
    if out.is_empty() {
        let _ = writeln!(out, "Message {}", message.id);
    }
    out
}
