//! Notice formatting.
//!
//! The notice is the human-readable line posted to every channel:
//! `"<incident key>: <description>"`, optionally wrapped in `surround`.
//! The description comes from, in order:
//!
//! 1. `check.notification`, used verbatim;
//! 2. the configured message template, rendered against the event;
//! 3. the built-in description: output, client address and subscriptions
//!    joined with [`DESCRIPTION_DELIMITER`].

use crate::config::NoticeOptions;
use crate::error::TemplateError;
use crate::event::Event;
use crate::template::{TemplateContext, TemplateRenderer, load_template};
use std::fmt;

/// Separator used by the built-in description.
pub const DESCRIPTION_DELIMITER: &str = " : ";

/// A formatted notice. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    incident_key: String,
    text: String,
}

impl Notice {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn incident_key(&self) -> &str {
        &self.incident_key
    }

    /// The notice with `prefix` prepended, separated by a space.
    ///
    /// The prefix is only applied when both it and the notice are non-empty.
    pub fn with_prefix(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) if !prefix.is_empty() && !self.text.is_empty() => {
                format!("{} {}", prefix, self.text)
            }
            _ => self.text.clone(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `client/check`, or a Slack link to the dashboard when one is configured.
pub fn incident_key(event: &Event, dashboard: Option<&str>) -> String {
    let client = &event.client.name;
    let check = &event.check.name;
    match dashboard {
        Some(dashboard) if !dashboard.is_empty() => {
            format!("<{dashboard}{client}?check={check}|{client}/{check}>")
        }
        _ => format!("{client}/{check}"),
    }
}

/// Built-in description: `output : address : sub1,sub2`.
pub fn default_description(event: &Event) -> String {
    let subscriptions = event.client.subscriptions.join(",");
    [
        event.check.output.trim(),
        event.client_label(),
        subscriptions.as_str(),
    ]
    .join(DESCRIPTION_DELIMITER)
}

/// Build the notice for an event.
///
/// # Errors
/// A configured template that cannot be read or rendered is a
/// [`TemplateError`]; it never degrades to the built-in description.
pub fn format_notice(
    event: &Event,
    options: &NoticeOptions,
    renderer: &dyn TemplateRenderer,
) -> Result<Notice, TemplateError> {
    let key = incident_key(event, options.dashboard.as_deref());

    let description = match (&event.check.notification, &options.template) {
        (Some(notification), _) => notification.clone(),
        (None, Some(path)) => {
            let source = load_template(path)?;
            let context = TemplateContext::new(event, key.clone());
            renderer.render(&source, &context)?.trim().to_string()
        }
        (None, None) => default_description(event),
    };

    let mut text = format!("{}: {}", key, description);
    if let Some(surround) = options.surround.as_deref() {
        text = format!("{surround}{text}{surround}");
    }

    Ok(Notice {
        incident_key: key,
        text,
    })
}
