//! Template rendering for notices and custom payloads.
//!
//! Templates use Jinja2 syntax powered by minijinja. Rendering goes through
//! the [`TemplateRenderer`] trait so the formatter and payload builder never
//! depend on a specific engine; [`JinjaRenderer`] is the production one.
//!
//! Every template receives a [`TemplateContext`]:
//!
//! | key            | content                                        |
//! |----------------|------------------------------------------------|
//! | `event`        | the whole event document                       |
//! | `client`       | shorthand for `event.client`                   |
//! | `check`        | shorthand for `event.check`                    |
//! | `incident_key` | `client/check` (or dashboard link)             |
//! | `severity`     | `OK`, `WARNING`, `CRITICAL` or `UNKNOWN`       |
//! | `color`        | severity color                                 |
//! | `notice`       | formatted notice (payload templates only)      |
//! | `channel`      | target channel (payload templates only)        |

use crate::error::TemplateError;
use crate::event::Event;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Maximum size accepted for a template file (1MB).
const MAX_TEMPLATE_SIZE: u64 = 1024 * 1024;

/// Data made available to templates.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub event: Value,
    pub client: Value,
    pub check: Value,
    pub incident_key: String,
    pub severity: &'static str,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl TemplateContext {
    /// Build the context for an event.
    pub fn new(event: &Event, incident_key: impl Into<String>) -> Self {
        let value = event.to_value();
        let severity = event.severity();
        Self {
            client: value.get("client").cloned().unwrap_or(Value::Null),
            check: value.get("check").cloned().unwrap_or(Value::Null),
            event: value,
            incident_key: incident_key.into(),
            severity: severity.label(),
            color: severity.color(),
            notice: None,
            channel: None,
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// Renders template text against a context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, source: &str, context: &TemplateContext) -> Result<String, TemplateError>;
}

/// minijinja-backed renderer.
///
/// Undefined variables render as empty strings; syntax errors and unknown
/// filters fail the render.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        Self { env }
    }
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, source: &str, context: &TemplateContext) -> Result<String, TemplateError> {
        tracing::trace!(source_len = source.len(), "Rendering template");
        self.env
            .render_str(source, context)
            .map_err(|e| TemplateError::RenderFailed {
                message: e.to_string(),
            })
    }
}

impl std::fmt::Debug for JinjaRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaRenderer").finish()
    }
}

/// Read a template file as UTF-8.
///
/// Missing, unreadable, oversized and non-UTF-8 files are all template
/// errors: a configured template never silently degrades to the default.
pub fn load_template(path: &Path) -> Result<String, TemplateError> {
    let read_failed = |message: String| TemplateError::ReadFailed {
        path: path.display().to_string(),
        message,
    };

    let metadata = std::fs::metadata(path).map_err(|e| read_failed(e.to_string()))?;
    if metadata.len() > MAX_TEMPLATE_SIZE {
        return Err(read_failed(format!(
            "exceeds maximum size of 1MB ({} bytes)",
            metadata.len()
        )));
    }

    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            read_failed("must be valid UTF-8".to_string())
        } else {
            read_failed(e.to_string())
        }
    })
}

/// Check template syntax without rendering.
pub fn validate_template(source: &str) -> Result<(), String> {
    let mut env = Environment::new();
    env.add_template("_validate", source)
        .map_err(|e| e.to_string())?;
    Ok(())
}
