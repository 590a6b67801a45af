//! Check status translation.
//!
//! Monitoring checks report a numeric exit status. Anything outside the four
//! conventional codes (for example 126/127 from a misconfigured command)
//! degrades to [`Severity::Unknown`].

use std::fmt;

/// Semantic severity of a check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    /// Map an arbitrary status code to a severity. Total: never fails.
    pub fn from_status(code: i64) -> Self {
        match code {
            0 => Severity::Ok,
            1 => Severity::Warning,
            2 => Severity::Critical,
            _ => Severity::Unknown,
        }
    }

    /// Upper-case label used in attachment titles.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Attachment sidebar color (hex `#rrggbb`).
    pub fn color(self) -> &'static str {
        match self {
            Severity::Ok => "#36a64f",
            Severity::Warning => "#FFCC00",
            Severity::Critical => "#FF0000",
            Severity::Unknown => "#6600CC",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Translate a status code into its `(label, color)` pair.
pub fn translate(code: i64) -> (&'static str, &'static str) {
    let severity = Severity::from_status(code);
    (severity.label(), severity.color())
}
