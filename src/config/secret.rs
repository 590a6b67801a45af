//! Secret string wrapper that never appears in logs.

/// Wrapper for webhook URLs and proxy passwords.
///
/// `Debug` and `Display` always print `[REDACTED]`. Slack webhook URLs embed
/// their credential in the path, so even the URL must stay out of logs; use
/// [`SecretString::endpoint_hint`] when a log line needs to say where a
/// request went.
///
/// # Example
///
/// ```
/// use slack_handler::config::SecretString;
///
/// let secret = SecretString::new("https://hooks.slack.com/services/T0/B0/xyz".to_string());
/// assert_eq!(format!("{:?}", secret), "[REDACTED]");
/// assert_eq!(secret.endpoint_hint(), "https://hooks.slack.com/…");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: String) -> Self {
        SecretString(s)
    }

    /// Exposes the underlying value. Never pass the result to a log macro.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Scheme and host of a URL secret, safe to log.
    pub fn endpoint_hint(&self) -> String {
        match reqwest::Url::parse(&self.0) {
            Ok(url) => match url.host_str() {
                Some(host) => format!("{}://{}/…", url.scheme(), host),
                None => "[REDACTED]".to_string(),
            },
            Err(_) => "[REDACTED]".to_string(),
        }
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}
