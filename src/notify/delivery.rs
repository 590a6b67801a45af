//! Webhook delivery with a bounded retry budget.
//!
//! One delivery is a small state machine:
//!
//! ```text
//! ATTEMPT --2xx--> SUCCESS
//!    |
//!    +--non-2xx / timeout / network error--> budget left? RETRY_WAIT -> ATTEMPT
//!                                                       : FATAL
//! ```
//!
//! The budget is the configured retry count: `webhook_retries: 3` allows at
//! most three attempts. Every attempt (send plus reading the response) runs
//! under its own deadline.

use super::payload::RequestBody;
use crate::config::{ProxyConfig, SecretString};
use crate::error::{ConfigError, DeliveryError};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Response bodies are cut to this many characters in error details.
const MAX_DETAIL_CHARS: usize = 200;

/// Retry budget and timing for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts.
    pub retries: u32,
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Pause between a failed attempt and the next one.
    pub retry_sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            timeout: Duration::from_secs(10),
            retry_sleep: Duration::from_secs(5),
        }
    }
}

/// A successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// HTTP status of the successful response.
    pub status: u16,
}

enum State {
    Attempt,
    RetryWait,
    Success(u16),
    Fatal(DeliveryError),
}

/// Build the HTTP client shared by every attempt of the invocation.
pub fn build_client(proxy: Option<&ProxyConfig>) -> Result<reqwest::Client, ConfigError> {
    let invalid_proxy = |e: reqwest::Error| ConfigError::InvalidSetting {
        key: "proxy_address".to_string(),
        message: e.to_string(),
    };

    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = proxy {
        let mut reqwest_proxy = reqwest::Proxy::all(&proxy.url).map_err(invalid_proxy)?;
        if let Some((user, password)) = &proxy.credentials {
            reqwest_proxy = reqwest_proxy.basic_auth(user, password.expose());
        }
        builder = builder.proxy(reqwest_proxy);
    }

    builder.build().map_err(|e| ConfigError::ValidationError(e.to_string()))
}

/// Posts request bodies to webhooks under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct DeliveryEngine {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl DeliveryEngine {
    pub fn new(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Deliver one body to one endpoint.
    ///
    /// # Errors
    /// [`DeliveryError::RetriesExhausted`] wrapping the last attempt's error
    /// once the budget is spent.
    pub async fn deliver(
        &self,
        body: &RequestBody,
        endpoint: &SecretString,
    ) -> Result<Delivery, DeliveryError> {
        let mut remaining = self.policy.retries.max(1);
        let mut attempts = 0;
        let mut state = State::Attempt;

        loop {
            state = match state {
                State::Attempt => {
                    attempts += 1;
                    match self.attempt(body, endpoint).await {
                        Ok(status) => State::Success(status),
                        Err(e) if e.is_retryable() => {
                            remaining -= 1;
                            if remaining > 0 {
                                tracing::warn!(
                                    attempt = attempts,
                                    remaining = remaining,
                                    error = %e,
                                    "Webhook attempt failed, retrying"
                                );
                                State::RetryWait
                            } else {
                                State::Fatal(DeliveryError::RetriesExhausted {
                                    attempts,
                                    last: Box::new(e),
                                })
                            }
                        }
                        Err(e) => State::Fatal(e),
                    }
                }
                State::RetryWait => {
                    tracing::debug!(
                        delay_ms = self.policy.retry_sleep.as_millis() as u64,
                        "Waiting before retry"
                    );
                    tokio::time::sleep(self.policy.retry_sleep).await;
                    State::Attempt
                }
                State::Success(status) => return Ok(Delivery { attempts, status }),
                State::Fatal(e) => return Err(e),
            }
        }
    }

    /// One POST, bounded by the per-attempt deadline.
    async fn attempt(&self, body: &RequestBody, endpoint: &SecretString) -> Result<u16, DeliveryError> {
        let request = self
            .client
            .post(endpoint.expose())
            .header(CONTENT_TYPE, "application/json")
            .body(body.as_str().to_owned());

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        match tokio::time::timeout(self.policy.timeout, exchange).await {
            Err(_) => Err(DeliveryError::Timeout(self.policy.timeout)),
            // The error message would otherwise carry the webhook URL.
            Ok(Err(e)) => Err(DeliveryError::Network(e.without_url().to_string())),
            Ok(Ok((status, _))) if status.is_success() => Ok(status.as_u16()),
            Ok(Ok((status, text))) => Err(DeliveryError::HttpStatus {
                status: status.as_u16(),
                detail: Some(truncate_detail(text.trim())),
            }),
        }
    }
}

fn truncate_detail(text: &str) -> String {
    if text.chars().count() <= MAX_DETAIL_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{}…", cut)
    }
}
