//! HTTP transport with bounded retry.
//!
//! Wraps a blocking reqwest client. Connect/timeout failures and a fixed set
//! of HTTP statuses are retried with a backoff delay between attempts; any
//! other status fails immediately with the status embedded.

use super::provider::{DataError, Transport};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay policy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^(retry - 1)`: base, 2*base, 4*base, ...
    Exponential { base: Duration },
    /// The same delay before every retry.
    Fixed(Duration),
}

impl Backoff {
    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Exponential { base } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                base.saturating_mul(factor)
            }
            Backoff::Fixed(delay) => delay,
        }
    }
}

/// Bounded retry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub retry_statuses: Vec<u16>,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_statuses: vec![429, 500, 502, 503, 504],
            backoff: Backoff::Exponential {
                base: Duration::from_millis(500),
            },
        }
    }
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("econlab/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    /// Transient failure; the reason is kept for the final error.
    Retry(String),
    /// Permanent failure; returned without further attempts.
    Fail(DataError),
}

/// Drive `attempt` under `policy`, calling `sleep` between attempts.
///
/// Split out from [`HttpTransport`] so the retry schedule can be exercised
/// without a network.
pub fn retry_with<T>(
    policy: &RetryPolicy,
    url: &str,
    mut attempt: impl FnMut() -> Attempt<T>,
    mut sleep: impl FnMut(Duration),
) -> Result<T, DataError> {
    let mut last_reason = String::from("no attempt made");

    for n in 0..policy.max_attempts() {
        if n > 0 {
            let delay = policy.backoff.delay(n);
            debug!(url, retry = n, delay_ms = delay.as_millis() as u64, "backing off");
            sleep(delay);
        }

        match attempt() {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fail(err) => return Err(err),
            Attempt::Retry(reason) => {
                warn!(url, attempt = n + 1, %reason, "transient failure");
                last_reason = reason;
            }
        }
    }

    Err(DataError::Transport {
        url: url.to_string(),
        attempts: policy.max_attempts(),
        reason: last_reason,
    })
}

/// Blocking HTTP client with retry, passed explicitly to the fetcher.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| DataError::Transport {
                url: String::new(),
                attempts: 0,
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            retry: config.retry,
        })
    }

    fn attempt(&self, url: &str, query: &[(String, String)]) -> Attempt<Value> {
        let resp = match self.client.get(url).query(query).send() {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                return Attempt::Retry(e.to_string());
            }
            Err(e) => {
                return Attempt::Fail(DataError::Transport {
                    url: url.to_string(),
                    attempts: 1,
                    reason: e.to_string(),
                });
            }
        };

        let status = resp.status();
        if !status.is_success() {
            if self.retry.is_retryable_status(status.as_u16()) {
                return Attempt::Retry(format!("HTTP {status}"));
            }
            return Attempt::Fail(DataError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        match resp.json::<Value>() {
            Ok(value) => Attempt::Done(value),
            Err(e) if e.is_timeout() => Attempt::Retry(e.to_string()),
            Err(e) => Attempt::Fail(DataError::Schema(format!(
                "response from {url} is not valid JSON: {e}"
            ))),
        }
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, DataError> {
        debug!(url, ?query, "GET");
        retry_with(&self.retry, url, || self.attempt(url, query), std::thread::sleep)
    }
}
