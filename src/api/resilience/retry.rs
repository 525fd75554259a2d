//! Retry policies with exponential backoff
//!
//! Provides retry logic for transient failures of SharePoint REST calls

use log::{debug, info, warn};
use rand::Rng;
use reqwest::{Response, StatusCode, header::RETRY_AFTER};
use std::future::Future;
use std::time::Duration;

use crate::api::constants::TRANSPORT_MAX_ATTEMPTS;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: TRANSPORT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Types of errors and their retry behavior
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Network-level errors (connection refused, DNS, reset)
    Network,
    /// HTTP 5xx server errors
    ServerError(u16),
    /// HTTP 429 Too Many Requests
    RateLimited,
    /// HTTP 408 or a client-side timeout
    Timeout,
    /// Non-retryable client errors (4xx except 408, 429)
    ClientError(u16),
    /// Anything else, including errors not raised by the transport
    Unknown,
}

impl RetryableError {
    pub fn should_retry(&self) -> bool {
        match self {
            RetryableError::Network => true,
            RetryableError::ServerError(_) => true,
            RetryableError::RateLimited => true,
            RetryableError::Timeout => true,
            RetryableError::ClientError(_) => false,
            RetryableError::Unknown => false,
        }
    }

    /// Classify an HTTP status code into retry behavior
    pub fn from_status_code(status: u16) -> Self {
        match status {
            408 => RetryableError::Timeout,
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    /// Classify a reqwest error
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() || error.is_request() {
            RetryableError::Network
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Unknown
        }
    }

    /// Classify any error coming out of the transport
    pub fn from_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<reqwest::Error>() {
            Some(error) => Self::from_reqwest_error(error),
            None => RetryableError::Unknown,
        }
    }
}

/// Retry policy that implements exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it yields a non-transient outcome or the budget is spent.
    ///
    /// The closure receives the 1-based attempt number. When the last attempt
    /// still fails, its response or error is returned unchanged.
    pub async fn execute<F, Fut>(&self, operation: F) -> anyhow::Result<Response>
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<Response>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Sending request (attempt {}/{})", attempt, max_attempts);
            let outcome = operation(attempt).await;

            let delay = match &outcome {
                Ok(response) => {
                    let classification = RetryableError::from_status_code(response.status().as_u16());
                    if !response.status().is_success() && classification.should_retry() {
                        warn!(
                            "Request returned {} on attempt {} (retryable)",
                            response.status(),
                            attempt
                        );
                        Some(self.retry_after(response).unwrap_or_else(|| self.calculate_delay(attempt)))
                    } else {
                        if attempt > 1 {
                            info!("Request completed after {} attempts", attempt);
                        }
                        None
                    }
                }
                Err(error) => {
                    if RetryableError::from_error(error).should_retry() {
                        warn!("Request failed on attempt {} (retryable): {}", attempt, error);
                        Some(self.calculate_delay(attempt))
                    } else {
                        warn!("Request failed permanently on attempt {}: {}", attempt, error);
                        None
                    }
                }
            };

            match delay {
                Some(delay) if attempt < max_attempts => {
                    debug!("Waiting {:?} before retry", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Some(_) => {
                    warn!("Giving up after {} attempts", attempt);
                    return outcome;
                }
                None => return outcome,
            }
        }
    }

    /// Honour a `Retry-After: <seconds>` hint on throttled responses
    fn retry_after(&self, response: &Response) -> Option<Duration> {
        if !matches!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            return None;
        }

        let seconds: u64 = response
            .headers()
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()?;

        Some(Duration::from_secs(seconds).min(self.config.max_delay))
    }

    /// Calculate exponential backoff delay with optional jitter
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let mut delay = Duration::from_millis(delay_ms as u64);

        if delay > self.config.max_delay {
            delay = self.config.max_delay;
        }

        // Spread retries of concurrent callers
        if self.config.jitter {
            let jitter_factor = rand::rng().random_range(0.5..=1.5);
            let jittered_ms = (delay.as_millis() as f64 * jitter_factor) as u64;
            delay = Duration::from_millis(jittered_ms);
        }

        delay
    }
}
