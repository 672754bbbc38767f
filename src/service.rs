//! External service plumbing
//!
//! Shared HTTP client construction and the retry policy applied to every call
//! made to the OCR, language and geocoding services.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::config::ServiceSettings;
use crate::error::ServiceError;

/// Build an HTTP client with the configured request timeout
pub fn http_client(settings: &ServiceSettings) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|source| ServiceError::Http {
            service: "http client",
            source,
        })
}

/// Exponential backoff for transient failures
pub fn backoff(settings: &ServiceSettings) -> ExponentialBuilder {
    let min_delay = Duration::from_millis(settings.retry_min_delay_ms);
    ExponentialBuilder::default()
        .with_min_delay(min_delay)
        .with_max_delay(min_delay * 16)
        .with_max_times(settings.max_retries as usize)
        .with_jitter()
}

/// Run `attempt`, retrying while it fails with a transient error
pub async fn with_retry<T, F, Fut>(
    service: &'static str,
    policy: ExponentialBuilder,
    attempt: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    attempt
        .retry(policy)
        .when(ServiceError::is_transient)
        .notify(|err: &ServiceError, delay: Duration| {
            warn!("{} call failed, retrying in {:?}: {}", service, delay, err);
        })
        .await
}

/// Turn a non-success HTTP response into `ServiceError::Status`
pub async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        message,
    })
}
