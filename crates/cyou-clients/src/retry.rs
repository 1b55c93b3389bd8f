//! Bounded retry for transport-level failures.

use std::time::Duration;

use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Execute `operation` with exponential backoff on retryable errors.
pub(crate) async fn with_retry<F, Fut, T>(
    service: &str,
    max_retries: u32,
    operation: F,
) -> ClientResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ClientResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = Duration::from_millis(250 * 2u64.pow(attempt));
                warn!(
                    "{} request failed (attempt {}), retrying in {:?}: {}",
                    service,
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or(ClientError::RequestFailed("unknown error".to_string())))
}
