use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::errors::RecapError;

/// Runs `operation`, retrying exactly once when the first attempt fails with a
/// transport-level error. Errors the remote end answered with are returned
/// as-is.
pub async fn with_transient_retry<F, Fut, T>(operation: F) -> Result<T, RecapError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RecapError>>,
{
    let strategy = ExponentialBackoff::from_millis(250).map(jitter).take(1);

    RetryIf::spawn(strategy, operation, RecapError::is_transient).await
}

/// Bounds a single remote call by `limit`.
pub async fn with_timeout<Fut, T>(limit: Duration, what: &str, call: Fut) -> Result<T, RecapError>
where
    Fut: Future<Output = Result<T, RecapError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RecapError::Timeout(format!(
            "{what} did not finish within {}s",
            limit.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_transient_errors_retried_once() {
        let attempts = AtomicUsize::new(0);
        let counter = &attempts;
        let result: Result<(), RecapError> = with_transient_retry(|| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RecapError::HttpError("connection reset".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_answered_errors_not_retried() {
        let attempts = AtomicUsize::new(0);
        let counter = &attempts;
        let result: Result<(), RecapError> = with_transient_retry(|| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RecapError::ProviderError("429 rate limited".to_string()))
        })
        .await;

        assert!(matches!(result, Err(RecapError::ProviderError(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_attempt_can_succeed() {
        let attempts = AtomicUsize::new(0);
        let counter = &attempts;
        let result = with_transient_retry(|| async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RecapError::Timeout("slow".to_string()))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_timeout_reported() {
        let result: Result<(), RecapError> = with_timeout(
            Duration::from_millis(10),
            "history fetch",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        match result {
            Err(RecapError::Timeout(msg)) => assert!(msg.contains("history fetch")),
            other => panic!("Expected Timeout, got: {other:?}"),
        }
    }
}
