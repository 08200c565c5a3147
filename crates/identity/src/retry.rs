//! Store call policy: deadline plus a single retry for transient faults.

use std::future::Future;
use std::time::Duration;

use crumble_store::StoreError;
use tokio::time::timeout;

/// Default deadline for client-facing store calls.
pub(crate) const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a store operation under `deadline`, retrying once on a transient
/// fault (timeout or backend error). Business errors like
/// `DuplicateUsername` are never retried.
pub(crate) async fn store_call<T, F, Fut>(deadline: Duration, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match attempt(deadline, op()).await {
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "store call failed, retrying once");
            attempt(deadline, op()).await
        }
        other => other,
    }
}

async fn attempt<T, Fut>(deadline: Duration, fut: Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    timeout(deadline, fut).await.map_err(|_| StoreError::Timeout)?
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn transient_failures_retry_once() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = store_call(Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(StoreError::Backend("flaky".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn business_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = store_call(Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::DuplicateUsername) }
        })
        .await;

        assert!(matches!(result.unwrap_err(), StoreError::DuplicateUsername));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deadline_maps_to_timeout() {
        let result: Result<(), _> = store_call(Duration::from_millis(10), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result.unwrap_err(), StoreError::Timeout));
    }
}
