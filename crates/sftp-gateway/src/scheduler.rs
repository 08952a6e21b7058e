//! Periodic cleanup trigger

use sftp_lifecycle::Reaper;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

/// Spawn a task that sweeps for expired servers every `interval`.
///
/// A failed sweep is logged and retried on the next tick.
pub fn start_sweep_task(reaper: Arc<Reaper>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting sweep task (interval: {:?})", interval);

        loop {
            match reaper.sweep().await {
                Ok(deleted) if deleted.is_empty() => {
                    debug!("Sweep completed, no expired servers");
                }
                Ok(deleted) => {
                    info!("Sweep deleted {} server(s): {:?}", deleted.len(), deleted);
                }
                Err(e) => {
                    error!("Sweep failed: {}", e);
                }
            }

            tokio::time::sleep(interval).await;
        }
    })
}

/// Wait for the sweep task to end, or forever when none was started.
///
/// A panic inside the task surfaces as the returned `JoinError`.
pub async fn join_sweep_task(task: Option<JoinHandle<()>>) -> Result<(), JoinError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sftp_lifecycle::{FixedClock, LifecycleConfig};
    use tempsftp_common::{expiry, ServiceError, Tag};
    use transfer_backend::{InMemoryTransfer, Operation};

    fn config() -> Arc<LifecycleConfig> {
        Arc::new(LifecycleConfig::new(
            "us-east-1".parse().unwrap(),
            "arn:aws:iam::123456789012:role/sftp-logging".parse().unwrap(),
            "arn:aws:iam::123456789012:role/sftp-user".parse().unwrap(),
            "customer-drop".parse().unwrap(),
        ))
    }

    /// Poll `condition` until it holds, failing the test after five seconds
    async fn wait_until<F, Fut>(condition: F)
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition().await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_sweep_task_survives_failures() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let transfer = Arc::new(InMemoryTransfer::new("us-east-1"));
        let expired = transfer
            .insert_server(vec![Tag::new(
                expiry::EXPIRATION_TAG,
                expiry::encode(now - chrono::TimeDelta::minutes(1)),
            )])
            .await;

        transfer
            .fail_on(
                Operation::ListServers,
                ServiceError::Api {
                    operation: "ListServers",
                    code: "ThrottlingException".to_string(),
                    message: "Rate exceeded".to_string(),
                },
            )
            .await;

        let reaper = Arc::new(
            Reaper::new(transfer.clone(), config()).with_clock(Arc::new(FixedClock::new(now))),
        );
        let handle = start_sweep_task(reaper, Duration::from_millis(10));

        let backend = &transfer;
        wait_until(move || async move { backend.call_count(Operation::ListServers).await >= 2 })
            .await;
        assert_eq!(transfer.server_ids().await, vec![expired.server_id.clone()]);

        transfer.clear_failures().await;
        wait_until(move || async move { backend.server_ids().await.is_empty() }).await;

        handle.abort();
    }

    #[tokio::test]
    async fn test_join_reports_panicking_task() {
        let task = tokio::spawn(async { panic!("sweep blew up") });

        let err = join_sweep_task(Some(task)).await.unwrap_err();
        assert!(err.is_panic());
    }

    #[tokio::test]
    async fn test_join_without_task_never_completes() {
        let result =
            tokio::time::timeout(Duration::from_millis(20), join_sweep_task(None)).await;
        assert!(result.is_err());
    }
}
