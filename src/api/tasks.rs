use std::time::Duration;

use reqwest::Method;
use tokio::time::{sleep, Instant};

use super::client::ApiClient;
use crate::error::CloudError;
use crate::models::{TaskStatus, Upid};

pub const TASK_TIMEOUT: Duration = Duration::from_secs(300);
pub const TASK_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Read the status of an asynchronous task.
pub async fn task_status(
    api: &ApiClient,
    node: &str,
    upid: &str,
) -> Result<TaskStatus, CloudError> {
    api.query(Method::GET, &format!("nodes/{node}/tasks/{upid}/status"), None)
        .await
}

/// Wait for a task to finish successfully.
///
/// The node owning the task is decoded from the UPID. The task endpoint
/// is polled on `interval` until the task reports a terminal state; a
/// terminal task whose exit status carries the failure marker is an
/// error, as is exceeding `timeout`.
pub async fn wait_for_task(
    api: &ApiClient,
    upid: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<TaskStatus, CloudError> {
    let decoded = Upid::parse(upid)?;
    let started = Instant::now();

    loop {
        if started.elapsed() >= timeout {
            return Err(CloudError::Timeout(format!(
                "Timeout to wait for task '{upid}' reached."
            )));
        }

        let status = task_status(api, &decoded.node, upid).await?;
        if status.is_terminal() {
            if status.is_failed() {
                return Err(CloudError::TaskFailed(
                    status.exitstatus.unwrap_or_default(),
                ));
            }
            tracing::debug!(upid, "Task finished");
            return Ok(status);
        }

        tracing::debug!(upid, status = %status.status, "Waiting for task");
        sleep(interval).await;
    }
}
