use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET /nodes/{node}/tasks/{upid}/status`.
///
/// Proxmox reports `status: "running"` while the task executes and
/// `status: "stopped"` once it reached a terminal state; only then is
/// `exitstatus` populated.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TaskStatus {
    pub status: String,
    #[serde(default)]
    pub exitstatus: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        self.status == "stopped"
    }

    /// A terminal task counts as failed when its exit status carries the
    /// failure marker; everything else is left to the caller.
    pub fn is_failed(&self) -> bool {
        self.exitstatus
            .as_deref()
            .map(|exit| exit.contains("failed"))
            .unwrap_or(false)
    }
}
