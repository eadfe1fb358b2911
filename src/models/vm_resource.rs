use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::Technology;

/// Entry of `GET /cluster/resources?type=vm`: one guest as the cluster
/// sees it, regardless of which node it lives on.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VmResource {
    pub vmid: u64,
    #[serde(default)]
    pub name: String,
    pub node: String,
    #[serde(rename = "type")]
    pub technology: Technology,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VmResource {
    /// Base endpoint for operations on this guest,
    /// e.g. `nodes/pve1/qemu/100`.
    pub fn endpoint(&self) -> String {
        format!("nodes/{}/{}/{}", self.node, self.technology, self.vmid)
    }
}
