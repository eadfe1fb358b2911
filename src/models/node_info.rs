use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entry of `GET /nodes`: one hypervisor node of the cluster.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NodeInfo {
    pub node: String,
    #[serde(default)]
    pub status: String,
    /// Everything else the API reports (cpu, mem, uptime, ...) passes
    /// through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeInfo {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_unknown_fields() {
        let raw = r#"{"node": "pve1", "status": "online", "uptime": 12345, "cpu": 0.02}"#;
        let info: NodeInfo = serde_json::from_str(raw).unwrap();
        assert!(info.is_online());
        assert_eq!(info.extra.get("uptime").and_then(Value::as_u64), Some(12345));
    }

    #[test]
    fn status_defaults_to_empty() {
        let info: NodeInfo = serde_json::from_str(r#"{"node": "pve2"}"#).unwrap();
        assert!(!info.is_online());
    }
}
