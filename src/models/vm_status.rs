use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET /nodes/{node}/{technology}/{vmid}/status/current`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VmStatus {
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_current_status() {
        let raw = r#"{"status": "running", "vmid": 100, "uptime": 42}"#;
        let status: VmStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.status, "running");
    }
}
