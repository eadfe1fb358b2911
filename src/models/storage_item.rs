use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entry of `GET /nodes/{node}/storage/{storage}/content`: one volume
/// stored on a storage location (disk image, container template, ISO, ...).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageItem {
    pub volid: String,
    pub content: String,
    #[serde(default)]
    pub size: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StorageItem {
    /// Whether the volume can be used to provision a guest.
    pub fn is_image(&self) -> bool {
        matches!(self.content.as_str(), "images" | "vztmpl" | "iso")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_image_content() {
        let raw = r#"{
            "volid": "local:vztmpl/ubuntu-22.04-standard_22.04-1_amd64.tar.zst",
            "content": "vztmpl",
            "size": 129824858
        }"#;
        let item: StorageItem = serde_json::from_str(raw).unwrap();
        assert!(item.is_image());
        assert_eq!(item.size, 129824858);
    }

    #[test]
    fn backups_are_not_images() {
        let raw = r#"{"volid": "local:backup/vzdump-lxc-100.tar.zst", "content": "backup"}"#;
        let item: StorageItem = serde_json::from_str(raw).unwrap();
        assert!(!item.is_image());
    }
}
