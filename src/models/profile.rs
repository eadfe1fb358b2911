use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::Technology;

/// A guest template definition from a profiles YAML file.
///
/// `create` and `clone` are opaque parameter maps passed to the API
/// verbatim; the API itself validates them. A profile carrying `clone`
/// provisions by cloning an existing guest, otherwise `create` is used.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct VmProfile {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub technology: Option<Technology>,
    #[serde(default)]
    pub create: Option<Map<String, Value>>,
    #[serde(default)]
    pub clone: Option<Map<String, Value>>,
    /// Handed back to the caller after a successful create; the guest
    /// bootstrap pipeline on the orchestration side consumes it.
    #[serde(default)]
    pub ssh_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_profile() {
        let raw = r#"
provider: my-proxmox
technology: lxc
create:
  vmid: 123
  node: pve1
  hostname: my-vm
  ostemplate: "local:vztmpl/ubuntu-22.04-standard_22.04-1_amd64.tar.zst"
"#;
        let profile: VmProfile = serde_yaml::from_str(raw).unwrap();
        assert_eq!(profile.technology, Some(Technology::Lxc));
        let create = profile.create.unwrap();
        assert_eq!(create.get("vmid").and_then(Value::as_u64), Some(123));
        assert_eq!(create.get("node").and_then(Value::as_str), Some("pve1"));
        assert!(profile.clone.is_none());
    }

    #[test]
    fn parses_clone_profile() {
        let raw = r#"
provider: my-proxmox
technology: qemu
clone:
  vmid: 9000
  newid: 456
  full: true
ssh_password: hunter2
"#;
        let profile: VmProfile = serde_yaml::from_str(raw).unwrap();
        let clone = profile.clone.unwrap();
        assert_eq!(clone.get("newid").and_then(Value::as_u64), Some(456));
        assert_eq!(profile.ssh_password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn technology_is_optional_at_parse_time() {
        let profile: VmProfile = serde_yaml::from_str("provider: p").unwrap();
        assert!(profile.technology.is_none());
    }
}
