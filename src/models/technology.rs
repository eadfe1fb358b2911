use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CloudError;

/// Guest virtualization technology. Proxmox exposes QEMU virtual machines
/// and LXC containers under different endpoint families but with the same
/// operation set.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Qemu,
    Lxc,
}

impl Technology {
    /// Path segment used by the API for this guest family.
    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Qemu => "qemu",
            Technology::Lxc => "lxc",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technology {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qemu" => Ok(Technology::Qemu),
            "lxc" => Ok(Technology::Lxc),
            other => Err(CloudError::InvalidValue(format!(
                "'{other}' is not a supported technology (expected 'qemu' or 'lxc')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_families() {
        assert_eq!("qemu".parse::<Technology>().unwrap(), Technology::Qemu);
        assert_eq!(" LXC ".parse::<Technology>().unwrap(), Technology::Lxc);
    }

    #[test]
    fn rejects_unknown_family() {
        assert!("openvz".parse::<Technology>().is_err());
    }

    #[test]
    fn deserializes_from_listing_payload() {
        let t: Technology = serde_json::from_str("\"lxc\"").unwrap();
        assert_eq!(t, Technology::Lxc);
    }
}
