use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::VmResource;

/// Uniform guest summary in the shape orchestration tooling expects.
///
/// `image` and `size` are always empty: Proxmox neither records the image
/// a guest was provisioned from nor has a size catalog like EC2 types.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NodeView {
    pub id: String,
    pub image: String,
    pub size: String,
    pub state: String,
    pub private_ips: Vec<String>,
    pub public_ips: Vec<String>,
}

/// `NodeView` plus everything the API reported: the raw guest config and
/// the raw cluster resource entry.
#[derive(Serialize, Clone, Debug)]
pub struct NodeFullView {
    #[serde(flatten)]
    pub summary: NodeView,
    pub config: Map<String, Value>,
    pub resource: VmResource,
}
