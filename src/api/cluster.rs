use reqwest::Method;
use serde_json::{Map, Value};

use super::client::ApiClient;
use crate::error::CloudError;
use crate::models::VmResource;

/// List every guest of the cluster, across all nodes.
pub async fn list_vm_resources(api: &ApiClient) -> Result<Vec<VmResource>, CloudError> {
    let mut params = Map::new();
    params.insert("type".to_string(), Value::String("vm".to_string()));
    api.query(Method::GET, "cluster/resources", Some(&params))
        .await
}

/// Return the guest identified by name.
///
/// Guest names are not unique in Proxmox; the first occurrence wins.
pub async fn get_vm_by_name(api: &ApiClient, name: &str) -> Result<VmResource, CloudError> {
    let vms = list_vm_resources(api).await?;

    vms.into_iter()
        .find(|vm| vm.name == name)
        .ok_or_else(|| {
            CloudError::NotFound(format!(
                "The specified VM with name '{name}' could not be found."
            ))
        })
}

/// Return the guest identified by vmid.
pub async fn get_vm_by_id(api: &ApiClient, vmid: u64) -> Result<VmResource, CloudError> {
    let vms = list_vm_resources(api).await?;

    vms.into_iter().find(|vm| vm.vmid == vmid).ok_or_else(|| {
        CloudError::NotFound(format!(
            "The specified VM with vmid '{vmid}' could not be found."
        ))
    })
}
