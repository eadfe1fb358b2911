use reqwest::Method;
use serde_json::{Map, Value};

use super::client::ApiClient;
use crate::error::CloudError;
use crate::models::{Technology, VmResource, VmStatus};

/// Create a guest on a node. The parameter map is passed to the API
/// verbatim; it decides which settings apply to the chosen technology.
/// Returns the task handle of the asynchronous create.
pub async fn create_vm(
    api: &ApiClient,
    node: &str,
    technology: Technology,
    params: &Map<String, Value>,
) -> Result<Option<String>, CloudError> {
    api.query(
        Method::POST,
        &format!("nodes/{node}/{technology}"),
        Some(params),
    )
    .await
}

/// Clone an existing guest. Returns the task handle.
pub async fn clone_vm(
    api: &ApiClient,
    source: &VmResource,
    params: &Map<String, Value>,
) -> Result<Option<String>, CloudError> {
    api.query(
        Method::POST,
        &format!("{}/clone", source.endpoint()),
        Some(params),
    )
    .await
}

/// Fetch a guest's config as the raw key/value map the API reports.
pub async fn get_vm_config(
    api: &ApiClient,
    vm: &VmResource,
) -> Result<Map<String, Value>, CloudError> {
    api.query(Method::GET, &format!("{}/config", vm.endpoint()), None)
        .await
}

/// Apply config changes to a guest. The config PUT is synchronous and
/// carries no task handle.
pub async fn update_vm_config(
    api: &ApiClient,
    vm: &VmResource,
    params: &Map<String, Value>,
) -> Result<(), CloudError> {
    let _: Option<Value> = api
        .query(Method::PUT, &format!("{}/config", vm.endpoint()), Some(params))
        .await?;
    Ok(())
}

/// Delete a guest. Returns the task handle of the asynchronous delete.
pub async fn delete_vm(
    api: &ApiClient,
    vm: &VmResource,
    params: &Map<String, Value>,
) -> Result<Option<String>, CloudError> {
    let params = (!params.is_empty()).then_some(params);
    api.query(Method::DELETE, &vm.endpoint(), params).await
}

/// Request a status transition (`start`, `stop`, `shutdown`).
/// Returns the task handle.
pub async fn set_vm_status(
    api: &ApiClient,
    vm: &VmResource,
    action: &str,
    params: Option<&Map<String, Value>>,
) -> Result<Option<String>, CloudError> {
    api.query(
        Method::POST,
        &format!("{}/status/{action}", vm.endpoint()),
        params,
    )
    .await
}

/// Read a guest's current status.
pub async fn current_status(api: &ApiClient, vm: &VmResource) -> Result<VmStatus, CloudError> {
    api.query(Method::GET, &format!("{}/status/current", vm.endpoint()), None)
        .await
}
