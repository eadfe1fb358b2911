use reqwest::Method;

use super::client::ApiClient;
use crate::error::CloudError;
use crate::models::StorageItem;

/// List the volumes on a storage location of a node.
pub async fn list_storage_content(
    api: &ApiClient,
    node: &str,
    storage: &str,
) -> Result<Vec<StorageItem>, CloudError> {
    api.query(
        Method::GET,
        &format!("nodes/{node}/storage/{storage}/content"),
        None,
    )
    .await
}
