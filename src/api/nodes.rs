use reqwest::Method;

use super::client::ApiClient;
use crate::error::CloudError;
use crate::models::NodeInfo;

/// List the hypervisor nodes of the cluster.
pub async fn list_nodes(api: &ApiClient) -> Result<Vec<NodeInfo>, CloudError> {
    api.query(Method::GET, "nodes", None).await
}
