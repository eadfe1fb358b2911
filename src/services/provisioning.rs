use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::{sleep, Instant};

use crate::api::{self, ApiClient};
use crate::error::CloudError;
use crate::models::{
    ActionResult, NodeFullView, NodeInfo, NodeView, StorageItem, VmProfile, VmResource,
};
use crate::utils::parse_ips;

/// Result of a successful `create`: the freshly provisioned guest plus
/// the credentials the caller's bootstrap pipeline expects.
#[derive(Serialize, Clone, Debug)]
pub struct CreateOutcome {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_password: Option<String>,
    #[serde(flatten)]
    pub instance: NodeFullView,
}

/// All provisioning operations against one Proxmox endpoint.
///
/// The wait parameters exist so tests can poll a fake API without
/// real-world delays.
pub struct Driver {
    api: ApiClient,
    task_timeout: Duration,
    poll_interval: Duration,
    start_retries: u32,
    start_retry_delay: Duration,
}

impl Driver {
    pub fn new(api: ApiClient) -> Self {
        Driver {
            api,
            task_timeout: api::TASK_TIMEOUT,
            poll_interval: api::TASK_POLL_INTERVAL,
            start_retries: 5,
            start_retry_delay: Duration::from_secs(5),
        }
    }

    pub fn with_wait_params(
        mut self,
        task_timeout: Duration,
        poll_interval: Duration,
        start_retry_delay: Duration,
    ) -> Self {
        self.task_timeout = task_timeout;
        self.poll_interval = poll_interval;
        self.start_retry_delay = start_retry_delay;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Provision a single guest from a profile and start it.
    ///
    /// A profile with `clone` options clones the referenced guest;
    /// otherwise the `create` parameters are posted to the technology
    /// endpoint of the target node. Either way the guest is then started
    /// and its full details returned.
    pub async fn create(
        &self,
        name: &str,
        profile_name: &str,
        profile: &VmProfile,
    ) -> Result<CreateOutcome, CloudError> {
        tracing::info!(name, profile = profile_name, "Starting create");

        let technology = profile.technology.ok_or_else(|| {
            CloudError::Config(format!(
                "The VM profile '{profile_name}' is missing the 'technology' parameter."
            ))
        })?;

        if let Some(clone_params) = &profile.clone {
            self.clone_vm(clone_params.clone()).await?;
        } else {
            let create_params = profile.create.clone().ok_or_else(|| {
                CloudError::Config(format!(
                    "The VM profile '{profile_name}' has neither 'create' nor 'clone' options."
                ))
            })?;
            let node = create_params
                .get("node")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    CloudError::Config(format!(
                        "The VM profile '{profile_name}' is missing the 'node' create parameter."
                    ))
                })?;

            let upid =
                api::vms::create_vm(&self.api, &node, technology, &create_params).await?;
            self.wait_on(upid).await?;
        }

        // Proxmox can take a moment to propagate the new guest into the
        // cluster listing; keep trying to start it until it shows up.
        let mut started = false;
        for _ in 0..self.start_retries {
            match self.start(name, None).await {
                Ok(_) => {
                    started = true;
                    break;
                }
                Err(CloudError::NotFound(_)) => {
                    tracing::warn!(
                        name,
                        "Newly created VM is not yet listed via the API. Retrying in {} seconds...",
                        self.start_retry_delay.as_secs()
                    );
                    sleep(self.start_retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
        if !started {
            return Err(CloudError::Timeout(format!(
                "Failed to start the VM '{name}' after {} attempts.",
                self.start_retries
            )));
        }

        let instance = self.show_instance(name).await?;
        tracing::info!(name, "Created instance");

        Ok(CreateOutcome {
            name: name.to_string(),
            ssh_password: profile.ssh_password.clone(),
            instance,
        })
    }

    /// Clone a guest. The parameter map must carry the source `vmid`;
    /// everything else is passed to the API verbatim.
    pub async fn clone_vm(&self, params: Map<String, Value>) -> Result<(), CloudError> {
        let vmid = param_as_vmid(params.get("vmid")).ok_or_else(|| {
            CloudError::Config("The required parameter 'vmid' was not given.".to_string())
        })?;

        let vm = api::get_vm_by_id(&self.api, vmid).await?;
        let upid = api::vms::clone_vm(&self.api, &vm, &params).await?;
        self.wait_on(upid).await?;
        Ok(())
    }

    /// Apply config changes to a guest identified by name.
    pub async fn reconfigure(
        &self,
        name: &str,
        params: Map<String, Value>,
    ) -> Result<ActionResult, CloudError> {
        let vm = api::get_vm_by_name(&self.api, name).await?;
        api::vms::update_vm_config(&self.api, &vm, &params).await?;

        Ok(ActionResult::new("reconfigure", None))
    }

    /// Destroy a guest by name. The delete itself is asynchronous on the
    /// Proxmox side; its task is deliberately not awaited.
    pub async fn destroy(
        &self,
        name: &str,
        params: Map<String, Value>,
    ) -> Result<(), CloudError> {
        tracing::info!(name, "Destroying instance");

        let vm = api::get_vm_by_name(&self.api, name).await?;
        api::vms::delete_vm(&self.api, &vm, &params).await?;

        tracing::info!(name, "Destroyed instance");
        Ok(())
    }

    pub async fn start(
        &self,
        name: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<ActionResult, CloudError> {
        self.set_vm_status(name, "start", params).await?;
        self.wait_for_vm_status(name, "running").await?;

        Ok(ActionResult::new("start", Some("running")))
    }

    pub async fn stop(
        &self,
        name: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<ActionResult, CloudError> {
        self.set_vm_status(name, "stop", params).await?;
        self.wait_for_vm_status(name, "stopped").await?;

        Ok(ActionResult::new("stop", Some("stopped")))
    }

    pub async fn shutdown(
        &self,
        name: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<ActionResult, CloudError> {
        self.set_vm_status(name, "shutdown", params).await?;
        self.wait_for_vm_status(name, "stopped").await?;

        Ok(ActionResult::new("shutdown", Some("stopped")))
    }

    /// Available datacenter locations: the online nodes of the cluster.
    pub async fn avail_locations(&self) -> Result<HashMap<String, NodeInfo>, CloudError> {
        let mut locations = HashMap::new();

        for node in api::list_nodes(&self.api).await? {
            if node.is_online() {
                locations.insert(node.node.clone(), node);
            } else {
                tracing::warn!(
                    "Ignoring Proxmox node '{}' because it is not online.",
                    node.node
                );
            }
        }

        Ok(locations)
    }

    /// Available images per location: provisioning-capable volumes on the
    /// given storage (default `local`) of every online node.
    pub async fn avail_images(
        &self,
        storage: Option<&str>,
    ) -> Result<HashMap<String, HashMap<String, StorageItem>>, CloudError> {
        let storage = storage.unwrap_or(crate::config::DEFAULT_STORAGE);
        let mut images = HashMap::new();

        for location in self.avail_locations().await?.into_keys() {
            let mut volumes = HashMap::new();
            for item in api::list_storage_content(&self.api, &location, storage).await? {
                if item.is_image() {
                    volumes.insert(item.volid.clone(), item);
                }
            }
            images.insert(location, volumes);
        }

        Ok(images)
    }

    /// Proxmox has no size catalog the way public clouds do; the listing
    /// is always empty.
    pub fn avail_sizes(&self) -> HashMap<String, Value> {
        tracing::warn!("Proxmox does not have a notion of predefined instance sizes.");
        HashMap::new()
    }

    /// Guests in the uniform summary shape, keyed by name.
    pub async fn list_nodes(&self) -> Result<HashMap<String, NodeView>, CloudError> {
        let full = self.list_nodes_full().await?;

        Ok(full
            .into_iter()
            .map(|(name, view)| (name, view.summary))
            .collect())
    }

    /// Guests with full configuration details, keyed by name.
    pub async fn list_nodes_full(&self) -> Result<HashMap<String, NodeFullView>, CloudError> {
        let vms = api::list_vm_resources(&self.api).await?;
        let configs = join_all(
            vms.iter()
                .map(|vm| api::vms::get_vm_config(&self.api, vm)),
        )
        .await;

        let mut nodes = HashMap::new();
        for (vm, config) in vms.into_iter().zip(configs) {
            let config = config?;
            let (private_ips, public_ips) = parse_ips(&config, vm.technology);

            nodes.insert(
                vm.name.clone(),
                NodeFullView {
                    summary: NodeView {
                        id: vm.vmid.to_string(),
                        // Proxmox does not carry image information
                        image: String::new(),
                        // Proxmox has no VM sizes like AWS (e.g. t2-small)
                        size: String::new(),
                        state: vm.status.clone(),
                        private_ips,
                        public_ips,
                    },
                    config,
                    resource: vm,
                },
            );
        }

        Ok(nodes)
    }

    /// Guests with only the requested fields of the full view.
    pub async fn list_nodes_select(
        &self,
        fields: &[String],
    ) -> Result<HashMap<String, Value>, CloudError> {
        let full = self.list_nodes_full().await?;

        let mut nodes = HashMap::new();
        for (name, view) in full {
            let value = serde_json::to_value(&view)
                .map_err(|e| CloudError::InvalidValue(e.to_string()))?;
            let Value::Object(object) = value else {
                continue;
            };
            let selected: Map<String, Value> = object
                .into_iter()
                .filter(|(key, _)| fields.iter().any(|field| field == key))
                .collect();
            nodes.insert(name, Value::Object(selected));
        }

        Ok(nodes)
    }

    /// Full details of the guest with the given name.
    pub async fn show_instance(&self, name: &str) -> Result<NodeFullView, CloudError> {
        let mut full = self.list_nodes_full().await?;

        full.remove(name).ok_or_else(|| {
            CloudError::NotFound(format!(
                "The specified VM named '{name}' could not be found."
            ))
        })
    }

    async fn set_vm_status(
        &self,
        name: &str,
        status: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<(), CloudError> {
        let vm = api::get_vm_by_name(&self.api, name).await?;
        let upid = api::vms::set_vm_status(&self.api, &vm, status, params).await?;
        self.wait_on(upid).await?;
        Ok(())
    }

    /// Poll a guest until it reports the wanted status.
    pub async fn wait_for_vm_status(&self, name: &str, wanted: &str) -> Result<(), CloudError> {
        let vm = self.resolve_vm(name).await?;
        let started = Instant::now();

        loop {
            let status = api::vms::current_status(&self.api, &vm).await?;
            if status.status == wanted {
                return Ok(());
            }
            if started.elapsed() >= self.task_timeout {
                return Err(CloudError::Timeout(format!(
                    "Timeout to wait for VM '{name}' to reach status '{wanted}' reached."
                )));
            }

            tracing::debug!(name, current = %status.status, wanted, "Waiting for VM status");
            sleep(self.poll_interval).await;
        }
    }

    async fn resolve_vm(&self, name: &str) -> Result<VmResource, CloudError> {
        api::get_vm_by_name(&self.api, name).await
    }

    async fn wait_on(&self, upid: Option<String>) -> Result<(), CloudError> {
        let upid = upid.ok_or_else(|| {
            CloudError::InvalidUpid("the API did not return a task handle".to_string())
        })?;
        api::wait_for_task(&self.api, &upid, self.task_timeout, self.poll_interval).await?;
        Ok(())
    }
}

/// Accept a vmid given as number or numeric string.
fn param_as_vmid(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vmid_param_accepts_number_and_string() {
        assert_eq!(param_as_vmid(Some(&json!(123))), Some(123));
        assert_eq!(param_as_vmid(Some(&json!("456"))), Some(456));
        assert_eq!(param_as_vmid(Some(&json!(true))), None);
        assert_eq!(param_as_vmid(None), None);
    }
}
