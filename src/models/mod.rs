// One type per file, re-exported here
pub mod action_result;
pub mod node_info;
pub mod node_view;
pub mod profile;
pub mod provider;
pub mod storage_item;
pub mod task_status;
pub mod technology;
pub mod upid;
pub mod vm_resource;
pub mod vm_status;

pub use action_result::ActionResult;
pub use node_info::NodeInfo;
pub use node_view::{NodeFullView, NodeView};
pub use profile::VmProfile;
pub use provider::Provider;
pub use storage_item::StorageItem;
pub use task_status::TaskStatus;
pub use technology::Technology;
pub use upid::Upid;
pub use vm_resource::VmResource;
pub use vm_status::VmStatus;
