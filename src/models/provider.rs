use serde::{Deserialize, Serialize};

use crate::error::CloudError;

/// A hypervisor endpoint definition, either parsed from a providers YAML
/// file or assembled from environment variables.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Provider {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub token_value: String,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

fn default_port() -> u16 {
    8006
}

fn default_true() -> bool {
    true
}

impl Provider {
    /// Ensure the values an API connection cannot do without are present.
    pub fn validate(&self) -> Result<(), CloudError> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.user.trim().is_empty() {
            missing.push("user");
        }
        if self.token_name.trim().is_empty() {
            missing.push("token_name");
        }
        if self.token_value.trim().is_empty() {
            missing.push("token_value");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CloudError::Config(format!(
                "Missing required provider configuration values: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn api_base_url(&self) -> String {
        format!(
            "https://{}:{}/api2/json",
            self.host.trim().trim_end_matches('/'),
            self.port
        )
    }

    /// Pre-formatted `Authorization` header value for API token auth.
    pub fn auth_header(&self) -> String {
        format!(
            "PVEAPIToken={}!{}={}",
            self.user, self.token_name, self.token_value
        )
    }
}
