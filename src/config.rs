use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::CloudError;
use crate::models::{Provider, VmProfile};

// Default configuration constants
pub const DEFAULT_PORT: u16 = 8006;
pub const DEFAULT_STORAGE: &str = "local";
pub const DEFAULT_PROFILES_FILE: &str = "cloud.profiles.yaml";

pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

pub fn get_host() -> String {
    env::var("PROXMOX_HOST").unwrap_or_default()
}

pub fn get_port() -> u16 {
    env::var("PROXMOX_PORT")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

pub fn get_user() -> String {
    env::var("PROXMOX_USER").unwrap_or_default()
}

pub fn get_token_name() -> String {
    env::var("PROXMOX_TOKEN_NAME").unwrap_or_default()
}

pub fn get_token_value() -> String {
    env::var("PROXMOX_TOKEN_VALUE").unwrap_or_default()
}

pub fn get_verify_ssl() -> bool {
    env::var("PROXMOX_VERIFY_SSL")
        .map(|raw| parse_bool(&raw))
        .unwrap_or(true)
}

pub fn parse_bool(raw: &str) -> bool {
    !matches!(
        raw.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Assemble a provider from `PROXMOX_*` environment variables.
pub fn provider_from_env() -> Provider {
    Provider {
        driver: Some("proxmox".to_string()),
        host: get_host(),
        port: get_port(),
        user: get_user(),
        token_name: get_token_name(),
        token_value: get_token_value(),
        verify_ssl: get_verify_ssl(),
    }
}

/// Load a providers YAML file: a mapping of provider name to definition.
pub fn load_providers(path: &str) -> Result<BTreeMap<String, Provider>, CloudError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CloudError::Config(format!("Failed to read providers file '{path}': {e}")))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| CloudError::Config(format!("Failed to parse providers file '{path}': {e}")))
}

/// Load a profiles YAML file: a mapping of profile name to definition.
pub fn load_profiles(path: &str) -> Result<BTreeMap<String, VmProfile>, CloudError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CloudError::Config(format!("Failed to read profiles file '{path}': {e}")))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| CloudError::Config(format!("Failed to parse profiles file '{path}': {e}")))
}

/// Pick the provider to talk to.
///
/// With a providers file the named entry is used, or the first configured
/// one when no name is given. Without a file the environment supplies the
/// provider. The returned provider is not validated; callers decide how
/// to surface missing values.
pub fn resolve_provider(
    providers_file: Option<&str>,
    name: Option<&str>,
) -> Result<Provider, CloudError> {
    let Some(path) = providers_file else {
        return Ok(provider_from_env());
    };

    let mut providers = load_providers(path)?;
    match name {
        Some(name) => providers.remove(name).ok_or_else(|| {
            CloudError::Config(format!("No provider named '{name}' in '{path}'"))
        }),
        None => providers
            .into_iter()
            .next()
            .map(|(_, provider)| provider)
            .ok_or_else(|| CloudError::Config(format!("The providers file '{path}' is empty"))),
    }
}
