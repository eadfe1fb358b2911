use std::env;
use std::io::Write;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use pvec::config;
use serde_json::Value;

// Environment variables are process-global; serialize the tests that touch them.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const PROXMOX_VARS: &[&str] = &[
    "PROXMOX_HOST",
    "PROXMOX_PORT",
    "PROXMOX_USER",
    "PROXMOX_TOKEN_NAME",
    "PROXMOX_TOKEN_VALUE",
    "PROXMOX_VERIFY_SSL",
];

fn clear_proxmox_env() {
    for var in PROXMOX_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_provider_from_env_uses_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_proxmox_env();

    let provider = config::provider_from_env();

    assert_eq!(provider.port, 8006);
    assert!(provider.verify_ssl);
    assert!(provider.host.is_empty());
    assert!(provider.validate().is_err());
}

#[test]
fn test_provider_from_env_reads_variables() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_proxmox_env();

    env::set_var("PROXMOX_HOST", "pve.example.com");
    env::set_var("PROXMOX_PORT", "443");
    env::set_var("PROXMOX_USER", "root@pam");
    env::set_var("PROXMOX_TOKEN_NAME", "provision");
    env::set_var("PROXMOX_TOKEN_VALUE", "secret");
    env::set_var("PROXMOX_VERIFY_SSL", "false");

    let provider = config::provider_from_env();

    assert_eq!(provider.host, "pve.example.com");
    assert_eq!(provider.port, 443);
    assert!(!provider.verify_ssl);
    assert!(provider.validate().is_ok());
    assert_eq!(
        provider.api_base_url(),
        "https://pve.example.com:443/api2/json"
    );
    assert_eq!(
        provider.auth_header(),
        "PVEAPIToken=root@pam!provision=secret"
    );

    clear_proxmox_env();
}

#[test]
fn test_invalid_port_falls_back_to_default() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_proxmox_env();

    env::set_var("PROXMOX_PORT", "not-a-port");
    assert_eq!(config::get_port(), 8006);

    clear_proxmox_env();
}

#[test]
fn test_parse_bool_variants() {
    assert!(config::parse_bool("true"));
    assert!(config::parse_bool("1"));
    assert!(config::parse_bool("anything"));
    assert!(!config::parse_bool("false"));
    assert!(!config::parse_bool("0"));
    assert!(!config::parse_bool(" No "));
    assert!(!config::parse_bool("off"));
}

fn write_temp_yaml(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_load_providers_parses_definitions() {
    let file = write_temp_yaml(
        r#"
my-proxmox:
  driver: proxmox
  host: pve.example.com
  user: root@pam
  token_name: provision
  token_value: secret
backup-cluster:
  driver: proxmox
  host: backup.example.com
  port: 443
  user: automation@pve
  token_name: ci
  token_value: other-secret
  verify_ssl: false
"#,
    );

    let providers = config::load_providers(file.path().to_str().unwrap()).unwrap();
    assert_eq!(providers.len(), 2);

    let primary = &providers["my-proxmox"];
    assert_eq!(primary.host, "pve.example.com");
    assert_eq!(primary.port, 8006);
    assert!(primary.verify_ssl);

    let backup = &providers["backup-cluster"];
    assert_eq!(backup.port, 443);
    assert!(!backup.verify_ssl);
}

#[test]
fn test_resolve_provider_picks_named_entry() {
    let file = write_temp_yaml(
        r#"
alpha:
  host: alpha.example.com
  user: root@pam
  token_name: a
  token_value: a-secret
beta:
  host: beta.example.com
  user: root@pam
  token_name: b
  token_value: b-secret
"#,
    );

    let provider =
        config::resolve_provider(file.path().to_str(), Some("beta")).unwrap();
    assert_eq!(provider.host, "beta.example.com");
}

#[test]
fn test_resolve_provider_defaults_to_first_entry() {
    let file = write_temp_yaml(
        r#"
alpha:
  host: alpha.example.com
  user: root@pam
  token_name: a
  token_value: a-secret
beta:
  host: beta.example.com
  user: root@pam
  token_name: b
  token_value: b-secret
"#,
    );

    let provider = config::resolve_provider(file.path().to_str(), None).unwrap();
    assert_eq!(provider.host, "alpha.example.com");
}

#[test]
fn test_resolve_provider_unknown_name_is_an_error() {
    let file = write_temp_yaml("alpha:\n  host: alpha.example.com\n");

    let result = config::resolve_provider(file.path().to_str(), Some("gamma"));
    assert!(result.is_err());
}

#[test]
fn test_load_profiles_parses_create_and_clone() {
    let file = write_temp_yaml(
        r#"
ubuntu-ct:
  provider: my-proxmox
  technology: lxc
  create:
    vmid: 123
    node: pve1
    hostname: web-01
    ostemplate: "local:vztmpl/ubuntu-22.04-standard_22.04-1_amd64.tar.zst"
    storage: local-lvm
clone-of-template:
  provider: my-proxmox
  technology: qemu
  clone:
    vmid: 9000
    newid: 456
    full: true
  ssh_password: hunter2
"#,
    );

    let profiles = config::load_profiles(file.path().to_str().unwrap()).unwrap();
    assert_eq!(profiles.len(), 2);

    let create_profile = &profiles["ubuntu-ct"];
    let create = create_profile.create.as_ref().unwrap();
    assert_eq!(create.get("vmid").and_then(Value::as_u64), Some(123));
    assert_eq!(create.get("node").and_then(Value::as_str), Some("pve1"));

    let clone_profile = &profiles["clone-of-template"];
    let clone = clone_profile.clone.as_ref().unwrap();
    assert_eq!(clone.get("newid").and_then(Value::as_u64), Some(456));
    assert_eq!(clone.get("full").and_then(Value::as_bool), Some(true));
    assert_eq!(clone_profile.ssh_password.as_deref(), Some("hunter2"));
}

#[test]
fn test_load_profiles_missing_file_is_an_error() {
    let result = config::load_profiles("/nonexistent/cloud.profiles.yaml");
    assert!(result.is_err());
}

#[test]
fn test_load_profiles_rejects_malformed_yaml() {
    let file = write_temp_yaml("profile: [unterminated");
    let result = config::load_profiles(file.path().to_str().unwrap());
    assert!(result.is_err());
}
