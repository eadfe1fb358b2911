use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use indicatif::ProgressBar;
use serde_json::{Map, Value};
use terminal_size::{terminal_size, Width};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use yansi::Paint;

use pvec::api::ApiClient;
use pvec::config;
use pvec::error::CloudError;
use pvec::services::Driver;
use pvec::utils::parse_kv_params;

fn json_value_to_string(v: &Value) -> String {
    match v {
        Value::Null => "".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(v).unwrap_or_default(),
    }
}

fn print_table(value: &Value) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if let Some((Width(w), _)) = terminal_size() {
        table.set_width(w.saturating_sub(4));
    }

    match value {
        Value::Array(arr) => {
            if arr.is_empty() {
                println!("(empty list)");
                return;
            }
            // Use the first object's keys as the header row.
            if let Some(first) = arr.iter().find_map(|v| v.as_object()) {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(headers.clone());

                for item in arr {
                    if let Some(obj) = item.as_object() {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|k| obj.get(k).map(json_value_to_string).unwrap_or_default())
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                // List of primitives
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![json_value_to_string(item)]);
                }
            }
        }
        Value::Object(obj) => {
            table.set_header(vec!["Field", "Value"]);
            for (k, v) in obj {
                table.add_row(vec![k.clone(), json_value_to_string(v)]);
            }
        }
        _ => {
            println!("{}", json_value_to_string(value));
            return;
        }
    }

    println!("\n{table}\n");
}

/// Render a `{name: {fields...}}` map as one table with a leading name
/// column.
fn print_named_map(value: &Value) {
    let Some(map) = value.as_object() else {
        print_table(value);
        return;
    };
    if map.is_empty() {
        println!("(empty list)");
        return;
    }

    let mut rows = Vec::new();
    for (name, entry) in map {
        let mut row = Map::new();
        row.insert("name".to_string(), Value::String(name.clone()));
        match entry.as_object() {
            Some(fields) => {
                for (k, v) in fields {
                    row.insert(k.clone(), v.clone());
                }
            }
            None => {
                row.insert("value".to_string(), entry.clone());
            }
        }
        rows.push(Value::Object(row));
    }
    print_table(&Value::Array(rows));
}

fn fail(e: CloudError) -> ! {
    tracing::error!(%e, "Command failed");
    eprintln!("{} {}", Paint::new("Error:").red().bold(), e);
    process::exit(1);
}

fn parse_params_or_fail(args: &[String]) -> Map<String, Value> {
    match parse_kv_params(args) {
        Ok(params) => params,
        Err(e) => fail(e),
    }
}

fn build_driver(providers: Option<&str>, provider_name: Option<&str>) -> Driver {
    let provider = match config::resolve_provider(providers, provider_name) {
        Ok(provider) => provider,
        Err(e) => fail(e),
    };
    if let Err(e) = provider.validate() {
        fail(e);
    }
    match ApiClient::new(&provider) {
        Ok(api) => Driver::new(api),
        Err(e) => fail(e),
    }
}

async fn with_spinner<T>(
    message: &str,
    silent: bool,
    fut: impl std::future::Future<Output = T>,
) -> T {
    if silent {
        return fut.await;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    let result = fut.await;
    pb.finish_and_clear();
    result
}

#[derive(Parser)]
#[command(
    name = "pvec",
    author,
    version,
    about = "Provision virtual machines and containers on Proxmox VE",
    long_about = r#"pvec — provision QEMU virtual machines and LXC containers on a Proxmox VE cluster.

This tool surfaces the driver operations of a provisioning pipeline: create guests from profiles, clone, reconfigure, inspect and destroy them through the Proxmox REST API. Use the `--env-file` option or PROXMOX_* environment variables to provide API credentials, or point `--providers` at a providers YAML file.

Examples:
  1) Provision from a profile:
      pvec create web-01 --profile ubuntu-ct
  2) Inspect the cluster:
      pvec list --full
      pvec images --storage ceph-store
  3) Lifecycle actions:
      pvec stop web-01
      pvec destroy web-01 --param purge=1
"#,
    after_help = "Use `pvec <subcommand> --help` to get subcommand specific options and usage examples."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
    /// Disable request/response logging
    #[arg(long, global = true)]
    silent: bool,
    /// Path to .env file
    #[arg(long, global = true)]
    env_file: Option<String>,
    /// Path to a providers YAML file (defaults to PROXMOX_* environment variables)
    #[arg(long, global = true)]
    providers: Option<String>,
    /// Provider name inside the providers file
    #[arg(long, global = true)]
    provider: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a guest from a profile and start it
    #[command(
        about = "Create a guest from a profile and start it",
        long_about = "Provision a new VM or container from a profile in the profiles file. A profile with `clone` options clones the referenced guest instead of creating one from scratch. The guest is started once the API lists it, and its details are printed."
    )]
    Create {
        /// Name of the guest to provision
        name: String,
        /// Profile name inside the profiles file
        #[arg(long)]
        profile: String,
        /// Path to the profiles YAML file
        #[arg(long, default_value_t = String::from(config::DEFAULT_PROFILES_FILE))]
        profiles: String,
    },
    /// Destroy a guest
    #[command(
        about = "Destroy a guest",
        long_about = "Permanently delete a VM or container by name. Additional API parameters (e.g. purge=1) can be passed with repeated --param flags. Use with care."
    )]
    Destroy {
        name: String,
        /// Additional API parameter, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Clone a guest
    #[command(
        about = "Clone a guest",
        long_about = "Clone the guest with the given vmid. Parameters such as newid, full or target are passed through to the clone endpoint with repeated --param flags."
    )]
    Clone {
        /// vmid of the guest to clone
        #[arg(long)]
        vmid: u64,
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Reconfigure a guest
    #[command(
        about = "Reconfigure a guest",
        long_about = "Apply config changes to a VM or container by name; every --param becomes a config setting (e.g. --param description='managed by pvec')."
    )]
    Reconfigure {
        name: String,
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Start a guest
    #[command(
        about = "Start a guest",
        long_about = "Request a start for the named guest and wait until it reports the running state."
    )]
    Start {
        name: String,
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Stop a guest immediately
    #[command(
        about = "Stop a guest immediately",
        long_about = "Hard-stop the named guest and wait until it reports the stopped state. This is destructive to running state but preserves disks; prefer `shutdown` for a clean halt."
    )]
    Stop {
        name: String,
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Shut a guest down cleanly
    #[command(
        about = "Shut a guest down cleanly",
        long_about = "Ask the guest OS to power off and wait until the guest reports the stopped state."
    )]
    Shutdown {
        name: String,
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// List the guests managed by the provider
    #[command(
        about = "List the guests managed by the provider",
        long_about = "List every VM and container of the cluster in a uniform shape. Use --full for raw config details or --select to project specific fields."
    )]
    List {
        /// Include full configuration details
        #[arg(long)]
        full: bool,
        /// Comma-separated fields to project from the full view
        #[arg(long, value_delimiter = ',', value_name = "FIELD,FIELD")]
        select: Option<Vec<String>>,
    },
    /// List available datacenter locations (online nodes)
    Locations,
    /// List available images on a storage
    #[command(
        about = "List available images on a storage",
        long_about = "List the provisioning-capable volumes (disk images, container templates, ISOs) on the given storage of every online node. The storage defaults to 'local'."
    )]
    Images {
        /// Name of the storage location that should be searched
        #[arg(long)]
        storage: Option<String>,
    },
    /// List available instance sizes
    Sizes,
    /// Show the details of a guest
    Show { name: String },
    /// Validate configuration (env vars / API credentials)
    #[command(
        about = "Validate configuration and ensure API connectivity.",
        long_about = "Validate the provider values required to talk to the Proxmox API, and verify the configured token by attempting to list the cluster nodes."
    )]
    CheckConfig,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // CLI parsing
    let cli = Cli::parse();

    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }

    if cli.silent {
        pvec::api::set_silent(true);
    }

    config::load_env_file(cli.env_file.as_deref());

    let providers_file = cli.providers.clone();
    let provider_name = cli.provider.clone();
    let silent = cli.silent;

    match cli.command {
        Commands::Create {
            name,
            profile,
            profiles,
        } => {
            let all_profiles = match config::load_profiles(&profiles) {
                Ok(profiles) => profiles,
                Err(e) => fail(e),
            };
            let Some(vm_profile) = all_profiles.get(&profile).cloned() else {
                fail(CloudError::Config(format!(
                    "No profile named '{profile}' in '{profiles}'"
                )));
            };

            // The profile may name its provider; an explicit --provider wins.
            let provider_name = provider_name.or_else(|| {
                (!vm_profile.provider.is_empty()).then(|| vm_profile.provider.clone())
            });
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());

            let outcome = with_spinner(
                &format!("Creating '{name}'..."),
                silent,
                driver.create(&name, &profile, &vm_profile),
            )
            .await;
            match outcome {
                Ok(outcome) => {
                    println!(
                        "{} '{}' {}",
                        Paint::new("Instance").green(),
                        outcome.name,
                        Paint::new("created").green()
                    );
                    if let Some(password) = &outcome.ssh_password {
                        println!(
                            "{} {}",
                            Paint::new("SSH password:").green(),
                            Paint::new(password).cyan()
                        );
                    }
                    print_table(&serde_json::to_value(&outcome.instance).unwrap_or_default());
                }
                Err(e) => fail(e),
            }
        }
        Commands::Destroy { name, params } => {
            let params = parse_params_or_fail(&params);
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match with_spinner(
                &format!("Destroying '{name}'..."),
                silent,
                driver.destroy(&name, params),
            )
            .await
            {
                Ok(()) => println!(
                    "{} '{}' {}",
                    Paint::new("Instance").green(),
                    name,
                    Paint::new("destroyed").green()
                ),
                Err(e) => fail(e),
            }
        }
        Commands::Clone { vmid, params } => {
            let mut params = parse_params_or_fail(&params);
            params.insert("vmid".to_string(), Value::from(vmid));
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match with_spinner(
                &format!("Cloning vmid {vmid}..."),
                silent,
                driver.clone_vm(params),
            )
            .await
            {
                Ok(()) => println!(
                    "{} {} {}",
                    Paint::new("Guest").green(),
                    vmid,
                    Paint::new("cloned").green()
                ),
                Err(e) => fail(e),
            }
        }
        Commands::Reconfigure { name, params } => {
            let params = parse_params_or_fail(&params);
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match driver.reconfigure(&name, params).await {
                Ok(result) => print_table(&serde_json::to_value(&result).unwrap_or_default()),
                Err(e) => fail(e),
            }
        }
        Commands::Start { name, params } => {
            let params = parse_params_or_fail(&params);
            let params = (!params.is_empty()).then_some(params);
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match with_spinner(
                &format!("Starting '{name}'..."),
                silent,
                driver.start(&name, params.as_ref()),
            )
            .await
            {
                Ok(result) => print_table(&serde_json::to_value(&result).unwrap_or_default()),
                Err(e) => fail(e),
            }
        }
        Commands::Stop { name, params } => {
            let params = parse_params_or_fail(&params);
            let params = (!params.is_empty()).then_some(params);
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match with_spinner(
                &format!("Stopping '{name}'..."),
                silent,
                driver.stop(&name, params.as_ref()),
            )
            .await
            {
                Ok(result) => print_table(&serde_json::to_value(&result).unwrap_or_default()),
                Err(e) => fail(e),
            }
        }
        Commands::Shutdown { name, params } => {
            let params = parse_params_or_fail(&params);
            let params = (!params.is_empty()).then_some(params);
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match with_spinner(
                &format!("Shutting down '{name}'..."),
                silent,
                driver.shutdown(&name, params.as_ref()),
            )
            .await
            {
                Ok(result) => print_table(&serde_json::to_value(&result).unwrap_or_default()),
                Err(e) => fail(e),
            }
        }
        Commands::List { full, select } => {
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            if let Some(fields) = select {
                match driver.list_nodes_select(&fields).await {
                    Ok(nodes) => {
                        print_named_map(&serde_json::to_value(&nodes).unwrap_or_default())
                    }
                    Err(e) => fail(e),
                }
            } else if full {
                match driver.list_nodes_full().await {
                    Ok(nodes) => {
                        print_named_map(&serde_json::to_value(&nodes).unwrap_or_default())
                    }
                    Err(e) => fail(e),
                }
            } else {
                match driver.list_nodes().await {
                    Ok(nodes) => {
                        print_named_map(&serde_json::to_value(&nodes).unwrap_or_default())
                    }
                    Err(e) => fail(e),
                }
            }
        }
        Commands::Locations => {
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match driver.avail_locations().await {
                Ok(locations) => {
                    print_named_map(&serde_json::to_value(&locations).unwrap_or_default())
                }
                Err(e) => fail(e),
            }
        }
        Commands::Images { storage } => {
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match driver.avail_images(storage.as_deref()).await {
                Ok(images) => {
                    let value = serde_json::to_value(&images).unwrap_or_default();
                    let Some(locations) = value.as_object() else {
                        return;
                    };
                    for (location, volumes) in locations {
                        println!("{}", Paint::new(location).bold().underline());
                        print_named_map(volumes);
                    }
                }
                Err(e) => fail(e),
            }
        }
        Commands::Sizes => {
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            let sizes = driver.avail_sizes();
            if sizes.is_empty() {
                println!(
                    "{}",
                    Paint::new("Proxmox does not publish instance sizes; the listing is empty.")
                        .yellow()
                );
            }
        }
        Commands::Show { name } => {
            let driver = build_driver(providers_file.as_deref(), provider_name.as_deref());
            match driver.show_instance(&name).await {
                Ok(instance) => print_table(&serde_json::to_value(&instance).unwrap_or_default()),
                Err(e) => fail(e),
            }
        }
        Commands::CheckConfig => {
            let provider = match config::resolve_provider(
                providers_file.as_deref(),
                provider_name.as_deref(),
            ) {
                Ok(provider) => provider,
                Err(e) => fail(e),
            };

            let mut ok = true;
            if provider.host.trim().is_empty() {
                eprintln!("{}", Paint::new("PROXMOX_HOST is not configured").red());
                ok = false;
            }
            if provider.user.trim().is_empty() {
                eprintln!("{}", Paint::new("PROXMOX_USER is not configured").red());
                ok = false;
            }
            if provider.token_name.trim().is_empty() {
                eprintln!("{}", Paint::new("PROXMOX_TOKEN_NAME is not configured").red());
                ok = false;
            }
            if provider.token_value.trim().is_empty() {
                eprintln!("{}", Paint::new("PROXMOX_TOKEN_VALUE is not configured").red());
                ok = false;
            }
            if !ok {
                process::exit(1);
            }

            let api = match ApiClient::new(&provider) {
                Ok(api) => api,
                Err(e) => fail(e),
            };
            match pvec::api::list_nodes(&api).await {
                Ok(nodes) => {
                    println!(
                        "{}",
                        Paint::new(format!(
                            "Configuration looks valid ({} node(s) returned)",
                            nodes.len()
                        ))
                        .green()
                    );
                }
                Err(e) => {
                    eprintln!(
                        "{}: {}",
                        Paint::new("Configuration appears invalid").red(),
                        e
                    );
                    process::exit(1);
                }
            }
        }
    }
}
