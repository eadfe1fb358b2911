use std::net::IpAddr;

use serde_json::{Map, Value};

use crate::models::Technology;
use crate::utils::stringlist_to_dictionary;

/// Extract private and public IPs from a guest config.
///
/// LXC guests carry their addresses in `net*` entries, QEMU guests in
/// `ipconfig*` entries; both are stringlists whose `ip` setting is an
/// address with prefix length. Invalid addresses are logged and skipped.
pub fn parse_ips(config: &Map<String, Value>, technology: Technology) -> (Vec<String>, Vec<String>) {
    let prefix = match technology {
        Technology::Lxc => "net",
        Technology::Qemu => "ipconfig",
    };

    let mut private_ips = Vec::new();
    let mut public_ips = Vec::new();

    for (key, value) in config {
        if !key.starts_with(prefix) {
            continue;
        }
        let Some(raw) = value.as_str() else { continue };

        let settings = match stringlist_to_dictionary(raw) {
            Ok(settings) => settings,
            Err(_) => {
                tracing::error!(%key, "Ignoring network config entry that is not a stringlist");
                continue;
            }
        };
        let Some(ip_with_netmask) = settings.get("ip") else {
            continue;
        };

        let address = ip_with_netmask
            .split('/')
            .next()
            .unwrap_or(ip_with_netmask.as_str());
        match address.parse::<IpAddr>() {
            Ok(ip) if is_private(&ip) => private_ips.push(ip.to_string()),
            Ok(ip) => public_ips.push(ip.to_string()),
            Err(_) => {
                tracing::error!(
                    "Ignoring '{}' because it is not a valid IP",
                    ip_with_netmask
                );
            }
        }
    }

    (private_ips, public_ips)
}

/// RFC 1918, loopback and link-local ranges count as private, as do their
/// IPv6 counterparts (unique-local, loopback, link-local).
fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(entries: &[(&str, &str)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn qemu_config_reads_ipconfig_entries() {
        let config = config(&[
            ("ipconfig0", "ip=192.168.1.10/24,gw=192.168.1.1"),
            ("ipconfig1", "ip=200.200.200.200/24,gw=200.200.200.1"),
        ]);

        let (private_ips, public_ips) = parse_ips(&config, Technology::Qemu);
        assert_eq!(private_ips, vec!["192.168.1.10"]);
        assert_eq!(public_ips, vec!["200.200.200.200"]);
    }

    #[test]
    fn lxc_config_reads_net_entries() {
        let config = config(&[
            (
                "net0",
                "name=eth0,bridge=vmbr0,hwaddr=BA:F9:3B:F7:9E:A7,ip=192.168.1.10/24,type=veth",
            ),
            (
                "net1",
                "name=eth1,bridge=vmbr0,hwaddr=B2:4B:C6:39:1D:10,ip=200.200.200.200/24,type=veth",
            ),
        ]);

        let (private_ips, public_ips) = parse_ips(&config, Technology::Lxc);
        assert_eq!(private_ips, vec!["192.168.1.10"]);
        assert_eq!(public_ips, vec!["200.200.200.200"]);
    }

    #[test]
    fn missing_network_config_yields_nothing() {
        let (private_ips, public_ips) = parse_ips(&Map::new(), Technology::Lxc);
        assert!(private_ips.is_empty());
        assert!(public_ips.is_empty());
    }

    #[test]
    fn invalid_addresses_are_skipped() {
        let config = config(&[(
            "net0",
            "name=eth0,bridge=vmbr0,hwaddr=BA:F9:3B:F7:9E:A7,ip=192.168.500.2/24,type=veth",
        )]);

        let (private_ips, public_ips) = parse_ips(&config, Technology::Lxc);
        assert!(private_ips.is_empty());
        assert!(public_ips.is_empty());
    }

    #[test]
    fn dhcp_entries_are_skipped() {
        let config = config(&[("ipconfig0", "ip=dhcp")]);
        let (private_ips, public_ips) = parse_ips(&config, Technology::Qemu);
        assert!(private_ips.is_empty());
        assert!(public_ips.is_empty());
    }

    #[test]
    fn unique_local_v6_counts_as_private() {
        let config = config(&[("ipconfig0", "ip=fd12:3456:789a::1/64")]);
        let (private_ips, public_ips) = parse_ips(&config, Technology::Qemu);
        assert_eq!(private_ips, vec!["fd12:3456:789a::1"]);
        assert!(public_ips.is_empty());
    }

    #[test]
    fn qemu_parsing_ignores_net_entries() {
        let config = config(&[(
            "net0",
            "virtio=BA:F9:3B:F7:9E:A7,bridge=vmbr0",
        )]);
        let (private_ips, public_ips) = parse_ips(&config, Technology::Qemu);
        assert!(private_ips.is_empty());
        assert!(public_ips.is_empty());
    }
}
