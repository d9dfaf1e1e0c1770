//! Network adapter configuration records.

use crate::inventory_entity;

inventory_entity! {
    /// `Win32_NetworkAdapterConfiguration` for IP-enabled adapters.
    pub struct NetworkAdapterConfiguration: "NetworkAdapterConfiguration" {
        "Description" => description: String,
        "MACAddress" => mac_address: String,
        "IPAddress" => ip_address: Vec<String>,
        "IPSubnet" => ip_subnet: Vec<String>,
        "DefaultIPGateway" => default_ip_gateway: Vec<String>,
        "DNSHostName" => dns_host_name: String,
        "DHCPEnabled" => dhcp_enabled: bool,
    }
}

impl NetworkAdapterConfiguration {
    /// IPv4 addresses only, in reported order.
    pub fn ipv4_addresses(&self) -> Vec<&str> {
        self.ip_address
            .value()
            .map(|ips| {
                ips.iter()
                    .map(String::as_str)
                    .filter(|ip| ip.parse::<std::net::Ipv4Addr>().is_ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::NetworkAdapterConfiguration;
    use crate::entity::Property;

    #[test]
    fn filters_ipv4_addresses() {
        let adapter = NetworkAdapterConfiguration {
            ip_address: Property::Value(vec!["10.0.0.5".to_string(), "fe80::1".to_string()]),
            ..NetworkAdapterConfiguration::default()
        };
        assert_eq!(adapter.ipv4_addresses(), vec!["10.0.0.5"]);
        assert!(NetworkAdapterConfiguration::default()
            .ipv4_addresses()
            .is_empty());
    }
}
