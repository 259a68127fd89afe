//! Local network state
//!
//! The sync client needs three facts about the network it is on: whether it
//! is connected at all, an identifier to detect a network change, and the
//! IPv4 address and mask to compute the discovery broadcast address.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;

/// IPv4 address and netmask of the interface used for discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Interface {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl Ipv4Interface {
    pub fn new(address: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self { address, netmask }
    }

    /// Subnet broadcast address: (ip & mask) | !mask
    pub fn broadcast(&self) -> Ipv4Addr {
        let ip = u32::from(self.address);
        let mask = u32::from(self.netmask);
        Ipv4Addr::from((ip & mask) | !mask)
    }

    /// Subnet in CIDR notation, e.g. "192.168.1.0/24"
    pub fn subnet(&self) -> String {
        let network = u32::from(self.address) & u32::from(self.netmask);
        format!(
            "{}/{}",
            Ipv4Addr::from(network),
            u32::from(self.netmask).count_ones()
        )
    }
}

/// Source of network facts, injected into the sync client
pub trait NetworkMonitor: Send + Sync {
    /// True if there is a usable network connection
    fn is_connected(&self) -> bool;

    /// Identifier of the current network (an SSID, or the subnet)
    fn network_name(&self) -> Option<String>;

    /// Interface to broadcast discovery requests on
    fn interface(&self) -> Option<Ipv4Interface>;
}

/// Monitor backed by the host's primary IPv4 address
#[derive(Debug, Clone)]
pub struct LocalNetwork {
    netmask: Ipv4Addr,
    name: Option<String>,
}

impl LocalNetwork {
    /// `netmask` is applied to the detected address; `name` overrides the
    /// subnet-derived network identifier
    pub fn new(netmask: Ipv4Addr, name: Option<String>) -> Self {
        Self { netmask, name }
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new(Ipv4Addr::new(255, 255, 255, 0), None)
    }
}

impl NetworkMonitor for LocalNetwork {
    fn is_connected(&self) -> bool {
        self.interface().is_some()
    }

    fn network_name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.interface().map(|i| i.subnet()))
    }

    fn interface(&self) -> Option<Ipv4Interface> {
        match local_ip_address::local_ip() {
            Ok(IpAddr::V4(address)) if !address.is_loopback() && !address.is_unspecified() => {
                Some(Ipv4Interface::new(address, self.netmask))
            }
            _ => None,
        }
    }
}

/// Monitor with fixed answers, used when the network is known ahead of time
#[derive(Debug)]
pub struct FixedNetwork {
    connected: bool,
    name: Mutex<Option<String>>,
    interface: Option<Ipv4Interface>,
}

impl FixedNetwork {
    pub fn new(name: Option<&str>, interface: Option<Ipv4Interface>) -> Self {
        Self {
            connected: true,
            name: Mutex::new(name.map(str::to_string)),
            interface,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            name: Mutex::new(None),
            interface: None,
        }
    }

    /// Simulate joining a different network
    pub fn set_network_name(&self, name: Option<&str>) {
        if let Ok(mut guard) = self.name.lock() {
            *guard = name.map(str::to_string);
        }
    }
}

impl NetworkMonitor for FixedNetwork {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn network_name(&self) -> Option<String> {
        self.name.lock().ok().and_then(|n| n.clone())
    }

    fn interface(&self) -> Option<Ipv4Interface> {
        self.interface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_address() {
        let iface = Ipv4Interface::new(Ipv4Addr::new(192, 168, 1, 37), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(iface.broadcast(), Ipv4Addr::new(192, 168, 1, 255));

        let wide = Ipv4Interface::new(Ipv4Addr::new(10, 1, 2, 3), Ipv4Addr::new(255, 255, 0, 0));
        assert_eq!(wide.broadcast(), Ipv4Addr::new(10, 1, 255, 255));
    }

    #[test]
    fn test_subnet() {
        let iface = Ipv4Interface::new(Ipv4Addr::new(192, 168, 1, 37), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(iface.subnet(), "192.168.1.0/24");
    }

    #[test]
    fn test_fixed_network_switch() {
        let net = FixedNetwork::new(Some("home"), None);
        assert!(net.is_connected());
        assert_eq!(net.network_name().as_deref(), Some("home"));

        net.set_network_name(Some("cafe"));
        assert_eq!(net.network_name().as_deref(), Some("cafe"));

        assert!(!FixedNetwork::disconnected().is_connected());
    }
}
