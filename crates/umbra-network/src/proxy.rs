//! Per-family proxy configuration
//!
//! Each network family can be routed through its own SOCKS5 proxy,
//! with a separate name proxy for resolving DNS names remotely. All
//! assignments live behind one lock and can change at runtime.

use parking_lot::RwLock;
use tracing::debug;
use umbra_netaddr::{Endpoint, NetAddress, Network, NETWORK_COUNT};

use crate::error::{NetError, NetResult};

#[derive(Default)]
struct ProxyTable {
    per_net: [Option<Endpoint>; NETWORK_COUNT],
    name_proxy: Option<Endpoint>,
}

/// Proxy assignments per network family plus the name proxy.
#[derive(Default)]
pub struct ProxyRegistry {
    table: RwLock<ProxyTable>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a proxy for one family. The endpoint must name a valid
    /// peer address.
    pub fn set_proxy(&self, net: Network, proxy: Endpoint) -> NetResult<()> {
        if !proxy.addr.is_valid() {
            return Err(NetError::InvalidAddress(format!(
                "proxy {proxy} is not a valid address"
            )));
        }
        debug!(net = %net, proxy = %proxy, "proxy configured");
        self.table.write().per_net[net.index()] = Some(proxy);
        Ok(())
    }

    pub fn clear_proxy(&self, net: Network) {
        self.table.write().per_net[net.index()] = None;
    }

    pub fn proxy(&self, net: Network) -> Option<Endpoint> {
        self.table.read().per_net[net.index()].clone()
    }

    pub fn has_proxy(&self, net: Network) -> bool {
        self.table.read().per_net[net.index()].is_some()
    }

    /// Assigns the proxy used to connect to plain DNS names without
    /// resolving them locally.
    pub fn set_name_proxy(&self, proxy: Endpoint) -> NetResult<()> {
        if !proxy.addr.is_valid() {
            return Err(NetError::InvalidAddress(format!(
                "proxy {proxy} is not a valid address"
            )));
        }
        debug!(proxy = %proxy, "name proxy configured");
        self.table.write().name_proxy = Some(proxy);
        Ok(())
    }

    pub fn clear_name_proxy(&self) {
        self.table.write().name_proxy = None;
    }

    pub fn name_proxy(&self) -> Option<Endpoint> {
        self.table.read().name_proxy.clone()
    }

    pub fn have_name_proxy(&self) -> bool {
        self.table.read().name_proxy.is_some()
    }

    /// True if `addr` is one of the configured per-family proxy
    /// addresses. The port is not compared.
    pub fn is_proxy(&self, addr: &NetAddress) -> bool {
        let table = self.table.read();
        table.per_net.iter().flatten().any(|p| p.addr == *addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(s: &str) -> Endpoint {
        s.parse().unwrap()
    }

    #[test]
    fn test_set_and_get_per_family() {
        let registry = ProxyRegistry::new();
        assert!(registry.proxy(Network::Ipv4).is_none());

        registry.set_proxy(Network::Ipv4, ep("127.0.0.1:9050")).unwrap();
        registry.set_proxy(Network::Tor, ep("127.0.0.1:9150")).unwrap();

        assert_eq!(registry.proxy(Network::Ipv4), Some(ep("127.0.0.1:9050")));
        assert_eq!(registry.proxy(Network::Tor), Some(ep("127.0.0.1:9150")));
        assert!(registry.proxy(Network::Ipv6).is_none());
        assert!(registry.has_proxy(Network::Tor));

        registry.clear_proxy(Network::Tor);
        assert!(!registry.has_proxy(Network::Tor));
    }

    #[test]
    fn test_rejects_invalid_proxy_address() {
        let registry = ProxyRegistry::new();
        let err = registry.set_proxy(Network::Ipv4, ep("0.0.0.0:9050")).unwrap_err();
        assert!(matches!(err, NetError::InvalidAddress(_)));
        let err = registry.set_name_proxy(ep("255.255.255.255:9050")).unwrap_err();
        assert!(matches!(err, NetError::InvalidAddress(_)));
    }

    #[test]
    fn test_name_proxy() {
        let registry = ProxyRegistry::new();
        assert!(!registry.have_name_proxy());

        registry.set_name_proxy(ep("127.0.0.1:9050")).unwrap();
        assert!(registry.have_name_proxy());
        assert_eq!(registry.name_proxy(), Some(ep("127.0.0.1:9050")));

        registry.clear_name_proxy();
        assert!(!registry.have_name_proxy());
    }

    #[test]
    fn test_is_proxy_ignores_port() {
        let registry = ProxyRegistry::new();
        registry.set_proxy(Network::Ipv4, ep("10.1.2.3:9050")).unwrap();

        assert!(registry.is_proxy(&"10.1.2.3".parse().unwrap()));
        assert!(!registry.is_proxy(&"10.1.2.4".parse().unwrap()));
    }

    #[test]
    fn test_name_proxy_not_reported_by_is_proxy() {
        let registry = ProxyRegistry::new();
        registry.set_name_proxy(ep("10.1.2.3:9050")).unwrap();
        assert!(!registry.is_proxy(&"10.1.2.3".parse().unwrap()));
    }
}
