//! Address plus port
//!
//! Native I2P endpoints are identified by their destination alone:
//! the SAM bridge multiplexes streams, so the port carries no routing
//! information and is ignored by equality and ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::addr::NetAddress;
use crate::error::AddrError;

/// A connectable peer endpoint.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub addr: NetAddress,
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: NetAddress, port: u16) -> Self {
        Self { addr, port }
    }

    pub fn unspecified() -> Self {
        Self::new(NetAddress::unspecified(), 0)
    }

    /// The endpoint as an OS socket address. Overlay families have no
    /// socket form; they are dialed through a proxy or the session.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        if let Some(v4) = self.addr.to_ipv4() {
            return Some(SocketAddr::new(IpAddr::V4(v4), self.port));
        }
        if !self.addr.is_ipv6() {
            return None;
        }
        self.addr
            .to_ipv6()
            .map(|v6| SocketAddr::new(IpAddr::V6(v6), self.port))
    }

    /// Serialization key: the raw destination text for native I2P,
    /// otherwise the 16-byte slot followed by the port big endian.
    pub fn key(&self) -> Vec<u8> {
        if let Some(dest) = self.addr.i2p_destination() {
            return dest.as_bytes().to_vec();
        }
        let mut key = Vec::with_capacity(18);
        key.extend_from_slice(self.addr.as_bytes());
        key.extend_from_slice(&self.port.to_be_bytes());
        key
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        match (self.addr.i2p_destination(), other.addr.i2p_destination()) {
            (Some(a), Some(b)) => a == b,
            (Some(_), None) | (None, Some(_)) => false,
            (None, None) => self.addr == other.addr && self.port == other.port,
        }
    }
}

impl Eq for Endpoint {}

impl Ord for Endpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.addr.i2p_destination(), other.addr.i2p_destination()) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self
                .addr
                .cmp(&other.addr)
                .then_with(|| self.port.cmp(&other.port)),
        }
    }
}

impl PartialOrd for Endpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // must mirror eq: the port does not identify a native I2P peer
        match self.addr.i2p_destination() {
            Some(dest) => dest.hash(state),
            None => {
                self.addr.hash(state);
                self.port.hash(state);
            }
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(sock: SocketAddr) -> Self {
        Self::new(NetAddress::from(sock.ip()), sock.port())
    }
}

impl FromStr for Endpoint {
    type Err = AddrError;

    /// Parses `host:port` with a numeric or self-describing host; the
    /// port defaults to 0 when absent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = split_host_port(s);
        let addr: NetAddress = host.parse()?;
        Ok(Self::new(addr, port.unwrap_or(0)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.addr.is_i2p() {
            return fmt::Display::fmt(&self.addr, f);
        }
        if self.addr.is_ipv4() || self.addr.is_tor() {
            write!(f, "{}:{}", self.addr, self.port)
        } else {
            write!(f, "[{}]:{}", self.addr, self.port)
        }
    }
}

/// Splits `host:port` into host and optional port.
///
/// The last colon counts as a port separator only when the part before
/// it is bracketed, contains no other colon, or is empty. An all-digit
/// tail is consumed from the host even when its value is out of port
/// range; the port is reported only for 1..=65535. Enclosing brackets
/// are stripped from the host.
pub fn split_host_port(input: &str) -> (String, Option<u16>) {
    let mut host = input;
    let mut port = None;

    if let Some(colon) = input.rfind(':') {
        let bracketed = colon > 0 && input.starts_with('[') && input[..colon].ends_with(']');
        let multi_colon = input[..colon].contains(':');
        if colon == 0 || bracketed || !multi_colon {
            let tail = &input[colon + 1..];
            if tail.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(n) = tail.parse::<u64>() {
                    if (1..=65535).contains(&n) {
                        port = Some(n as u16);
                    }
                }
                host = &input[..colon];
            }
        }
    }

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    (host.to_string(), port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2p::I2pDestination;
    use std::collections::HashSet;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn ep(s: &str) -> Endpoint {
        s.parse().unwrap()
    }

    fn i2p_endpoint(first: char, port: u16) -> Endpoint {
        let text = format!("{first}{}", "A".repeat(515));
        let dest = I2pDestination::from_base64(&text).unwrap();
        Endpoint::new(NetAddress::from_i2p_destination(dest), port)
    }

    #[test]
    fn test_split_host_port() {
        let cases = [
            ("example.com:8080", "example.com", Some(8080)),
            ("example.com", "example.com", None),
            ("[::1]:8333", "::1", Some(8333)),
            ("::1", "::1", None),
            ("[::1]", "::1", None),
            (":8080", "", Some(8080)),
            ("host:0", "host", None),
            ("host:70000", "host", None),
            ("host:12ab", "host:12ab", None),
            ("a:b:c", "a:b:c", None),
            ("host:", "host", None),
            ("name.onion:9111", "name.onion", Some(9111)),
        ];
        for (input, host, port) in cases {
            assert_eq!(split_host_port(input), (host.to_string(), port), "{input}");
        }
    }

    #[test]
    fn test_parse_and_display_ipv4() {
        let e = ep("1.2.3.4:8333");
        assert_eq!(e.addr.to_ipv4(), Some(Ipv4Addr::new(1, 2, 3, 4)));
        assert_eq!(e.port, 8333);
        assert_eq!(e.to_string(), "1.2.3.4:8333");
    }

    #[test]
    fn test_parse_and_display_ipv6() {
        let e = ep("[2001:db8::1]:9050");
        assert_eq!(e.port, 9050);
        assert_eq!(e.to_string(), "[2001:db8::1]:9050");
        assert_eq!(ep("::1").port, 0);
    }

    #[test]
    fn test_onion_endpoint_display_uses_colon_form() {
        let e = ep("expyuzz4wqqyqhjn.onion:9001");
        assert!(e.addr.is_tor());
        assert_eq!(e.to_string(), "expyuzz4wqqyqhjn.onion:9001");
    }

    #[test]
    fn test_i2p_endpoint_drops_port_in_display() {
        let e = i2p_endpoint('A', 4108);
        assert!(!e.to_string().contains(':'));
        assert!(e.to_string().ends_with(".b32.i2p"));
    }

    #[test]
    fn test_i2p_equality_ignores_port() {
        let a = i2p_endpoint('A', 1);
        let b = i2p_endpoint('A', 2);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_mixed_families_never_equal() {
        assert_ne!(ep("1.2.3.4:1"), i2p_endpoint('A', 1));
    }

    #[test]
    fn test_non_i2p_sorts_before_i2p() {
        let ip = ep("255.255.255.254:65535");
        let overlay = i2p_endpoint('A', 0);
        assert!(ip < overlay);
        assert!(overlay > ip);
        assert!(i2p_endpoint('A', 9) < i2p_endpoint('B', 1));
    }

    #[test]
    fn test_ordering_by_address_then_port() {
        assert!(ep("1.2.3.4:1") < ep("1.2.3.4:2"));
        assert!(ep("1.2.3.4:2") < ep("1.2.3.5:1"));
    }

    #[test]
    fn test_key_layout() {
        let e = ep("1.2.3.4:4660");
        let key = e.key();
        assert_eq!(key.len(), 18);
        assert_eq!(&key[..16], &e.addr.as_bytes()[..]);
        assert_eq!(&key[16..], &[0x12, 0x34]);

        let overlay = i2p_endpoint('A', 4660);
        assert_eq!(overlay.key().len(), 516);
    }

    #[test]
    fn test_socket_addr_round_trip() {
        let v4: SocketAddr = "1.2.3.4:8333".parse().unwrap();
        assert_eq!(Endpoint::from(v4).to_socket_addr(), Some(v4));

        let v6: SocketAddr = "[2001:db8::1]:8333".parse().unwrap();
        assert_eq!(
            Endpoint::from(v6).to_socket_addr(),
            Some(SocketAddr::new(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1).into(), 8333))
        );

        assert_eq!(i2p_endpoint('A', 1).to_socket_addr(), None);
        assert_eq!(ep("expyuzz4wqqyqhjn.onion:9030").to_socket_addr(), None);
    }
}
