//! Network families recognized by the address model

use std::fmt;

/// Network family of a peer address.
///
/// The discriminants are stable: they are the class byte of group keys
/// and the index into the per-family proxy table, so reordering them
/// would reshuffle peer buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Network {
    /// Invalid or non-routable address
    Unroutable = 0,
    Ipv4 = 1,
    Ipv6 = 2,
    /// Tor hidden service
    Tor = 3,
    /// Native I2P destination
    I2p = 4,
}

/// Number of network families, for fixed-size per-family tables.
pub const NETWORK_COUNT: usize = 5;

impl Network {
    /// All families, in discriminant order.
    pub const ALL: [Network; NETWORK_COUNT] = [
        Network::Unroutable,
        Network::Ipv4,
        Network::Ipv6,
        Network::Tor,
        Network::I2p,
    ];

    /// Index into per-family tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase label for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Unroutable => "unroutable",
            Network::Ipv4 => "ipv4",
            Network::Ipv6 => "ipv6",
            Network::Tor => "tor",
            Network::I2p => "i2p",
        }
    }

    /// Parses a family name as written in configuration. `"onion"` is
    /// accepted as an alias for Tor; anything unrecognized maps to
    /// [`Network::Unroutable`].
    pub fn from_name(name: &str) -> Network {
        match name.to_ascii_lowercase().as_str() {
            "ipv4" => Network::Ipv4,
            "ipv6" => Network::Ipv6,
            "tor" | "onion" => Network::Tor,
            "i2p" => Network::I2p,
            _ => Network::Unroutable,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
