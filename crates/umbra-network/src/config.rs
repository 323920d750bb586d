//! Shared settings for resolution and dialing

use std::time::Duration;

use umbra_netaddr::{I2pDestination, NetAddress};

/// Default connect timeout. Generous because I2P tunnel builds run far
/// longer than plain TCP handshakes.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Shared context for resolution and dialing.
#[derive(Debug, Clone)]
pub struct NetContext {
    /// Resolve DNS names when looking up peers.
    pub name_lookup: bool,
    /// Timeout for a single connect attempt.
    pub connect_timeout: Duration,
    /// Our own I2P destination, when an I2P session is up.
    pub local_i2p_destination: Option<I2pDestination>,
}

impl Default for NetContext {
    fn default() -> Self {
        Self {
            name_lookup: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            local_i2p_destination: None,
        }
    }
}

impl NetContext {
    /// True for loopback addresses and for our own I2P destination.
    pub fn is_local(&self, addr: &NetAddress) -> bool {
        if addr.is_local() {
            return true;
        }
        match (&self.local_i2p_destination, addr.i2p_destination()) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => false,
        }
    }
}
