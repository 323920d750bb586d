//! Unified peer address model for the Umbra node
//!
//! Every supported family shares one 16-byte slot:
//! - IPv4 as RFC 4291 mapped addresses
//! - IPv6 verbatim
//! - Tor hidden services behind the OnionCat marker
//! - native I2P destinations behind the GarlicCat marker
//!
//! On top of the slot sit the classification predicates (validity,
//! routability, RFC special ranges), peer group keys for diversity
//! bucketing, and the reachability ranking used when advertising our
//! own addresses.

pub mod addr;
pub mod endpoint;
pub mod error;
pub mod group;
pub mod i2p;
pub mod network;
pub mod reachability;

pub use addr::{NetAddress, GARLICCAT_PREFIX, IPV4_IN_IPV6_PREFIX, ONIONCAT_PREFIX};
pub use endpoint::{split_host_port, Endpoint};
pub use error::{AddrError, AddrResult};
pub use i2p::{I2pDestination, I2P_DESTINATION_LEN};
pub use network::{Network, NETWORK_COUNT};
pub use reachability::Reachability;
