//! Peer grouping for diversity-aware address management
//!
//! Group keys bucket peers by network origin so that address tables
//! and outbound slots never fill up with one allocation.

use crate::addr::NetAddress;
use crate::i2p::I2P_DESTINATION_LEN;
use crate::network::Network;

/// Hurricane Electric tunnel broker allocation, split finer than the
/// usual IPv6 /32 because single users get /48s out of it.
const HE_TUNNEL_PREFIX: [u8; 4] = [0x20, 0x01, 0x04, 0x70];

impl NetAddress {
    /// Group key for this address.
    ///
    /// The first byte is the network class, the rest identifies the
    /// allocation: /16 for IPv4, /32 for IPv6 (/36 under the Hurricane
    /// Electric prefix), the carrier IPv4 for tunnelled ranges, a /4
    /// over the onion identifier for Tor, and the whole destination
    /// for native I2P.
    pub fn group(&self) -> Vec<u8> {
        if self.is_i2p() {
            let mut key = vec![Network::I2p as u8];
            match self.i2p_destination() {
                Some(dest) => key.extend_from_slice(dest.as_bytes()),
                None => key.extend_from_slice(&[0u8; I2P_DESTINATION_LEN]),
            }
            return key;
        }

        let bytes = self.as_bytes();
        let mut class = Network::Ipv6 as u8;
        let mut start = 0usize;
        let mut bits: u32 = 16;

        // all local addresses belong to the same group
        if self.is_local() {
            class = 255;
            bits = 0;
        }
        // all unroutable addresses belong to the same group
        if !self.is_routable() {
            class = Network::Unroutable as u8;
            bits = 0;
        } else if self.is_ipv4() || self.is_rfc6145() || self.is_rfc6052() {
            class = Network::Ipv4 as u8;
            start = 12;
        } else if self.is_rfc3964() {
            // 6to4 embeds the carrier IPv4 right after its prefix
            class = Network::Ipv4 as u8;
            start = 2;
        } else if self.is_rfc4380() {
            // Teredo stores the carrier IPv4 bit-inverted in the tail
            return vec![Network::Ipv4 as u8, bytes[12] ^ 0xFF, bytes[13] ^ 0xFF];
        } else if self.is_tor() {
            class = Network::Tor as u8;
            start = 6;
            bits = 4;
        } else if bytes[..4] == HE_TUNNEL_PREFIX {
            bits = 36;
        } else {
            bits = 32;
        }

        let mut key = vec![class];
        let mut cursor = start;
        while bits >= 8 {
            key.push(bytes[cursor]);
            cursor += 1;
            bits -= 8;
        }
        if bits > 0 {
            key.push(bytes[cursor] | ((1u8 << bits) - 1));
        }
        key
    }
}
