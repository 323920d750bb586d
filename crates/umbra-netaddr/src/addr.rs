//! The unified 16-byte peer address
//!
//! Every address family is packed into one IPv6-sized slot:
//!
//! ```text
//! IPv6   xx xx xx xx xx xx xx xx xx xx xx xx xx xx xx xx   raw bytes
//! IPv4   00 00 00 00 00 00 00 00 00 00 FF FF aa bb cc dd   RFC 4291 mapping
//! Tor    FD 87 D8 7E EB 43 xx xx xx xx xx xx xx xx xx xx   OnionCat marker + 80-bit id
//! I2P    FD 60 DB 4D DD B5 00 00 00 00 00 00 00 00 00 00   GarlicCat marker
//! ```
//!
//! Tor packs the whole 10-byte onion identifier after its marker. The
//! I2P marker is only a family tag: the real destination rides beside
//! the slot as an [`I2pDestination`].

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256};

use crate::error::{AddrError, AddrResult};
use crate::i2p::{self, I2pDestination};
use crate::network::Network;

/// RFC 4291 prefix of an IPv4-mapped IPv6 address.
pub const IPV4_IN_IPV6_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF];

/// OnionCat prefix marking a Tor hidden service in the slot.
pub const ONIONCAT_PREFIX: [u8; 6] = [0xFD, 0x87, 0xD8, 0x7E, 0xEB, 0x43];

/// GarlicCat prefix tagging a native I2P address in the slot.
pub const GARLICCAT_PREFIX: [u8; 6] = [0xFD, 0x60, 0xDB, 0x4D, 0xDD, 0xB5];

const ONION_SUFFIX: &str = ".onion";
const ONION_ID_LEN: usize = 10;

/// A peer address in any supported family.
///
/// Ordering and equality are bytewise over the slot, then over the
/// attached destination, so the type can key sorted maps directly.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetAddress {
    /// The 16-byte slot, network byte order.
    bytes: [u8; 16],
    /// Native destination, present only for fully-known I2P addresses.
    i2p_destination: Option<I2pDestination>,
}

impl NetAddress {
    /// The all-zero address (`::`), never valid.
    pub fn unspecified() -> Self {
        Self {
            bytes: [0u8; 16],
            i2p_destination: None,
        }
    }

    pub fn from_ipv4(addr: Ipv4Addr) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..12].copy_from_slice(&IPV4_IN_IPV6_PREFIX);
        bytes[12..].copy_from_slice(&addr.octets());
        Self {
            bytes,
            i2p_destination: None,
        }
    }

    /// Adopts the 16 bytes of an IPv6 address. Mapped IPv4 and overlay
    /// marker literals keep their special meaning.
    pub fn from_ipv6(addr: Ipv6Addr) -> Self {
        Self::from_bytes(addr.octets())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self {
            bytes,
            i2p_destination: None,
        }
    }

    /// Tags the slot as I2P without a known destination.
    pub fn i2p_marker() -> Self {
        let mut bytes = [0u8; 16];
        bytes[..6].copy_from_slice(&GARLICCAT_PREFIX);
        Self {
            bytes,
            i2p_destination: None,
        }
    }

    /// Builds a fully-known native I2P address.
    pub fn from_i2p_destination(dest: I2pDestination) -> Self {
        let mut addr = Self::i2p_marker();
        addr.i2p_destination = Some(dest);
        addr
    }

    /// Parses a `<base32>.onion` name into a Tor address.
    pub fn from_onion_name(name: &str) -> AddrResult<Self> {
        let stem = name
            .strip_suffix(ONION_SUFFIX)
            .ok_or_else(|| AddrError::Unparseable(name.to_string()))?;
        let id = BASE32_NOPAD
            .decode(stem.to_ascii_uppercase().as_bytes())
            .map_err(|e| AddrError::Base32(e.to_string()))?;
        if id.len() != ONION_ID_LEN {
            return Err(AddrError::OnionLength {
                expected: ONION_ID_LEN,
                actual: id.len(),
            });
        }
        let mut bytes = [0u8; 16];
        bytes[..6].copy_from_slice(&ONIONCAT_PREFIX);
        bytes[6..].copy_from_slice(&id);
        Ok(Self::from_bytes(bytes))
    }

    /// The 16-byte slot.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    pub fn i2p_destination(&self) -> Option<&I2pDestination> {
        self.i2p_destination.as_ref()
    }

    /// Byte `n` counted from the low end of the slot: `get_byte(0)` is
    /// the last byte, `get_byte(3)` the first IPv4 octet.
    pub fn get_byte(&self, n: usize) -> u8 {
        self.bytes[15 - n]
    }

    pub fn is_ipv4(&self) -> bool {
        self.bytes[..12] == IPV4_IN_IPV6_PREFIX
    }

    pub fn is_ipv6(&self) -> bool {
        !self.is_ipv4() && !self.is_tor() && !self.is_i2p()
    }

    pub fn is_tor(&self) -> bool {
        self.bytes[..6] == ONIONCAT_PREFIX
    }

    pub fn is_i2p(&self) -> bool {
        self.bytes[..6] == GARLICCAT_PREFIX
    }

    /// True when the full native destination is known, not just the
    /// family tag.
    pub fn is_native_i2p(&self) -> bool {
        self.i2p_destination.is_some()
    }

    /// RFC 1918 private networks (10/8, 172.16/12, 192.168/16).
    pub fn is_rfc1918(&self) -> bool {
        self.is_ipv4()
            && (self.get_byte(3) == 10
                || (self.get_byte(3) == 192 && self.get_byte(2) == 168)
                || (self.get_byte(3) == 172 && self.get_byte(2) >= 16 && self.get_byte(2) <= 31))
    }

    /// RFC 3927 IPv4 link-local (169.254/16).
    pub fn is_rfc3927(&self) -> bool {
        self.is_ipv4() && self.get_byte(3) == 169 && self.get_byte(2) == 254
    }

    /// RFC 3849 IPv6 documentation range (2001:db8::/32).
    pub fn is_rfc3849(&self) -> bool {
        self.get_byte(15) == 0x20
            && self.get_byte(14) == 0x01
            && self.get_byte(13) == 0x0D
            && self.get_byte(12) == 0xB8
    }

    /// RFC 3964 6to4 tunnelling (2002::/16).
    pub fn is_rfc3964(&self) -> bool {
        self.get_byte(15) == 0x20 && self.get_byte(14) == 0x02
    }

    /// RFC 4193 unique local range (fc00::/7). The Tor and I2P markers
    /// deliberately live inside this range.
    pub fn is_rfc4193(&self) -> bool {
        (self.get_byte(15) & 0xFE) == 0xFC
    }

    /// RFC 4380 Teredo tunnelling (2001::/32).
    pub fn is_rfc4380(&self) -> bool {
        self.get_byte(15) == 0x20
            && self.get_byte(14) == 0x01
            && self.get_byte(13) == 0
            && self.get_byte(12) == 0
    }

    /// RFC 4843 ORCHID range (2001:10::/28).
    pub fn is_rfc4843(&self) -> bool {
        self.get_byte(15) == 0x20
            && self.get_byte(14) == 0x01
            && self.get_byte(13) == 0x00
            && (self.get_byte(12) & 0xF0) == 0x10
    }

    /// RFC 4862 IPv6 link-local autoconfiguration (fe80::/64).
    pub fn is_rfc4862(&self) -> bool {
        const PREFIX: [u8; 8] = [0xFE, 0x80, 0, 0, 0, 0, 0, 0];
        self.bytes[..8] == PREFIX
    }

    /// RFC 6052 IPv4-embedded well-known prefix (64:ff9b::/96).
    pub fn is_rfc6052(&self) -> bool {
        const PREFIX: [u8; 12] = [0, 0x64, 0xFF, 0x9B, 0, 0, 0, 0, 0, 0, 0, 0];
        self.bytes[..12] == PREFIX
    }

    /// RFC 6145 IPv4-translated addresses (::ffff:0:0:0/96).
    pub fn is_rfc6145(&self) -> bool {
        const PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0, 0];
        self.bytes[..12] == PREFIX
    }

    /// Loopback, the IPv4 zero network, or `::1`.
    pub fn is_local(&self) -> bool {
        if self.is_ipv4() && (self.get_byte(3) == 127 || self.get_byte(3) == 0) {
            return true;
        }
        const LOOPBACK: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        self.bytes == LOOPBACK
    }

    pub fn is_multicast(&self) -> bool {
        (self.is_ipv4() && (self.get_byte(3) & 0xF0) == 0xE0) || self.get_byte(15) == 0xFF
    }

    /// A well-formed address that could name a real peer.
    pub fn is_valid(&self) -> bool {
        if self.is_i2p() {
            return self.is_native_i2p();
        }

        // addr-message payloads misaligned by three bytes leave the
        // mapping prefix shifted into a zeroed slot
        if self.bytes[..9] == IPV4_IN_IPV6_PREFIX[3..] {
            return false;
        }

        if self.bytes == [0u8; 16] {
            return false;
        }

        // documentation range never names a real peer
        if self.is_rfc3849() {
            return false;
        }

        if self.is_ipv4() {
            // INADDR_NONE
            if self.bytes[12..] == [0xFF, 0xFF, 0xFF, 0xFF] {
                return false;
            }
            // INADDR_ANY
            if self.bytes[12..] == [0, 0, 0, 0] {
                return false;
            }
        }

        true
    }

    /// Valid and plausibly reachable over the public internet or an
    /// overlay. Private RFC 1918 space is not excluded here.
    pub fn is_routable(&self) -> bool {
        self.is_valid()
            && !(self.is_rfc3927()
                || self.is_rfc4862()
                || (self.is_rfc4193() && !self.is_tor() && !self.is_i2p())
                || self.is_rfc4843()
                || self.is_local())
    }

    pub fn network(&self) -> Network {
        if !self.is_routable() {
            return Network::Unroutable;
        }
        if self.is_ipv4() {
            return Network::Ipv4;
        }
        if self.is_tor() {
            return Network::Tor;
        }
        if self.is_i2p() {
            return Network::I2p;
        }
        Network::Ipv6
    }

    pub fn to_ipv4(&self) -> Option<Ipv4Addr> {
        if !self.is_ipv4() {
            return None;
        }
        Some(Ipv4Addr::new(
            self.bytes[12],
            self.bytes[13],
            self.bytes[14],
            self.bytes[15],
        ))
    }

    /// The slot as an IPv6 address. Native I2P has no in-slot form and
    /// yields `None`.
    pub fn to_ipv6(&self) -> Option<Ipv6Addr> {
        if self.is_native_i2p() {
            return None;
        }
        Some(Ipv6Addr::from(self.bytes))
    }

    pub fn to_ip_addr(&self) -> Option<IpAddr> {
        if let Some(v4) = self.to_ipv4() {
            return Some(IpAddr::V4(v4));
        }
        self.to_ipv6().map(IpAddr::V6)
    }

    /// The `<base32>.onion` name of a Tor address.
    pub fn onion_name(&self) -> Option<String> {
        if !self.is_tor() {
            return None;
        }
        let mut name = BASE32_NOPAD.encode(&self.bytes[6..]).to_ascii_lowercase();
        name.push_str(ONION_SUFFIX);
        Some(name)
    }

    /// 64-bit identity hash: leading bytes of the double SHA-256 of
    /// the slot (of the destination text for native I2P), little
    /// endian.
    pub fn hash64(&self) -> u64 {
        let digest = match &self.i2p_destination {
            Some(dest) => Sha256::digest(Sha256::digest(dest.as_bytes())),
            None => Sha256::digest(Sha256::digest(self.bytes)),
        };
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(raw)
    }
}

impl Default for NetAddress {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl From<Ipv4Addr> for NetAddress {
    fn from(addr: Ipv4Addr) -> Self {
        Self::from_ipv4(addr)
    }
}

impl From<Ipv6Addr> for NetAddress {
    fn from(addr: Ipv6Addr) -> Self {
        Self::from_ipv6(addr)
    }
}

impl From<IpAddr> for NetAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => Self::from_ipv4(v4),
            IpAddr::V6(v6) => Self::from_ipv6(v6),
        }
    }
}

impl FromStr for NetAddress {
    type Err = AddrError;

    /// Parses numeric literals and self-describing overlay names. DNS
    /// and `.b32.i2p` names need the resolver, not the address model.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.ends_with(ONION_SUFFIX) {
            return Self::from_onion_name(s);
        }
        if i2p::is_destination_string(s) {
            return I2pDestination::from_base64(s).map(Self::from_i2p_destination);
        }
        if let Ok(v4) = s.parse::<Ipv4Addr>() {
            return Ok(Self::from_ipv4(v4));
        }
        if let Ok(v6) = s.parse::<Ipv6Addr>() {
            return Ok(Self::from_ipv6(v6));
        }
        Err(AddrError::Unparseable(s.to_string()))
    }
}

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_i2p() {
            return match &self.i2p_destination {
                Some(dest) => f.write_str(&dest.to_b32_address()),
                None => write!(f, "???{}", i2p::B32_SUFFIX),
            };
        }
        if let Some(name) = self.onion_name() {
            return f.write_str(&name);
        }
        if let Some(v4) = self.to_ipv4() {
            return fmt::Display::fmt(&v4, f);
        }
        fmt::Display::fmt(&Ipv6Addr::from(self.bytes), f)
    }
}

impl fmt::Debug for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetAddress({self})")
    }
}
