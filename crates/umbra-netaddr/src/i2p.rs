//! Native I2P destination handling
//!
//! A destination travels as base64 text in the I2P alphabet (`-` and
//! `~` in place of `+` and `/`). The printable form peers pass around
//! is the much shorter `*.b32.i2p` hash address derived from the
//! decoded destination.

use std::fmt;

use base64::alphabet::Alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::Engine as _;
use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256};

use crate::error::{AddrError, AddrResult};

/// Length of a native destination in base64 characters.
pub const I2P_DESTINATION_LEN: usize = 516;

/// Every well-formed destination ends with this null-certificate tail.
pub const I2P_DESTINATION_TERMINATOR: &str = "AAAA";

/// Suffix of the derived base-32 hash address.
pub const B32_SUFFIX: &str = ".b32.i2p";

const I2P_BASE64_ALPHABET: Alphabet = match Alphabet::new(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-~",
) {
    Ok(alphabet) => alphabet,
    Err(_) => panic!("I2P base64 alphabet is well formed"),
};

const I2P_BASE64: GeneralPurpose = GeneralPurpose::new(&I2P_BASE64_ALPHABET, PAD);

/// A native I2P destination in its base64 text form.
///
/// Construction validates length, terminator and encoding, so a value
/// of this type always decodes cleanly.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct I2pDestination([u8; I2P_DESTINATION_LEN]);

impl I2pDestination {
    /// Parses the base64 text form of a destination.
    pub fn from_base64(text: &str) -> AddrResult<Self> {
        if text.len() != I2P_DESTINATION_LEN {
            return Err(AddrError::DestinationLength {
                expected: I2P_DESTINATION_LEN,
                actual: text.len(),
            });
        }
        if !text.ends_with(I2P_DESTINATION_TERMINATOR) {
            return Err(AddrError::DestinationTerminator);
        }
        I2P_BASE64
            .decode(text)
            .map_err(|e| AddrError::Base64(e.to_string()))?;

        let mut buf = [0u8; I2P_DESTINATION_LEN];
        buf.copy_from_slice(text.as_bytes());
        Ok(Self(buf))
    }

    /// The destination text as raw bytes.
    pub fn as_bytes(&self) -> &[u8; I2P_DESTINATION_LEN] {
        &self.0
    }

    /// The destination text as a string slice.
    pub fn as_str(&self) -> &str {
        // construction guarantees ASCII base64 text
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Derives the `*.b32.i2p` hash address: lowercase base32 of the
    /// SHA-256 digest of the decoded destination.
    pub fn to_b32_address(&self) -> String {
        let raw = match I2P_BASE64.decode(&self.0[..]) {
            Ok(raw) => raw,
            // construction validated the encoding
            Err(_) => return format!("???{B32_SUFFIX}"),
        };
        let digest = Sha256::digest(&raw);
        let mut b32 = BASE32_NOPAD.encode(&digest).to_ascii_lowercase();
        b32.push_str(B32_SUFFIX);
        b32
    }
}

impl fmt::Debug for I2pDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("I2pDestination")
            .field(&self.to_b32_address())
            .finish()
    }
}

impl fmt::Display for I2pDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_b32_address())
    }
}

/// Returns true if `host` belongs to the I2P naming layer rather than
/// DNS: any `.i2p` name (including `*.b32.i2p` hash addresses) or a
/// raw base64 destination.
pub fn is_i2p_host(host: &str) -> bool {
    host.to_ascii_lowercase().ends_with(".i2p") || is_destination_string(host)
}

/// Returns true if `s` has the exact shape of a raw base64 destination.
pub fn is_destination_string(s: &str) -> bool {
    I2pDestination::from_base64(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_destination() -> String {
        // 516 'A's: decodes to 387 zero bytes, terminator included
        "A".repeat(I2P_DESTINATION_LEN)
    }

    #[test]
    fn test_parse_valid_destination() {
        let text = sample_destination();
        let dest = I2pDestination::from_base64(&text).unwrap();
        assert_eq!(dest.as_str(), text);
        assert_eq!(dest.as_bytes().len(), I2P_DESTINATION_LEN);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = I2pDestination::from_base64("AAAA").unwrap_err();
        assert!(matches!(err, AddrError::DestinationLength { actual: 4, .. }));
    }

    #[test]
    fn test_rejects_missing_terminator() {
        let mut text = sample_destination();
        text.replace_range(I2P_DESTINATION_LEN - 4.., "AAAB");
        let err = I2pDestination::from_base64(&text).unwrap_err();
        assert_eq!(err, AddrError::DestinationTerminator);
    }

    #[test]
    fn test_rejects_foreign_alphabet() {
        // '+' belongs to standard base64, not the I2P alphabet
        let mut text = sample_destination();
        text.replace_range(0..1, "+");
        let err = I2pDestination::from_base64(&text).unwrap_err();
        assert!(matches!(err, AddrError::Base64(_)));
    }

    #[test]
    fn test_b32_address_shape() {
        let dest = I2pDestination::from_base64(&sample_destination()).unwrap();
        let b32 = dest.to_b32_address();
        assert_eq!(b32.len(), 60);
        assert!(b32.ends_with(B32_SUFFIX));
        assert_eq!(b32, b32.to_ascii_lowercase());
    }

    #[test]
    fn test_i2p_host_detection() {
        assert!(is_i2p_host("stats.i2p"));
        assert!(is_i2p_host("UPPER.B32.I2P"));
        assert!(is_i2p_host(&sample_destination()));
        assert!(!is_i2p_host("example.com"));
        assert!(!is_i2p_host("i2p"));
        assert!(!is_i2p_host("203.0.113.7"));
    }
}
